// handlers/staff.rs - staff listing and update
//
// GET /api/getAllStaff
// PUT /api/updateStaff
//
// Staff updates accept a team by name as well as by id.

use axum::{extract::State, Extension};
use serde_json::Value;

use super::take_id;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::staff::{STAFF, STAFF_UPDATE};
use crate::scope::ownership::{team_by_name, tenant_accounts};
use crate::scope::{Identity, ScopingGuard};
use crate::statement::{query, FieldFilter, StatementBuilder};

/// The team join only matches teams of the staff member's own entreprise.
const STAFF_WITH_TEAMS: &str = concat!(
    "SELECT s.\"ID\", s.nom, s.prenom, s.email, s.departement, s.num_tel, s.role, s.team_id, t.nom AS team_nom ",
    "FROM staff s ",
    "LEFT JOIN team t ON t.\"ID\" = s.team_id AND t.account_id IN (",
    "SELECT \"ID\" FROM accounts WHERE entreprise_id = ",
    "(SELECT entreprise_id FROM accounts WHERE \"ID\" = s.account_id)) ",
    "WHERE s.account_id IN (",
    tenant_accounts!(),
    ") ORDER BY s.nom"
);

pub async fn get_all_staff(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> ApiResult {
    let statement = query(STAFF_WITH_TEAMS, vec![Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Staff fetched with success"))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = STAFF_UPDATE.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);
    STAFF.authorize_write(&guard)?;

    // A team name wins over a team id; an unknown name clears the assignment.
    let team = record.remove("team").filter(FieldFilter::is_provided);
    let mut fields = FieldFilter::present(&record);
    let derived: Vec<_> = team
        .as_ref()
        .and_then(Value::as_str)
        .map(|name| team_by_name(guard.caller_id(), name))
        .into_iter()
        .collect();
    if !derived.is_empty() {
        fields.remove("team_id");
    }

    let scope = guard.update_scope(STAFF.table.key_equals(id), STAFF.ownership, STAFF.references, &fields);
    let statement = StatementBuilder::new(STAFF.table).update(&fields, &derived, &scope)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, STAFF.label, WriteKind::Updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{identity, FakeDatabase};
    use serde_json::json;

    async fn run(db: &FakeDatabase, role: &str, body: Value) -> ApiResult {
        update_staff(State(db.state()), Extension(identity(4, role)), Payload(body)).await
    }

    #[tokio::test]
    async fn team_name_resolves_inside_the_tenant() {
        let db = FakeDatabase::new();
        db.push_affected(1);

        let response = run(&db, "admin", json!({"ID": 2, "role": "driver", "team": "Blue", "team_id": 9}))
            .await
            .unwrap();
        assert_eq!(response.message, "Staff member updated with success");

        let statement = &db.statements()[0];
        assert!(statement.sql.starts_with("UPDATE staff SET role=$1, team_id=(SELECT \"ID\" FROM team WHERE nom = $2"));
        assert!(!statement.sql.contains("team_id=$"));
        assert_eq!(statement.params[..4], [json!("driver"), json!("Blue"), json!(4), json!(2)]);
    }

    #[tokio::test]
    async fn team_id_must_be_a_tenant_team() {
        let db = FakeDatabase::new();
        db.push_affected(0);

        let response = run(&db, "admin", json!({"ID": 2, "team_id": 90})).await.unwrap();
        assert_eq!(response.message, "No staff member matched; nothing was updated");

        let statement = &db.statements()[0];
        assert!(statement.sql.starts_with("UPDATE staff SET team_id=$1 WHERE \"ID\"=$2 AND account_id IN ("));
        assert!(statement.sql.contains(" AND $4 IN (SELECT \"ID\" FROM team WHERE account_id IN ("));
        assert_eq!(statement.params, vec![json!(90), json!(2), json!(4), json!(90), json!(4)]);
    }

    #[tokio::test]
    async fn listing_names_the_team() {
        let db = FakeDatabase::new();
        db.push_rows(vec![json!({"ID": 1, "nom": "Ali", "team_nom": "Blue"})]);

        let response = get_all_staff(State(db.state()), Extension(identity(4, "user"))).await.unwrap();
        assert_eq!(response.data, Some(json!([{"ID": 1, "nom": "Ali", "team_nom": "Blue"}])));

        let statement = &db.statements()[0];
        assert!(statement.sql.contains("t.nom AS team_nom"));
        assert!(statement.sql.contains("LEFT JOIN team t ON t.\"ID\" = s.team_id AND t.account_id IN ("));
        assert_eq!(statement.params, vec![json!(4)]);
    }

    #[tokio::test]
    async fn plain_users_cannot_edit_staff() {
        let db = FakeDatabase::new();
        let err = run(&db, "user", json!({"ID": 2, "nom": "X"})).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(db.events().is_empty());
    }
}
