// handlers/entreprise.rs - tenant bootstrap and the entreprise row
//
// POST   /api/signUp             (public)
// POST   /api/addEntreprise
// PUT    /api/updateEntreprise
// DELETE /api/deleteEntreprise
// GET    /api/getAllEntreprises
//
// An entreprise is only ever visible to its own accounts, and only its
// super admin may rename or delete it.

use axum::{extract::State, Extension};
use serde_json::{Map, Value};

use super::accounts::duplicate_email;
use super::{finish, still_referenced, take_id};
use crate::app::AppState;
use crate::auth::password::hash_password;
use crate::config;
use crate::database::{QueryOutcome, Transaction};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::accounts::{ACCOUNTS_TABLE, ENTREPRISE_TABLE, ENTREPRISE_UPDATE, PERMANENT, SIGN_UP};
use crate::resources::DELETE_BY_ID;
use crate::scope::ownership::tenant_id;
use crate::scope::{Identity, ScopingGuard};
use crate::statement::{FieldFilter, OrderBy, Record, ScopePredicate, ScopeSpec, StatementBuilder};

const ENTREPRISE: &str = "Entreprise";
const IN_USE: &str = "Entreprise still owns accounts, equipment or categories and cannot be deleted";

fn own_entreprise(caller_id: i64) -> ScopePredicate {
    ScopePredicate::new(concat!("\"ID\" = ", tenant_id!()), vec![Value::from(caller_id)])
}

/// Insert an entreprise and its first account; returns both ids. The account
/// record must already carry a hashed password.
pub(crate) async fn create_tenant(
    tx: &mut dyn Transaction,
    entreprise: &str,
    mut account: Record,
) -> Result<(i64, i64), ApiError> {
    let statement = StatementBuilder::new(&ENTREPRISE_TABLE)
        .insert(&Record::new().with("nom", entreprise), &[], &ScopeSpec::new())?
        .returning("\"ID\"");
    let entreprise_id = returned_id(tx.execute(&statement).await?)?;

    account.insert("entreprise_id", Value::from(entreprise_id));
    let statement = StatementBuilder::new(&ACCOUNTS_TABLE)
        .insert(&FieldFilter::apply(&account)?, &[], &ScopeSpec::new())?
        .returning("\"ID\"");
    let outcome = tx.execute(&statement).await.map_err(duplicate_email)?;
    let account_id = returned_id(outcome)?;

    tracing::info!(entreprise = entreprise_id, account = account_id, "tenant created");
    Ok((entreprise_id, account_id))
}

fn returned_id(outcome: QueryOutcome) -> Result<i64, ApiError> {
    outcome
        .first()
        .and_then(|row| row.get("ID"))
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::internal_server_error("Insert returned no id"))
}

/// Validate a sign-up body into the entreprise name and its owner account.
async fn tenant_owner(body: &Value) -> Result<(String, Record), ApiError> {
    let mut record = SIGN_UP.validate(body)?;
    let entreprise = record
        .remove("entreprise")
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    let password = record.get("password").and_then(Value::as_str).unwrap_or_default().to_string();
    let hashed = hash_password(&password, config::config().security.bcrypt_cost).await?;
    record.insert("password", Value::from(hashed));
    record.insert("role", Value::from("super_admin"));
    record.insert("type", Value::from(PERMANENT));
    Ok((entreprise, record))
}

async fn bootstrap(state: &AppState, body: &Value) -> ApiResult {
    let (entreprise, account) = tenant_owner(body).await?;

    let mut tx = state.db.begin().await?;
    let result = create_tenant(tx.as_mut(), &entreprise, account).await;
    let (entreprise_id, account_id) = finish(tx, result).await?;

    let mut row = Map::new();
    row.insert("entreprise_id".to_string(), Value::from(entreprise_id));
    row.insert("account_id".to_string(), Value::from(account_id));
    Ok(ApiResponse::from_write(QueryOutcome::with_rows(vec![row]), ENTREPRISE, WriteKind::Added))
}

pub async fn sign_up(State(state): State<AppState>, Payload(body): Payload) -> ApiResult {
    bootstrap(&state, &body).await
}

/// A super admin opening another tenant. The new entreprise gets its own
/// owner and shares nothing with the caller's.
pub async fn add_entreprise(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    ScopingGuard::new(&identity).require_super_admin()?;
    bootstrap(&state, &body).await
}

pub async fn update_entreprise(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = ENTREPRISE_UPDATE.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);
    guard.require_super_admin()?;

    let scope = ScopeSpec::new()
        .and(ENTREPRISE_TABLE.key_equals(id))
        .and(own_entreprise(guard.caller_id()));
    let statement = StatementBuilder::new(&ENTREPRISE_TABLE).update(&FieldFilter::apply(&record)?, &[], &scope)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, ENTREPRISE, WriteKind::Updated))
}

pub async fn delete_entreprise(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = DELETE_BY_ID.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);
    guard.require_super_admin()?;

    let scope = ScopeSpec::new()
        .and(ENTREPRISE_TABLE.key_equals(id))
        .and(own_entreprise(guard.caller_id()));
    let statement = StatementBuilder::new(&ENTREPRISE_TABLE).delete(&scope)?;

    let outcome = state.db.execute(&statement).await.map_err(still_referenced(IN_USE))?;
    tracing::info!(caller = guard.caller_id(), entreprise = id, "entreprise deleted");
    Ok(ApiResponse::from_write(outcome, ENTREPRISE, WriteKind::Deleted))
}

pub async fn get_all_entreprises(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let scope = ScopeSpec::new().and(own_entreprise(identity.id));
    let statement = StatementBuilder::new(&ENTREPRISE_TABLE).select_readable(&scope, Some(OrderBy::asc("nom")))?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Entreprises fetched with success"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Database, DatabaseError};
    use crate::testing::{identity, FakeDatabase, Recorded};
    use serde_json::json;

    fn sign_up_body() -> Value {
        json!({"entreprise": "Acme", "nom": "Owner", "email": "owner@acme.test", "password": "long-enough"})
    }

    #[tokio::test]
    async fn entreprise_then_account_in_one_transaction() {
        let db = FakeDatabase::new();
        db.push_rows(vec![json!({"ID": 4})]);
        db.push_rows(vec![json!({"ID": 11})]);

        let account = Record::new()
            .with("nom", "Owner")
            .with("email", "owner@acme.test")
            .with("password", "$2b$hash")
            .with("role", "super_admin")
            .with("type", PERMANENT);

        let mut tx = db.begin().await.unwrap();
        let ids = create_tenant(tx.as_mut(), "Acme", account).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(ids, (4, 11));

        let statements = db.statements();
        assert_eq!(statements[0].sql, "INSERT INTO entreprise (nom) VALUES ($1) RETURNING \"ID\"");
        assert!(statements[1].sql.starts_with("INSERT INTO accounts (nom, email, password, role, type, entreprise_id)"));
        assert_eq!(statements[1].params.last(), Some(&json!(4)));
        assert_eq!(db.events().last(), Some(&Recorded::Commit));
    }

    #[tokio::test]
    async fn sign_up_creates_a_super_admin_owner() {
        let db = FakeDatabase::new();
        db.push_rows(vec![json!({"ID": 4})]);
        db.push_rows(vec![json!({"ID": 11})]);

        let response = sign_up(State(db.state()), Payload(sign_up_body())).await.unwrap();
        assert_eq!(response.message, "Entreprise added with success");
        assert_eq!(response.data, Some(json!([{"entreprise_id": 4, "account_id": 11}])));

        let account = &db.statements()[1];
        assert!(account.params.contains(&json!("super_admin")));
        assert!(account.params.contains(&json!(PERMANENT)));
        assert!(!account.params.contains(&json!("long-enough")));
        assert_eq!(db.events().last(), Some(&Recorded::Commit));
    }

    #[tokio::test]
    async fn taken_email_rolls_the_entreprise_back() {
        let db = FakeDatabase::new();
        db.push_rows(vec![json!({"ID": 4})]);
        db.push_error(DatabaseError::UniqueViolation {
            constraint: "accounts_email_key".into(),
        });

        let err = sign_up(State(db.state()), Payload(sign_up_body())).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(db.events().last(), Some(&Recorded::Rollback));
    }

    #[tokio::test]
    async fn only_super_admin_adds_entreprises() {
        let db = FakeDatabase::new();

        let err = add_entreprise(State(db.state()), Extension(identity(2, "admin")), Payload(sign_up_body()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(db.events().is_empty());
    }

    #[tokio::test]
    async fn update_is_limited_to_the_callers_entreprise() {
        let db = FakeDatabase::new();
        db.push_affected(1);

        let response = update_entreprise(
            State(db.state()),
            Extension(identity(1, "super_admin")),
            Payload(json!({"ID": 4, "nom": "Acme Events"})),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Entreprise updated with success");

        let statement = &db.statements()[0];
        assert!(statement
            .sql
            .starts_with("UPDATE entreprise SET nom=$1 WHERE \"ID\"=$2 AND \"ID\" = (SELECT entreprise_id FROM accounts"));
        assert_eq!(statement.params, vec![json!("Acme Events"), json!(4), json!(1)]);
    }

    #[tokio::test]
    async fn delete_of_a_populated_entreprise_is_refused() {
        let db = FakeDatabase::new();
        db.push_error(DatabaseError::ForeignKeyViolation {
            constraint: "accounts_entreprise_id_fkey".into(),
        });

        let err = delete_entreprise(
            State(db.state()),
            Extension(identity(1, "super_admin")),
            Payload(json!({"ID": 4})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), IN_USE);
    }

    #[tokio::test]
    async fn listing_returns_only_the_own_entreprise() {
        let db = FakeDatabase::new();
        db.push_rows(vec![json!({"ID": 4, "nom": "Acme"})]);

        get_all_entreprises(State(db.state()), Extension(identity(2, "user")))
            .await
            .unwrap();

        let statement = &db.statements()[0];
        assert!(statement.sql.contains("WHERE \"ID\" = (SELECT entreprise_id FROM accounts"));
        assert_eq!(statement.params, vec![json!(2)]);
    }
}
