//! How rows of each table reach the caller's entreprise.
//!
//! Every fragment binds exactly one value, the caller's account id, and
//! resolves the tenant through `accounts.entreprise_id`.

use serde_json::Value;

use crate::statement::{DerivedColumn, Record, ScopePredicate, ScopeSpec};

macro_rules! tenant_id {
    () => {
        "(SELECT entreprise_id FROM accounts WHERE \"ID\" = ?)"
    };
}

macro_rules! tenant_accounts {
    () => {
        concat!("SELECT \"ID\" FROM accounts WHERE entreprise_id = ", $crate::scope::ownership::tenant_id!())
    };
}

macro_rules! tenant_clients {
    () => {
        concat!("SELECT \"ID\" FROM \"Clients\" WHERE account_id IN (", $crate::scope::ownership::tenant_accounts!(), ")")
    };
}

macro_rules! tenant_events {
    () => {
        concat!("SELECT \"ID\" FROM evenement WHERE client_id IN (", $crate::scope::ownership::tenant_clients!(), ")")
    };
}

pub(crate) use {tenant_accounts, tenant_clients, tenant_id};

pub const TENANT_ID: &str = tenant_id!();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// `entreprise_id` column, set from the caller on insert.
    Entreprise,
    /// `account_id` column, set to the caller on insert.
    Account,
    Client,
    Event,
    Workshop,
    Category,
}

impl Ownership {
    pub fn column(&self) -> &'static str {
        match self {
            Ownership::Entreprise => "entreprise_id",
            Ownership::Account => "account_id",
            Ownership::Client => "client_id",
            Ownership::Event => "evenement_id",
            Ownership::Workshop => "atelier_id",
            Ownership::Category => "category_id",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Ownership::Entreprise => concat!("entreprise_id = ", tenant_id!()),
            Ownership::Account => concat!("account_id IN (", tenant_accounts!(), ")"),
            Ownership::Client => concat!("client_id IN (", tenant_clients!(), ")"),
            Ownership::Event => concat!("evenement_id IN (", tenant_events!(), ")"),
            Ownership::Workshop => concat!(
                "atelier_id IN (SELECT \"ID\" FROM atelier WHERE evenement_id IN (",
                tenant_events!(),
                "))"
            ),
            Ownership::Category => concat!(
                "category_id IN (SELECT \"ID\" FROM category WHERE entreprise_id = ",
                tenant_id!(),
                ")"
            ),
        }
    }

    pub fn predicate(&self, caller_id: i64) -> ScopePredicate {
        ScopePredicate::new(self.template(), vec![Value::from(caller_id)])
    }

    /// Column filled from the caller when a row is created.
    pub fn derived_on_insert(&self, caller_id: i64) -> Option<DerivedColumn> {
        match self {
            Ownership::Entreprise => Some(DerivedColumn::new(
                "entreprise_id",
                TENANT_ID,
                vec![Value::from(caller_id)],
            )),
            Ownership::Account => Some(DerivedColumn::value("account_id", caller_id)),
            _ => None,
        }
    }

    /// Rows owned through a parent may only be inserted under a parent the
    /// caller can see.
    pub fn insert_guard(&self, caller_id: i64) -> ScopeSpec {
        match self {
            Ownership::Entreprise | Ownership::Account => ScopeSpec::new(),
            _ => ScopeSpec::new().and(self.predicate(caller_id)),
        }
    }

    pub fn parent_label(&self) -> Option<&'static str> {
        match self {
            Ownership::Client => Some("Client"),
            Ownership::Event => Some("Event"),
            Ownership::Workshop => Some("Workshop"),
            Ownership::Category => Some("Category"),
            Ownership::Entreprise | Ownership::Account => None,
        }
    }
}

/// A foreign column the client may set directly. The row it names has to
/// live in the caller's entreprise, reached through `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub column: &'static str,
    pub table: &'static str,
    pub owner: Ownership,
    /// Used in the 404 when a guarded insert writes nothing.
    pub label: &'static str,
}

impl Reference {
    pub const fn new(column: &'static str, table: &'static str, owner: Ownership, label: &'static str) -> Self {
        Self {
            column,
            table,
            owner,
            label,
        }
    }

    fn tenant_rows(&self) -> String {
        format!("SELECT \"ID\" FROM {} WHERE {}", self.table, self.owner.template())
    }

    /// Condition on the inserted value inside `INSERT ... SELECT ... WHERE`.
    pub fn insert_guard(&self, caller_id: i64) -> ScopePredicate {
        ScopePredicate::new(
            format!("{} IN ({})", self.column, self.tenant_rows()),
            vec![Value::from(caller_id)],
        )
    }

    /// Condition on the new value of an UPDATE; the WHERE clause only sees
    /// the old row, so the value is bound again.
    pub fn update_guard(&self, caller_id: i64, value: &Value) -> ScopePredicate {
        ScopePredicate::new(
            format!("? IN ({})", self.tenant_rows()),
            vec![value.clone(), Value::from(caller_id)],
        )
    }
}

/// 404 message for a guarded insert that wrote nothing: the parent or any
/// reference present in `fields` may be the missing row.
pub fn missing_rows(parent: Option<&str>, references: &[Reference], fields: &Record, fallback: &str) -> String {
    let mut labels: Vec<&str> = parent.into_iter().collect();
    labels.extend(
        references
            .iter()
            .filter(|r| fields.contains(r.column))
            .map(|r| r.label),
    );
    if labels.is_empty() {
        labels.push(fallback);
    }
    format!("{} not found", labels.join(" or "))
}

pub fn staff_in_tenant(caller_id: i64) -> ScopePredicate {
    ScopePredicate::new(
        concat!("staff_id IN (SELECT \"ID\" FROM staff WHERE account_id IN (", tenant_accounts!(), "))"),
        vec![Value::from(caller_id)],
    )
}

pub fn transport_in_tenant(caller_id: i64) -> ScopePredicate {
    ScopePredicate::new(
        concat!("transport_id IN (SELECT \"ID\" FROM transport WHERE evenement_id IN (", tenant_events!(), "))"),
        vec![Value::from(caller_id)],
    )
}

pub fn equipment_in_tenant(caller_id: i64) -> ScopePredicate {
    ScopePredicate::new(
        concat!("equipement_id IN (SELECT \"ID\" FROM equipement WHERE entreprise_id = ", tenant_id!(), ")"),
        vec![Value::from(caller_id)],
    )
}

/// `team_id` from a team name, restricted to the caller's teams.
pub fn team_by_name(caller_id: i64, name: &str) -> DerivedColumn {
    DerivedColumn::new(
        "team_id",
        concat!(
            "(SELECT \"ID\" FROM team WHERE nom = ? AND account_id IN (",
            tenant_accounts!(),
            ") LIMIT 1)"
        ),
        vec![Value::from(name), Value::from(caller_id)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ownership; 6] = [
        Ownership::Entreprise,
        Ownership::Account,
        Ownership::Client,
        Ownership::Event,
        Ownership::Workshop,
        Ownership::Category,
    ];

    #[test]
    fn every_predicate_binds_only_the_caller() {
        for ownership in ALL {
            let predicate = ownership.predicate(12);
            assert_eq!(predicate.template.matches('?').count(), 1, "{:?}", ownership);
            assert_eq!(predicate.values, vec![Value::from(12)]);
            assert!(predicate.template.starts_with(ownership.column()));
        }
    }

    #[test]
    fn event_chain_reaches_entreprise() {
        let predicate = Ownership::Event.predicate(1);
        assert_eq!(
            predicate.template,
            "evenement_id IN (SELECT \"ID\" FROM evenement WHERE client_id IN (SELECT \"ID\" FROM \"Clients\" WHERE account_id IN (SELECT \"ID\" FROM accounts WHERE entreprise_id = (SELECT entreprise_id FROM accounts WHERE \"ID\" = ?))))"
        );
    }

    #[test]
    fn direct_owners_derive_instead_of_guarding() {
        assert!(Ownership::Entreprise.insert_guard(1).is_empty());
        assert!(Ownership::Account.insert_guard(1).is_empty());
        assert!(!Ownership::Event.insert_guard(1).is_empty());
        assert!(Ownership::Event.derived_on_insert(1).is_none());

        let derived = Ownership::Account.derived_on_insert(7).unwrap();
        assert_eq!(derived.column, "account_id");
        assert_eq!(derived.values, vec![Value::from(7)]);
    }

    const CATEGORY: Reference = Reference::new("category_id", "category", Ownership::Entreprise, "Category");

    #[test]
    fn reference_insert_guard_checks_the_inserted_column() {
        let predicate = CATEGORY.insert_guard(4);
        assert_eq!(
            predicate.template,
            "category_id IN (SELECT \"ID\" FROM category WHERE entreprise_id = (SELECT entreprise_id FROM accounts WHERE \"ID\" = ?))"
        );
        assert_eq!(predicate.values, vec![Value::from(4)]);
    }

    #[test]
    fn reference_update_guard_binds_new_value_then_caller() {
        let team = Reference::new("team_id", "team", Ownership::Account, "Team");
        let predicate = team.update_guard(4, &Value::from(31));
        assert!(predicate.template.starts_with("? IN (SELECT \"ID\" FROM team WHERE account_id IN ("));
        assert_eq!(predicate.template.matches('?').count(), 2);
        assert_eq!(predicate.values, vec![Value::from(31), Value::from(4)]);
    }

    #[test]
    fn team_lookup_binds_name_then_caller() {
        let derived = team_by_name(3, "Blue");
        assert_eq!(derived.values, vec![Value::from("Blue"), Value::from(3)]);
        assert_eq!(derived.template.matches('?').count(), 2);
    }
}
