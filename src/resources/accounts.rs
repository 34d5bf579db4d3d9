use crate::scope::ROLE_NAMES;
use crate::statement::{ColumnSpec, ColumnType, TableSpec};
use crate::validation::{Check, FieldKind, FieldRule, Schema, ID, TEXT};

pub static ACCOUNTS_TABLE: TableSpec = TableSpec {
    name: "accounts",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("email", ColumnType::Text),
        ColumnSpec::hidden("password", ColumnType::Text),
        ColumnSpec::new("role", ColumnType::Text),
        ColumnSpec::new("type", ColumnType::Text),
        ColumnSpec::new("activation_date", ColumnType::Date),
        ColumnSpec::new("deactivation_date", ColumnType::Date),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

pub static ENTREPRISE_TABLE: TableSpec = TableSpec {
    name: "entreprise",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
    ],
};

pub const PERMANENT: &str = "permanent";
pub const TEMPORARY: &str = "temporaire";

const ROLE: FieldKind = FieldKind::OneOf(ROLE_NAMES);
const ACCOUNT_TYPE: FieldKind = FieldKind::OneOf(&[PERMANENT, TEMPORARY]);
const PASSWORD: FieldKind = FieldKind::Text { min: 8 };

const ACTIVATION_CHECKS: &[Check] = &[
    Check::RequiredWhen {
        field: "type",
        equals: TEMPORARY,
        required: &["activation_date", "deactivation_date"],
    },
    Check::Before {
        start: "activation_date",
        end: "deactivation_date",
    },
];

pub static LOGIN: Schema = Schema {
    fields: &[
        FieldRule::required("email", FieldKind::Email),
        FieldRule::required("password", TEXT),
    ],
    checks: &[],
};

pub static ACCOUNT_CREATE: Schema = Schema {
    fields: &[
        FieldRule::required("nom", TEXT),
        FieldRule::required("email", FieldKind::Email),
        FieldRule::required("password", PASSWORD),
        FieldRule::required("role", ROLE),
        FieldRule::required("type", ACCOUNT_TYPE),
        FieldRule::optional("activation_date", FieldKind::Date),
        FieldRule::optional("deactivation_date", FieldKind::Date),
    ],
    checks: ACTIVATION_CHECKS,
};

/// A new tenant: the entreprise name and its first super admin.
pub static SIGN_UP: Schema = Schema {
    fields: &[
        FieldRule::required("entreprise", TEXT),
        FieldRule::required("nom", TEXT),
        FieldRule::required("email", FieldKind::Email),
        FieldRule::required("password", PASSWORD),
    ],
    checks: &[],
};

pub static ENTREPRISE_UPDATE: Schema = Schema {
    fields: &[FieldRule::required("ID", ID), FieldRule::required("nom", TEXT)],
    checks: &[],
};

pub static ACCOUNT_UPDATE: Schema = Schema {
    fields: &[
        FieldRule::required("ID", ID),
        FieldRule::optional("nom", TEXT),
        FieldRule::optional("email", FieldKind::Email),
        FieldRule::optional("password", PASSWORD),
        FieldRule::optional("role", ROLE),
        FieldRule::optional("type", ACCOUNT_TYPE),
        FieldRule::optional("activation_date", FieldKind::Date),
        FieldRule::optional("deactivation_date", FieldKind::Date),
    ],
    checks: ACTIVATION_CHECKS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn temporary_accounts_need_a_window() {
        let body = json!({
            "nom": "Temp", "email": "temp@example.com", "password": "long-enough",
            "role": "user", "type": "temporaire"
        });
        let err = ACCOUNT_CREATE.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("activation_date"));
        assert!(err.field_errors.contains_key("deactivation_date"));
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let body = json!({
            "nom": "X", "email": "x@example.com", "password": "long-enough",
            "role": "root", "type": "permanent"
        });
        let err = ACCOUNT_CREATE.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("role"));
    }

    #[test]
    fn sign_up_needs_a_real_password() {
        let body = json!({"entreprise": "Acme", "nom": "Owner", "email": "owner@acme.test", "password": "short"});
        let err = SIGN_UP.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("password"));
    }

    #[test]
    fn password_is_never_listed() {
        assert!(!ACCOUNTS_TABLE.readable_columns().contains(&"password"));
        assert!(ACCOUNTS_TABLE.column("password").is_ok());
    }
}
