use super::{ListRoute, Ops, Resource, WriteAccess};
use crate::scope::{Ownership, Reference};
use crate::statement::{ColumnSpec, ColumnType, OrderBy, TableSpec};
use crate::validation::{FieldKind, FieldRule, Schema, ID, PHONE, TEXT};

pub static STAFF_TABLE: TableSpec = TableSpec {
    name: "staff",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("prenom", ColumnType::Text),
        ColumnSpec::new("num_tel", ColumnType::Integer),
        ColumnSpec::new("email", ColumnType::Text),
        ColumnSpec::new("departement", ColumnType::Text),
        ColumnSpec::new("role", ColumnType::Text),
        ColumnSpec::new("team_id", ColumnType::Integer),
        ColumnSpec::new("account_id", ColumnType::Integer),
    ],
};

/// `team` is a team name, resolved to `team_id` by the staff update handler.
pub static STAFF_UPDATE: Schema = Schema {
    fields: &[
        FieldRule::required("ID", ID),
        FieldRule::optional("nom", TEXT),
        FieldRule::optional("prenom", TEXT),
        FieldRule::optional("num_tel", PHONE),
        FieldRule::optional("email", FieldKind::Email),
        FieldRule::optional("departement", TEXT),
        FieldRule::optional("role", TEXT),
        FieldRule::optional("team_id", ID),
        FieldRule::optional("team", TEXT),
    ],
    checks: &[],
};

pub const TEAM_REFERENCE: Reference = Reference::new("team_id", "team", Ownership::Account, "Team");

pub static STAFF: Resource = Resource {
    label: "Staff member",
    entity: "Staff",
    table: &STAFF_TABLE,
    ownership: Ownership::Account,
    references: &[TEAM_REFERENCE],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::optional("prenom", TEXT),
            FieldRule::optional("num_tel", PHONE),
            FieldRule::optional("email", FieldKind::Email),
            FieldRule::optional("departement", TEXT),
            FieldRule::required("role", TEXT),
            FieldRule::optional("team_id", ID),
        ],
        checks: &[],
    },
    update: &STAFF_UPDATE,
    access: WriteAccess::Manager,
    ops: Ops {
        add: true,
        update: false,
        delete: true,
    },
    // `/getAllStaff` joins team names; see `handlers::staff`.
    lists: &[
        ListRoute {
            filter: Some("team_id IS NOT NULL"),
            order: Some(OrderBy::asc("team_id")),
            ..ListRoute::all("/getAllStaffForTeams", "Team staff fetched with success")
        },
    ],
    in_use: "Staff member is assigned to a transport and cannot be deleted",
};

pub static TEAM_TABLE: TableSpec = TableSpec {
    name: "team",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("account_id", ColumnType::Integer),
    ],
};

pub static TEAM: Resource = Resource {
    label: "Team",
    entity: "Team",
    table: &TEAM_TABLE,
    ownership: Ownership::Account,
    references: &[],
    create: &Schema {
        fields: &[FieldRule::required("nom", TEXT)],
        checks: &[],
    },
    update: &Schema {
        fields: &[FieldRule::required("ID", ID), FieldRule::optional("nom", TEXT)],
        checks: &[],
    },
    access: WriteAccess::Manager,
    ops: Ops::ALL,
    lists: &[ListRoute::all("/getAllTeams", "Teams fetched with success")],
    in_use: "Team still has staff members and cannot be deleted",
};
