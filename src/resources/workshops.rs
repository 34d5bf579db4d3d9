use super::{ListRoute, Ops, Resource, WriteAccess};
use crate::scope::{Ownership, Reference};
use crate::statement::{ColumnSpec, ColumnType, OrderBy, TableSpec};
use crate::validation::{Check, FieldKind, FieldRule, Schema, COUNT, ID, PHONE, PRICE, TEXT};

pub static WORKSHOP_TABLE: TableSpec = TableSpec {
    name: "atelier",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("categorie", ColumnType::Text),
        ColumnSpec::new("nbr_invite", ColumnType::Integer),
        ColumnSpec::new("nbr_max_invite", ColumnType::Integer),
        ColumnSpec::new("prix", ColumnType::Numeric),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
        ColumnSpec::new("instructeur_id", ColumnType::Integer),
        ColumnSpec::new("temp_debut", ColumnType::Timestamp),
        ColumnSpec::new("temp_fin", ColumnType::Timestamp),
    ],
};

pub const INSTRUCTOR_REFERENCE: Reference =
    Reference::new("instructeur_id", "instructeur", Ownership::Entreprise, "Instructor");

pub static WORKSHOP: Resource = Resource {
    label: "Workshop",
    entity: "Workshop",
    table: &WORKSHOP_TABLE,
    ownership: Ownership::Event,
    references: &[INSTRUCTOR_REFERENCE],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("categorie", TEXT),
            FieldRule::optional("nbr_invite", COUNT),
            FieldRule::required("nbr_max_invite", COUNT),
            FieldRule::required("prix", PRICE),
            FieldRule::required("evenement_id", ID),
            FieldRule::optional("instructeur_id", ID),
            FieldRule::optional("temp_debut", FieldKind::Timestamp),
            FieldRule::optional("temp_fin", FieldKind::Timestamp),
        ],
        checks: &[Check::Before {
            start: "temp_debut",
            end: "temp_fin",
        }],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("categorie", TEXT),
            FieldRule::optional("nbr_invite", COUNT),
            FieldRule::optional("nbr_max_invite", COUNT),
            FieldRule::optional("prix", PRICE),
            FieldRule::optional("instructeur_id", ID),
            FieldRule::optional("temp_debut", FieldKind::Timestamp),
            FieldRule::optional("temp_fin", FieldKind::Timestamp),
        ],
        checks: &[Check::Before {
            start: "temp_debut",
            end: "temp_fin",
        }],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllWorkshops", "Workshops fetched with success"),
        ListRoute {
            order: Some(OrderBy::asc("temp_debut")),
            ..ListRoute::by_parent("/getEventWorkshops/:ID", "evenement_id", "Event workshops fetched with success")
        },
    ],
    in_use: "Workshop still has questions attached and cannot be deleted",
};

pub static QA_TABLE: TableSpec = TableSpec {
    name: "Q&A",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("question", ColumnType::Text),
        ColumnSpec::new("answer", ColumnType::Text),
        ColumnSpec::new("atelier_id", ColumnType::Integer),
    ],
};

pub static QA: Resource = Resource {
    label: "Q&A",
    entity: "QA",
    table: &QA_TABLE,
    ownership: Ownership::Workshop,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("question", TEXT),
            FieldRule::required("answer", TEXT),
            FieldRule::required("atelier_id", ID),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("question", TEXT),
            FieldRule::optional("answer", TEXT),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[ListRoute::all("/getAllQAs", "Q&A fetched with success")],
    in_use: "Q&A entry is still referenced and cannot be deleted",
};

pub static INSTRUCTOR_TABLE: TableSpec = TableSpec {
    name: "instructeur",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("address", ColumnType::Text),
        ColumnSpec::new("age", ColumnType::Integer),
        ColumnSpec::new("num_tel", ColumnType::Integer),
        ColumnSpec::new("gender", ColumnType::Text),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

const GENDER: FieldKind = FieldKind::OneOf(&["male", "female", "other"]);

pub static INSTRUCTOR: Resource = Resource {
    label: "Instructor",
    entity: "Instructor",
    table: &INSTRUCTOR_TABLE,
    ownership: Ownership::Entreprise,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("address", TEXT),
            FieldRule::required("age", COUNT),
            FieldRule::required("num_tel", PHONE),
            FieldRule::required("gender", GENDER),
            FieldRule::required("description", TEXT),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("address", TEXT),
            FieldRule::optional("age", COUNT),
            FieldRule::optional("num_tel", PHONE),
            FieldRule::optional("gender", GENDER),
            FieldRule::optional("description", TEXT),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllInstructors", "Instructors fetched with success"),
        ListRoute {
            columns: &["ID", "nom"],
            order: Some(OrderBy::asc("nom")),
            ..ListRoute::all("/getInstructorsForWorkshop", "Instructors fetched with success")
        },
    ],
    in_use: "Instructor is assigned to a workshop and cannot be deleted",
};
