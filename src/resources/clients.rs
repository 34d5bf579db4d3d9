use super::{ListRoute, Ops, Resource, WriteAccess};
use crate::scope::Ownership;
use crate::statement::{ColumnSpec, ColumnType, OrderBy, TableSpec};
use crate::validation::{Check, FieldKind, FieldRule, Schema, COUNT, ID, PHONE, PRICE, TEXT};

pub static CLIENTS_TABLE: TableSpec = TableSpec {
    name: "Clients",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("domain", ColumnType::Text),
        ColumnSpec::new("num_tel", ColumnType::Integer),
        ColumnSpec::new("email", ColumnType::Text),
        ColumnSpec::new("account_id", ColumnType::Integer),
    ],
};

pub static CLIENT: Resource = Resource {
    label: "Client",
    entity: "Client",
    table: &CLIENTS_TABLE,
    ownership: Ownership::Account,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("domain", TEXT),
            FieldRule::required("num_tel", PHONE),
            FieldRule::required("email", FieldKind::Email),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("domain", TEXT),
            FieldRule::optional("num_tel", PHONE),
            FieldRule::optional("email", FieldKind::Email),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[ListRoute::all("/getAllClients", "Clients fetched with success")],
    in_use: "Client is linked to existing events and cannot be deleted",
};

pub static DEPARTMENT_TABLE: TableSpec = TableSpec {
    name: "department",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("department", ColumnType::Text),
        ColumnSpec::new("num_tel", ColumnType::Integer),
        ColumnSpec::new("email", ColumnType::Text),
        ColumnSpec::new("client_id", ColumnType::Integer),
    ],
};

pub static DEPARTMENT: Resource = Resource {
    label: "Department",
    entity: "Department",
    table: &DEPARTMENT_TABLE,
    ownership: Ownership::Client,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("department", TEXT),
            FieldRule::required("num_tel", PHONE),
            FieldRule::required("email", FieldKind::Email),
            FieldRule::required("client_id", ID),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("department", TEXT),
            FieldRule::optional("num_tel", PHONE),
            FieldRule::optional("email", FieldKind::Email),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllDepartments", "Departments fetched with success"),
        ListRoute::by_parent("/getClientDepartments/:ID", "client_id", "Client departments fetched with success"),
    ],
    in_use: "Department is still referenced and cannot be deleted",
};

pub static EVENT_TABLE: TableSpec = TableSpec {
    name: "evenement",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("type", ColumnType::Text),
        ColumnSpec::new("edition", ColumnType::Text),
        ColumnSpec::new("nbr_invite", ColumnType::Integer),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("date_debut", ColumnType::Date),
        ColumnSpec::new("date_fin", ColumnType::Date),
        ColumnSpec::new("address", ColumnType::Text),
        ColumnSpec::new("client_id", ColumnType::Integer),
    ],
};

pub static EVENT: Resource = Resource {
    label: "Event",
    entity: "Event",
    table: &EVENT_TABLE,
    ownership: Ownership::Client,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("type", TEXT),
            FieldRule::optional("edition", TEXT),
            FieldRule::required("nbr_invite", COUNT),
            FieldRule::optional("description", TEXT),
            FieldRule::required("date_debut", FieldKind::Date),
            FieldRule::required("date_fin", FieldKind::Date),
            FieldRule::required("address", TEXT),
            FieldRule::required("client_id", ID),
        ],
        checks: &[Check::Before {
            start: "date_debut",
            end: "date_fin",
        }],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("type", TEXT),
            FieldRule::optional("edition", TEXT),
            FieldRule::optional("nbr_invite", COUNT),
            FieldRule::optional("description", TEXT),
            FieldRule::optional("date_debut", FieldKind::Date),
            FieldRule::optional("date_fin", FieldKind::Date),
            FieldRule::optional("address", TEXT),
        ],
        checks: &[Check::Before {
            start: "date_debut",
            end: "date_fin",
        }],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllEvents", "Events fetched with success"),
        ListRoute {
            filter: Some("date_debut >= CURRENT_DATE"),
            order: Some(OrderBy::asc("date_debut")),
            ..ListRoute::all("/getUpcomingEvents", "Upcoming events fetched with success")
        },
        ListRoute {
            filter: Some("date_fin < CURRENT_DATE"),
            order: Some(OrderBy::desc("date_debut")),
            ..ListRoute::all("/getEventsHistory", "Past events fetched with success")
        },
    ],
    in_use: "Event still has workshops, transports or reservations and cannot be deleted",
};

pub static EVENT_TYPE_TABLE: TableSpec = TableSpec {
    name: "evenement_type",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("account_id", ColumnType::Integer),
    ],
};

pub static EVENT_TYPE: Resource = Resource {
    label: "Event type",
    entity: "EventType",
    table: &EVENT_TYPE_TABLE,
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
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[ListRoute {
        order: Some(OrderBy::asc("nom")),
        ..ListRoute::all("/getEventTypes", "Event types fetched with success")
    }],
    in_use: "Event type is still in use and cannot be deleted",
};

pub static PAUSE_TABLE: TableSpec = TableSpec {
    name: "pause",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("name", ColumnType::Text),
        ColumnSpec::new("start_time", ColumnType::Time),
        ColumnSpec::new("end_time", ColumnType::Time),
        ColumnSpec::new("price_per_person", ColumnType::Numeric),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
    ],
};

pub static PAUSE: Resource = Resource {
    label: "Break",
    entity: "Pause",
    table: &PAUSE_TABLE,
    ownership: Ownership::Event,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("name", TEXT),
            FieldRule::required("start_time", FieldKind::Time),
            FieldRule::required("end_time", FieldKind::Time),
            FieldRule::required("price_per_person", PRICE),
            FieldRule::optional("description", TEXT),
            FieldRule::required("evenement_id", ID),
        ],
        checks: &[Check::Before {
            start: "start_time",
            end: "end_time",
        }],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("name", TEXT),
            FieldRule::optional("start_time", FieldKind::Time),
            FieldRule::optional("end_time", FieldKind::Time),
            FieldRule::optional("price_per_person", PRICE),
            FieldRule::optional("description", TEXT),
        ],
        checks: &[Check::Before {
            start: "start_time",
            end: "end_time",
        }],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllPauses", "Breaks fetched with success"),
        ListRoute {
            order: Some(OrderBy::asc("start_time")),
            ..ListRoute::by_parent("/getEventPauses/:ID", "evenement_id", "Event breaks fetched with success")
        },
    ],
    in_use: "Break is still referenced and cannot be deleted",
};
