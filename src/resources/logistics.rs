use super::{ListRoute, Ops, Resource, WriteAccess};
use crate::scope::{Ownership, Reference};
use crate::statement::{ColumnSpec, ColumnType, OrderBy, TableSpec};
use crate::validation::{Check, FieldKind, FieldRule, Schema, ID, PHONE, PRICE, TEXT};

pub static TRANSPORT_TABLE: TableSpec = TableSpec {
    name: "transport",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("adress_depart", ColumnType::Text),
        ColumnSpec::new("adress_arrive", ColumnType::Text),
        ColumnSpec::new("temps_depart", ColumnType::Timestamp),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("prix", ColumnType::Numeric),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
        ColumnSpec::new("car_id", ColumnType::Integer),
        ColumnSpec::new("agence_id", ColumnType::Integer),
    ],
};

/// `staff_id` is not a transport column; the add handler links it through
/// `transport_staff`.
pub static TRANSPORT_CREATE: Schema = Schema {
    fields: &[
        FieldRule::required("adress_depart", TEXT),
        FieldRule::required("adress_arrive", TEXT),
        FieldRule::required("temps_depart", FieldKind::Timestamp),
        FieldRule::required("description", TEXT),
        FieldRule::required("prix", PRICE),
        FieldRule::required("evenement_id", ID),
        FieldRule::optional("car_id", ID),
        FieldRule::optional("agence_id", ID),
        FieldRule::optional("staff_id", ID),
    ],
    checks: &[],
};

pub const CAR_REFERENCE: Reference = Reference::new("car_id", "car", Ownership::Entreprise, "Car");
pub const AGENCY_REFERENCE: Reference = Reference::new("agence_id", "agence", Ownership::Entreprise, "Prestataire");

pub static TRANSPORT: Resource = Resource {
    label: "Transport",
    entity: "Transport",
    table: &TRANSPORT_TABLE,
    ownership: Ownership::Event,
    references: &[CAR_REFERENCE, AGENCY_REFERENCE],
    create: &TRANSPORT_CREATE,
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("adress_depart", TEXT),
            FieldRule::optional("adress_arrive", TEXT),
            FieldRule::optional("temps_depart", FieldKind::Timestamp),
            FieldRule::optional("description", TEXT),
            FieldRule::optional("prix", PRICE),
            FieldRule::optional("car_id", ID),
            FieldRule::optional("agence_id", ID),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops {
        add: false,
        update: true,
        delete: false,
    },
    lists: &[
        ListRoute::all("/getAllTransports", "Transports fetched with success"),
        ListRoute {
            order: Some(OrderBy::asc("temps_depart")),
            ..ListRoute::by_parent("/getEventTransports/:ID", "evenement_id", "Event transports fetched with success")
        },
    ],
    in_use: "Transport still has staff assigned and cannot be deleted",
};

pub static TRANSPORT_STAFF_TABLE: TableSpec = TableSpec {
    name: "transport_staff",
    key: "transport_id",
    columns: &[
        ColumnSpec::new("transport_id", ColumnType::Integer),
        ColumnSpec::new("staff_id", ColumnType::Integer),
    ],
};

pub static TRANSPORT_STAFF_LINK: Schema = Schema {
    fields: &[
        FieldRule::required("transport_id", ID),
        FieldRule::required("staff_id", ID),
    ],
    checks: &[],
};

pub static TRANSPORT_CAR_LINK: Schema = Schema {
    fields: &[
        FieldRule::required("transport_id", ID),
        FieldRule::required("car_id", ID),
    ],
    checks: &[],
};

pub static TRANSPORT_CAR_UNLINK: Schema = Schema {
    fields: &[FieldRule::required("transport_id", ID)],
    checks: &[],
};

pub static CAR_TABLE: TableSpec = TableSpec {
    name: "car",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("nbr_place", ColumnType::Integer),
        ColumnSpec::new("matricule", ColumnType::Text),
        ColumnSpec::new("categorie", ColumnType::Text),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

const SEATS: FieldKind = FieldKind::Integer { min: Some(1) };

pub static CAR: Resource = Resource {
    label: "Car",
    entity: "Car",
    table: &CAR_TABLE,
    ownership: Ownership::Entreprise,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("nbr_place", SEATS),
            FieldRule::required("matricule", TEXT),
            FieldRule::required("categorie", TEXT),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("nbr_place", SEATS),
            FieldRule::optional("matricule", TEXT),
            FieldRule::optional("categorie", TEXT),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllCars", "Cars fetched with success"),
        ListRoute::by_parent("/getCarById/:ID", "ID", "Car fetched with success"),
    ],
    in_use: "Car is used by a transport and cannot be deleted",
};

pub static ACCOMMODATION_TABLE: TableSpec = TableSpec {
    name: "accomodation",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("address", ColumnType::Text),
        ColumnSpec::new("type", ColumnType::Text),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("prix", ColumnType::Numeric),
        ColumnSpec::new("date_debut", ColumnType::Date),
        ColumnSpec::new("date_fin", ColumnType::Date),
        ColumnSpec::new("number", ColumnType::Integer),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
    ],
};

const ROOM_TYPE: FieldKind = FieldKind::OneOf(&["single", "double", "suite"]);
const ROOMS: FieldKind = FieldKind::Integer { min: Some(1) };

pub static ACCOMMODATION: Resource = Resource {
    label: "Accommodation",
    entity: "Accomodation",
    table: &ACCOMMODATION_TABLE,
    ownership: Ownership::Event,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("address", TEXT),
            FieldRule::required("type", ROOM_TYPE),
            FieldRule::optional("description", TEXT),
            FieldRule::required("prix", PRICE),
            FieldRule::required("date_debut", FieldKind::Date),
            FieldRule::required("date_fin", FieldKind::Date),
            FieldRule::required("number", ROOMS),
            FieldRule::required("evenement_id", ID),
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
            FieldRule::optional("address", TEXT),
            FieldRule::optional("type", ROOM_TYPE),
            FieldRule::optional("description", TEXT),
            FieldRule::optional("prix", PRICE),
            FieldRule::optional("date_debut", FieldKind::Date),
            FieldRule::optional("date_fin", FieldKind::Date),
            FieldRule::optional("number", ROOMS),
        ],
        checks: &[Check::Before {
            start: "date_debut",
            end: "date_fin",
        }],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllAccomodations", "Accommodations fetched with success"),
        ListRoute {
            order: Some(OrderBy::asc("date_debut")),
            ..ListRoute::by_parent(
                "/getEventAccomodations/:ID",
                "evenement_id",
                "Event accommodations fetched with success",
            )
        },
    ],
    in_use: "Accommodation is still referenced and cannot be deleted",
};

pub static SOIREE_TABLE: TableSpec = TableSpec {
    name: "soire",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("address", ColumnType::Text),
        ColumnSpec::new("date", ColumnType::Date),
        ColumnSpec::new("description", ColumnType::Text),
        ColumnSpec::new("prix", ColumnType::Numeric),
        ColumnSpec::new("max_guests", ColumnType::Integer),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
    ],
};

const GUESTS: FieldKind = FieldKind::Integer { min: Some(1) };

pub static SOIREE: Resource = Resource {
    label: "Soirée",
    entity: "Soiree",
    table: &SOIREE_TABLE,
    ownership: Ownership::Event,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("address", TEXT),
            FieldRule::required("date", FieldKind::Date),
            FieldRule::required("description", TEXT),
            FieldRule::required("prix", PRICE),
            FieldRule::optional("max_guests", GUESTS),
            FieldRule::required("evenement_id", ID),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("address", TEXT),
            FieldRule::optional("date", FieldKind::Date),
            FieldRule::optional("description", TEXT),
            FieldRule::optional("prix", PRICE),
            FieldRule::optional("max_guests", GUESTS),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[
        ListRoute::all("/getAllSoirees", "Soirées fetched with success"),
        ListRoute {
            order: Some(OrderBy::asc("date")),
            ..ListRoute::by_parent("/getEventSoirees/:ID", "evenement_id", "Event soirées fetched with success")
        },
    ],
    in_use: "Soirée is still referenced and cannot be deleted",
};

pub static PRESTATAIRE_TABLE: TableSpec = TableSpec {
    name: "agence",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("address", ColumnType::Text),
        ColumnSpec::new("num_tel", ColumnType::Integer),
        ColumnSpec::new("type", ColumnType::Text),
        ColumnSpec::new("email", ColumnType::Text),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

pub static PRESTATAIRE: Resource = Resource {
    label: "Prestataire",
    entity: "Prestataire",
    table: &PRESTATAIRE_TABLE,
    ownership: Ownership::Entreprise,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::optional("address", TEXT),
            FieldRule::required("num_tel", PHONE),
            FieldRule::optional("type", TEXT),
            FieldRule::optional("email", FieldKind::Email),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[
            FieldRule::required("ID", ID),
            FieldRule::optional("nom", TEXT),
            FieldRule::optional("address", TEXT),
            FieldRule::optional("num_tel", PHONE),
            FieldRule::optional("type", TEXT),
            FieldRule::optional("email", FieldKind::Email),
        ],
        checks: &[],
    },
    access: WriteAccess::AnyMember,
    ops: Ops::ALL,
    lists: &[ListRoute {
        order: Some(OrderBy::asc("nom")),
        ..ListRoute::all("/getAllPrestataires", "Prestataires fetched with success")
    }],
    in_use: "Prestataire still provides transports or equipment and cannot be deleted",
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accommodation_fields_follow_declaration_order() {
        let body = json!({
            "nom": "Acme Hall", "address": "12 Main St", "type": "double", "prix": 100,
            "date_debut": "2025-01-01", "date_fin": "2025-01-05", "number": 3, "evenement_id": 7
        });
        let record = ACCOMMODATION.create.validate(&body).unwrap();
        let fields: Vec<&str> = record.fields().collect();
        assert_eq!(
            fields,
            vec!["nom", "address", "type", "prix", "date_debut", "date_fin", "number", "evenement_id"]
        );
    }

    #[test]
    fn accommodation_stay_must_span_a_night() {
        let body = json!({
            "nom": "Acme Hall", "address": "12 Main St", "type": "double", "prix": 100,
            "date_debut": "2025-01-01", "date_fin": "2025-01-01", "number": 3, "evenement_id": 7
        });
        let err = ACCOMMODATION.create.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("date_fin"));
    }

    #[test]
    fn unknown_room_type_is_rejected() {
        let body = json!({
            "nom": "Acme Hall", "address": "12 Main St", "type": "dorm", "prix": 100,
            "date_debut": "2025-01-01", "date_fin": "2025-01-05", "number": 3, "evenement_id": 7
        });
        let err = ACCOMMODATION.create.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("type"));
    }
}
