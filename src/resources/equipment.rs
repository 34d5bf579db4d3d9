use super::logistics::AGENCY_REFERENCE;
use super::{ListRoute, Ops, Resource, WriteAccess};
use crate::scope::{Ownership, Reference};
use crate::statement::{ColumnSpec, ColumnType, OrderBy, TableSpec};
use crate::validation::{Check, FieldKind, FieldRule, Schema, ID, PRICE, TEXT};

pub static EQUIPMENT_TABLE: TableSpec = TableSpec {
    name: "equipement",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("code_bar", ColumnType::Text),
        ColumnSpec::new("RFID", ColumnType::Text),
        ColumnSpec::new("details", ColumnType::Text),
        ColumnSpec::new("type", ColumnType::Text),
        ColumnSpec::new("prix", ColumnType::Numeric),
        ColumnSpec::new("date_achat", ColumnType::Date),
        ColumnSpec::new("date_location", ColumnType::Date),
        ColumnSpec::new("date_retour", ColumnType::Date),
        ColumnSpec::new("category_id", ColumnType::Integer),
        ColumnSpec::new("sub_category_id", ColumnType::Integer),
        ColumnSpec::new("agence_id", ColumnType::Integer),
        ColumnSpec::new("available", ColumnType::Boolean),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

pub static RESERVATION_TABLE: TableSpec = TableSpec {
    name: "Liste_equipement",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("equipement_id", ColumnType::Integer),
        ColumnSpec::new("evenement_id", ColumnType::Integer),
        ColumnSpec::new("date_debut", ColumnType::Date),
        ColumnSpec::new("date_fin", ColumnType::Date),
    ],
};

pub const CATEGORY_REFERENCE: Reference =
    Reference::new("category_id", "category", Ownership::Entreprise, "Category");
pub const SUB_CATEGORY_REFERENCE: Reference =
    Reference::new("sub_category_id", "sub_category", Ownership::Category, "Sub-category");

/// Foreign columns of an equipment row that the client sets.
pub static EQUIPMENT_REFERENCES: [Reference; 3] = [CATEGORY_REFERENCE, SUB_CATEGORY_REFERENCE, AGENCY_REFERENCE];

const OWNERSHIP_TYPE: FieldKind = FieldKind::OneOf(&["loue", "achete"]);
const QUANTITY: FieldKind = FieldKind::Integer { min: Some(1) };

const ACQUISITION_CHECKS: &[Check] = &[
    Check::RequiredWhen {
        field: "type",
        equals: "loue",
        required: &["date_location", "date_retour"],
    },
    Check::RequiredWhen {
        field: "type",
        equals: "achete",
        required: &["date_achat"],
    },
    Check::Before {
        start: "date_location",
        end: "date_retour",
    },
];

/// `quantite` identical rows are inserted; it is not a column.
pub static EQUIPMENT_CREATE: Schema = Schema {
    fields: &[
        FieldRule::required("nom", TEXT),
        FieldRule::optional("code_bar", TEXT),
        FieldRule::optional("RFID", TEXT),
        FieldRule::optional("details", TEXT),
        FieldRule::required("type", OWNERSHIP_TYPE),
        FieldRule::required("prix", PRICE),
        FieldRule::optional("date_achat", FieldKind::Date),
        FieldRule::optional("date_location", FieldKind::Date),
        FieldRule::optional("date_retour", FieldKind::Date),
        FieldRule::required("category_id", ID),
        FieldRule::optional("sub_category_id", ID),
        FieldRule::optional("agence_id", ID),
        FieldRule::required("quantite", QUANTITY),
    ],
    checks: ACQUISITION_CHECKS,
};

/// `IDs` selects the rows, `quantite` optionally limits how many of them.
pub static EQUIPMENT_UPDATE: Schema = Schema {
    fields: &[
        FieldRule::required("IDs", FieldKind::IntegerList { min_len: 1 }),
        FieldRule::optional("quantite", QUANTITY),
        FieldRule::optional("nom", TEXT),
        FieldRule::optional("code_bar", TEXT),
        FieldRule::optional("RFID", TEXT),
        FieldRule::optional("details", TEXT),
        FieldRule::optional("type", OWNERSHIP_TYPE),
        FieldRule::optional("prix", PRICE),
        FieldRule::optional("date_achat", FieldKind::Date),
        FieldRule::optional("date_location", FieldKind::Date),
        FieldRule::optional("date_retour", FieldKind::Date),
        FieldRule::optional("category_id", ID),
        FieldRule::optional("sub_category_id", ID),
        FieldRule::optional("agence_id", ID),
        FieldRule::optional("available", FieldKind::Boolean),
    ],
    checks: &[Check::Before {
        start: "date_location",
        end: "date_retour",
    }],
};

pub static EQUIPMENT_DELETE: Schema = Schema {
    fields: &[
        FieldRule::required("IDs", FieldKind::IntegerList { min_len: 1 }),
        FieldRule::optional("nbr", QUANTITY),
    ],
    checks: &[],
};

pub static RESERVE: Schema = Schema {
    fields: &[
        FieldRule::required("equipement_id", ID),
        FieldRule::required("evenement_id", ID),
        FieldRule::required("date_debut", FieldKind::Date),
        FieldRule::required("date_fin", FieldKind::Date),
    ],
    checks: &[Check::NotAfter {
        start: "date_debut",
        end: "date_fin",
    }],
};

pub static UNRESERVE: Schema = Schema {
    fields: &[
        FieldRule::required("equipement_id", ID),
        FieldRule::required("evenement_id", ID),
    ],
    checks: &[],
};

/// Attach an item to an event without a date range.
pub static EVENT_ASSIGNMENT: Schema = Schema {
    fields: &[
        FieldRule::required("ID_event", ID),
        FieldRule::required("ID_equipment", ID),
    ],
    checks: &[],
};

/// End of the usage window, taken from the path.
pub static USAGE_POINT: Schema = Schema {
    fields: &[FieldRule::required("timestamp", FieldKind::Timestamp)],
    checks: &[],
};

/// Inclusive date range, taken from the path.
pub static PERIOD: Schema = Schema {
    fields: &[
        FieldRule::required("start_date", FieldKind::Date),
        FieldRule::required("end_date", FieldKind::Date),
    ],
    checks: &[Check::NotAfter {
        start: "start_date",
        end: "end_date",
    }],
};

pub static CATEGORY_TABLE: TableSpec = TableSpec {
    name: "category",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("entreprise_id", ColumnType::Integer),
    ],
};

pub static CATEGORY: Resource = Resource {
    label: "Category",
    entity: "Category",
    table: &CATEGORY_TABLE,
    ownership: Ownership::Entreprise,
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
    lists: &[ListRoute {
        order: Some(OrderBy::asc("nom")),
        ..ListRoute::all("/getAllCategories", "Categories fetched with success")
    }],
    in_use: "Category still has equipment or sub-categories and cannot be deleted",
};

pub static SUB_CATEGORY_TABLE: TableSpec = TableSpec {
    name: "sub_category",
    key: "ID",
    columns: &[
        ColumnSpec::new("ID", ColumnType::Integer),
        ColumnSpec::new("nom", ColumnType::Text),
        ColumnSpec::new("category_id", ColumnType::Integer),
    ],
};

pub static SUB_CATEGORY: Resource = Resource {
    label: "Sub-category",
    entity: "SubCategory",
    table: &SUB_CATEGORY_TABLE,
    ownership: Ownership::Category,
    references: &[],
    create: &Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::required("category_id", ID),
        ],
        checks: &[],
    },
    update: &Schema {
        fields: &[FieldRule::required("ID", ID), FieldRule::optional("nom", TEXT)],
        checks: &[],
    },
    access: WriteAccess::Manager,
    ops: Ops::ALL,
    lists: &[ListRoute {
        order: Some(OrderBy::asc("nom")),
        ..ListRoute::all("/getAllSubCategories", "Sub-categories fetched with success")
    }],
    in_use: "Sub-category still has equipment and cannot be deleted",
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rented_equipment_needs_rental_window() {
        let body = json!({"nom": "Projector", "type": "loue", "prix": 20, "category_id": 1, "quantite": 2});
        let err = EQUIPMENT_CREATE.validate(&body).unwrap_err();
        assert!(err.field_errors.contains_key("date_location"));
        assert!(err.field_errors.contains_key("date_retour"));
        assert!(!err.field_errors.contains_key("date_achat"));
    }

    #[test]
    fn purchased_equipment_needs_purchase_date() {
        let body = json!({
            "nom": "Projector", "type": "achete", "prix": 20, "category_id": 1,
            "quantite": 2, "date_achat": "2024-06-01"
        });
        let record = EQUIPMENT_CREATE.validate(&body).unwrap();
        assert_eq!(record.get("quantite"), Some(&json!(2)));
    }

    #[test]
    fn single_day_reservation_is_valid() {
        let body = json!({"equipement_id": 1, "evenement_id": 1, "date_debut": "2025-01-01", "date_fin": "2025-01-01"});
        assert!(RESERVE.validate(&body).is_ok());

        let reversed = json!({"equipement_id": 1, "evenement_id": 1, "date_debut": "2025-01-02", "date_fin": "2025-01-01"});
        assert!(RESERVE.validate(&reversed).unwrap_err().field_errors.contains_key("date_fin"));
    }

    #[test]
    fn update_keeps_false_availability() {
        let record = EQUIPMENT_UPDATE.validate(&json!({"IDs": [3, 4], "available": false})).unwrap();
        assert_eq!(record.get("available"), Some(&json!(false)));
        assert_eq!(record.get("IDs"), Some(&json!([3, 4])));
    }
}
