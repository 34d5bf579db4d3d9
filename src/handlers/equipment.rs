// handlers/equipment.rs - equipment stock, categories and reservations
//
// Equipment rows belong to the entreprise directly. Bulk writes address rows
// by an `IDs` list; reservations flip `available` inside a transaction that
// holds a row lock on the equipment. Joined category, sub-category and agency
// rows must share the equipment's entreprise.

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use super::{finish, still_referenced, take_id, take_ids};
use crate::app::AppState;
use crate::config;
use crate::database::{QueryOutcome, Transaction};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::clients::EVENT;
use crate::resources::equipment::{
    EQUIPMENT_CREATE, EQUIPMENT_DELETE, EQUIPMENT_REFERENCES, EQUIPMENT_TABLE, EQUIPMENT_UPDATE, EVENT_ASSIGNMENT,
    PERIOD, RESERVATION_TABLE, RESERVE, UNRESERVE, USAGE_POINT,
};
use crate::scope::ownership::{equipment_in_tenant, missing_rows, tenant_clients, tenant_id};
use crate::scope::{Identity, Ownership, ScopingGuard};
use crate::statement::{query, FieldFilter, OrderBy, Record, ScopePredicate, ScopeSpec, Statement, StatementBuilder};
use crate::validation::ValidationError;

const EQUIPMENT: &str = "Equipment";
const RESERVATION: &str = "Reservation";
const IN_USE: &str = "Equipment is reserved for an event and cannot be deleted";

const ASSIGNMENT: &str = "Event equipment";

macro_rules! equipment_columns {
    () => {
        concat!(
            "e.\"ID\", e.nom, e.code_bar, e.\"RFID\", e.details, e.type, e.prix, e.date_achat, ",
            "e.date_location, e.date_retour, e.available, e.agence_id, ",
            "e.category_id, c.nom AS category_name, e.sub_category_id, s.nom AS sub_category_name, ",
            "ag.nom AS agence_nom, ag.num_tel AS agence_num_tel, ag.email AS agence_email, ag.address AS agence_address"
        )
    };
}

/// Name lookups for `e`, matched against `e.entreprise_id` so they add no bind.
macro_rules! equipment_joins {
    () => {
        concat!(
            "LEFT JOIN category c ON c.\"ID\" = e.category_id AND c.entreprise_id = e.entreprise_id ",
            "LEFT JOIN sub_category s ON s.\"ID\" = e.sub_category_id ",
            "AND s.category_id IN (SELECT \"ID\" FROM category WHERE entreprise_id = e.entreprise_id) ",
            "LEFT JOIN agence ag ON ag.\"ID\" = e.agence_id AND ag.entreprise_id = e.entreprise_id "
        )
    };
}

const EQUIPMENT_WITH_CATEGORIES: &str = concat!(
    "SELECT ",
    equipment_columns!(),
    " FROM equipement e ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " ORDER BY e.nom"
);

/// Items without a reservation overlapping `[start, end]`; binds caller, end, start.
const FREE_DURING: &str = concat!(
    "SELECT ",
    equipment_columns!(),
    " FROM equipement e ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND NOT EXISTS (SELECT 1 FROM \"Liste_equipement\" le WHERE le.equipement_id = e.\"ID\" ",
    "AND le.date_debut <= ?::date AND le.date_fin >= ?::date) ORDER BY e.nom"
);

/// Owned items that are available and not reserved at all.
const FREE_OWNED: &str = concat!(
    "SELECT ",
    equipment_columns!(),
    " FROM equipement e ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND e.available = true AND e.agence_id IS NULL ",
    "AND NOT EXISTS (SELECT 1 FROM \"Liste_equipement\" le WHERE le.equipement_id = e.\"ID\") ORDER BY e.nom"
);

const FREE_FROM_AGENCIES: &str = concat!(
    "SELECT ",
    equipment_columns!(),
    " FROM equipement e ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND e.available = true AND e.agence_id IS NOT NULL ORDER BY e.nom"
);

const RESERVED_FOR_EVENT: &str = concat!(
    "SELECT ",
    equipment_columns!(),
    ", le.date_debut, le.date_fin FROM equipement e ",
    "JOIN \"Liste_equipement\" le ON le.equipement_id = e.\"ID\" ",
    equipment_joins!(),
    "WHERE le.evenement_id = ? AND e.entreprise_id = ",
    tenant_id!(),
    " ORDER BY le.date_debut"
);

/// Reservations per item over the eleven months up to the given instant.
const EQUIPMENT_USE: &str = concat!(
    "SELECT e.nom, e.details, s.nom AS sub_category_name, count(*) AS use_number ",
    "FROM equipement e JOIN \"Liste_equipement\" le ON le.equipement_id = e.\"ID\" ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND le.date_debut BETWEEN ?::timestamp - INTERVAL '11 months' AND ?::timestamp ",
    "GROUP BY e.nom, e.details, e.sub_category_id, s.nom ORDER BY use_number DESC"
);

const CATEGORY_USE: &str = concat!(
    "SELECT c.nom, count(*) AS use_number ",
    "FROM equipement e JOIN \"Liste_equipement\" le ON le.equipement_id = e.\"ID\" ",
    equipment_joins!(),
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND le.date_debut BETWEEN ?::timestamp - INTERVAL '11 months' AND ?::timestamp ",
    "GROUP BY e.category_id, c.nom ORDER BY use_number DESC"
);

/// Past events each item was booked for; binds caller twice, then the instant.
const EQUIPMENT_HISTORY: &str = concat!(
    "SELECT e.nom AS equipment_name, e.type, count(*) AS use_number, ",
    "ev.date_debut, ev.date_fin, ev.nom AS event_name ",
    "FROM equipement e JOIN \"Liste_equipement\" le ON le.equipement_id = e.\"ID\" ",
    "JOIN evenement ev ON ev.\"ID\" = le.evenement_id ",
    "WHERE e.entreprise_id = ",
    tenant_id!(),
    " AND ev.client_id IN (",
    tenant_clients!(),
    ") AND ev.date_fin < ?::timestamp ",
    "GROUP BY ev.\"ID\", ev.date_debut, ev.date_fin, ev.nom, e.nom, e.type ORDER BY ev.date_debut DESC"
);

const CATEGORIES_WITH_CHILDREN: &str = concat!(
    "SELECT c.\"ID\", c.nom, ",
    "COALESCE(json_agg(json_build_object('ID', s.\"ID\", 'nom', s.nom) ORDER BY s.nom) ",
    "FILTER (WHERE s.\"ID\" IS NOT NULL), '[]'::json) AS sub_categories ",
    "FROM category c ",
    "LEFT JOIN sub_category s ON s.category_id = c.\"ID\" ",
    "WHERE c.entreprise_id = ",
    tenant_id!(),
    " GROUP BY c.\"ID\", c.nom ORDER BY c.nom"
);

const EVENT_RESERVATIONS: &str = concat!(
    "SELECT l.\"ID\", l.equipement_id, e.nom AS equipment_name, e.type, l.evenement_id, l.date_debut, l.date_fin ",
    "FROM \"Liste_equipement\" l ",
    "JOIN equipement e ON e.\"ID\" = l.equipement_id ",
    "WHERE l.evenement_id = ? AND e.entreprise_id = ",
    tenant_id!(),
    " ORDER BY l.date_debut"
);

/// Keep the first `limit` ids when a limit is given.
fn first_n(mut ids: Vec<i64>, limit: Option<i64>) -> Vec<i64> {
    if let Some(limit) = limit {
        ids.truncate(limit.max(0) as usize);
    }
    ids
}

/// Insert `quantite` identical rows, all available, in one transaction.
pub async fn add_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = EQUIPMENT_CREATE.validate(&body)?;
    let quantity = take_id(&mut record, "quantite")?;
    let max = i64::from(config::config().equipment.max_bulk_quantity);
    if quantity > max {
        return Err(ValidationError::field("quantite", format!("Must be at most {}", max)).into());
    }

    let guard = ScopingGuard::new(&identity);
    guard.require_manager()?;

    let mut fields = FieldFilter::apply(&record)?;
    fields.insert("available", Value::Bool(true));
    let derived: Vec<_> = Ownership::Entreprise
        .derived_on_insert(guard.caller_id())
        .into_iter()
        .collect();
    let scope = guard.insert_scope(Ownership::Entreprise, &EQUIPMENT_REFERENCES, &fields);
    let statement = StatementBuilder::new(&EQUIPMENT_TABLE)
        .insert(&fields, &derived, &scope)?
        .returning(&EQUIPMENT_TABLE.readable_list());
    let missing = missing_rows(None, &EQUIPMENT_REFERENCES, &fields, EQUIPMENT);

    let mut tx = state.db.begin().await?;
    let result = insert_copies(tx.as_mut(), &statement, quantity, missing).await;
    finish(tx, result).await
}

/// Every copy runs the same guarded insert; an empty result means a
/// referenced row is outside the tenant and the whole batch is rolled back.
async fn insert_copies(tx: &mut dyn Transaction, statement: &Statement, quantity: i64, missing: String) -> ApiResult {
    let mut rows = Vec::with_capacity(quantity as usize);
    for _ in 0..quantity {
        let outcome = tx.execute(statement).await?;
        if outcome.row_count == 0 {
            return Err(ApiError::not_found(missing));
        }
        rows.extend(outcome.rows);
    }
    tracing::info!(quantity, "equipment added");
    Ok(ApiResponse::from_write(QueryOutcome::with_rows(rows), EQUIPMENT, WriteKind::Added))
}

pub async fn update_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = EQUIPMENT_UPDATE.validate(&body)?;
    let ids = take_ids(&mut record, "IDs")?;
    let limit = record.remove("quantite").as_ref().and_then(Value::as_i64);
    let guard = ScopingGuard::new(&identity);
    guard.require_manager()?;

    let fields = FieldFilter::apply(&record)?;
    let scope = guard.update_scope(
        EQUIPMENT_TABLE.key_in(&first_n(ids, limit)),
        Ownership::Entreprise,
        &EQUIPMENT_REFERENCES,
        &fields,
    );
    let statement = StatementBuilder::new(&EQUIPMENT_TABLE).update(&fields, &[], &scope)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, EQUIPMENT, WriteKind::Updated))
}

pub async fn delete_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = EQUIPMENT_DELETE.validate(&body)?;
    let ids = take_ids(&mut record, "IDs")?;
    let limit = record.remove("nbr").as_ref().and_then(Value::as_i64);
    let guard = ScopingGuard::new(&identity);
    guard.require_manager()?;

    let scope = ScopeSpec::new()
        .and(EQUIPMENT_TABLE.key_in(&first_n(ids, limit)))
        .and(guard.tenant(Ownership::Entreprise));
    let statement = StatementBuilder::new(&EQUIPMENT_TABLE).delete(&scope)?;

    let outcome = state.db.execute(&statement).await.map_err(still_referenced(IN_USE))?;
    Ok(ApiResponse::from_write(outcome, EQUIPMENT, WriteKind::Deleted))
}

pub async fn get_all_equipment(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> ApiResult {
    let statement = query(EQUIPMENT_WITH_CATEGORIES, vec![Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Equipment fetched with success"))
}

pub async fn get_available_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let guard = ScopingGuard::new(&identity);
    let scope = ScopeSpec::new()
        .and(guard.tenant(Ownership::Entreprise))
        .and(ScopePredicate::fixed("available = true"));
    let statement = StatementBuilder::new(&EQUIPMENT_TABLE).select_readable(&scope, Some(OrderBy::asc("nom")))?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Available equipment fetched with success"))
}

pub async fn get_categories(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> ApiResult {
    let statement = query(CATEGORIES_WITH_CHILDREN, vec![Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Categories fetched with success"))
}

pub async fn get_event_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<i64>,
) -> ApiResult {
    let statement = query(EVENT_RESERVATIONS, vec![Value::from(event_id), Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Event equipment fetched with success"))
}

pub async fn get_reserved_equipment_for_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<i64>,
) -> ApiResult {
    let statement = query(RESERVED_FOR_EVENT, vec![Value::from(event_id), Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Reserved equipment fetched with success"))
}

/// Items free over the whole inclusive range `[start_date, end_date]`.
pub async fn get_available_event_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((start_date, end_date)): Path<(String, String)>,
) -> ApiResult {
    let period = PERIOD.validate(&json!({"start_date": start_date, "end_date": end_date}))?;
    let statement = query(
        FREE_DURING,
        vec![
            Value::from(identity.id),
            field(&period, "end_date")?,
            field(&period, "start_date")?,
        ],
    )?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Available equipment fetched with success"))
}

pub async fn get_available_equipment_for_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let statement = query(FREE_OWNED, vec![Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Available equipment fetched with success"))
}

pub async fn get_available_agency_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let statement = query(FREE_FROM_AGENCIES, vec![Value::from(identity.id)])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Available agency equipment fetched with success"))
}

fn usage_point(timestamp: String) -> Result<Value, ApiError> {
    let record = USAGE_POINT.validate(&json!({ "timestamp": timestamp }))?;
    field(&record, "timestamp")
}

pub async fn get_equipment_use(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(timestamp): Path<String>,
) -> ApiResult {
    let until = usage_point(timestamp)?;
    let statement = query(EQUIPMENT_USE, vec![Value::from(identity.id), until.clone(), until])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Equipment usage fetched with success"))
}

pub async fn get_category_use(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(timestamp): Path<String>,
) -> ApiResult {
    let until = usage_point(timestamp)?;
    let statement = query(CATEGORY_USE, vec![Value::from(identity.id), until.clone(), until])?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Category usage fetched with success"))
}

pub async fn get_history_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(timestamp): Path<String>,
) -> ApiResult {
    let before = usage_point(timestamp)?;
    let statement = query(
        EQUIPMENT_HISTORY,
        vec![Value::from(identity.id), Value::from(identity.id), before],
    )?;
    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Equipment history fetched with success"))
}

/// Attach a tenant item to a tenant event without dates. Availability is
/// left untouched.
pub async fn add_equipment_to_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let record = EVENT_ASSIGNMENT.validate(&body)?;
    let guard = ScopingGuard::new(&identity);
    guard.require_manager()?;

    let fields = Record::new()
        .with("evenement_id", field(&record, "ID_event")?)
        .with("equipement_id", field(&record, "ID_equipment")?);
    let scope = ScopeSpec::new()
        .and(equipment_in_tenant(guard.caller_id()))
        .and(guard.tenant(Ownership::Event));
    let statement = StatementBuilder::new(&RESERVATION_TABLE)
        .insert(&fields, &[], &scope)?
        .returning("*");

    let outcome = state.db.execute(&statement).await?;
    if outcome.row_count == 0 {
        return Err(ApiError::not_found("Equipment or event not found"));
    }
    Ok(ApiResponse::from_write(outcome, ASSIGNMENT, WriteKind::Added))
}

pub async fn remove_equipment_from_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((equipment_id, event_id)): Path<(i64, i64)>,
) -> ApiResult {
    let guard = ScopingGuard::new(&identity);
    guard.require_manager()?;

    let scope = ScopeSpec::new()
        .and(ScopePredicate::new("equipement_id=?", vec![Value::from(equipment_id)]))
        .and(ScopePredicate::new("evenement_id=?", vec![Value::from(event_id)]))
        .and(equipment_in_tenant(guard.caller_id()));
    let statement = StatementBuilder::new(&RESERVATION_TABLE)
        .delete(&scope)?
        .returning("*");

    let outcome = state.db.execute(&statement).await?;
    if outcome.row_count == 0 {
        return Err(ApiError::not_found("Equipment assignment not found"));
    }
    Ok(ApiResponse::from_write(outcome, ASSIGNMENT, WriteKind::Deleted))
}

/// Reserve one item for an event over `[date_debut, date_fin]`.
pub async fn reserve_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let record = RESERVE.validate(&body)?;
    let guard = ScopingGuard::new(&identity);

    let mut tx = state.db.begin().await?;
    let result = reserve(tx.as_mut(), &guard, &record).await;
    finish(tx, result).await
}

async fn reserve(tx: &mut dyn Transaction, guard: &ScopingGuard<'_>, record: &Record) -> ApiResult {
    let equipment_id = field(record, "equipement_id")?;
    let event_id = field(record, "evenement_id")?;
    let start = field(record, "date_debut")?;
    let end = field(record, "date_fin")?;

    let lock = StatementBuilder::new(&EQUIPMENT_TABLE)
        .select(
            &["ID", "available"],
            &guard.row_scope(EQUIPMENT_TABLE.key_equals(equipment_id.clone()), Ownership::Entreprise),
            None,
        )?
        .for_update();
    let locked = tx.execute(&lock).await?;
    let equipment = locked
        .first()
        .ok_or_else(|| ApiError::not_found("Equipment not found"))?;
    let available = equipment.get("available").and_then(Value::as_bool).unwrap_or(false);

    let event = StatementBuilder::new(EVENT.table).select(
        &["ID"],
        &guard.row_scope(EVENT.table.key_equals(event_id), EVENT.ownership),
        None,
    )?;
    if tx.execute(&event).await?.row_count == 0 {
        return Err(ApiError::not_found("Event not found"));
    }

    let overlap = StatementBuilder::new(&RESERVATION_TABLE).select(
        &["ID"],
        &ScopeSpec::new()
            .and(ScopePredicate::new("equipement_id=?", vec![equipment_id.clone()]))
            .and(ScopePredicate::new("date_debut <= ?::date AND date_fin >= ?::date", vec![end, start])),
        None,
    )?;
    if tx.execute(&overlap).await?.row_count > 0 {
        return Err(ApiError::bad_request("Equipment is already reserved for these dates"));
    }
    if !available {
        return Err(ApiError::bad_request("Equipment is not available"));
    }

    let flip = StatementBuilder::new(&EQUIPMENT_TABLE).update(
        &Record::new().with("available", false),
        &[],
        &ScopeSpec::new().and(EQUIPMENT_TABLE.key_equals(equipment_id)),
    )?;
    tx.execute(&flip).await?;

    let insert = StatementBuilder::new(&RESERVATION_TABLE)
        .insert(record, &[], &ScopeSpec::new())?
        .returning("*");
    let outcome = tx.execute(&insert).await?;

    tracing::info!(caller = guard.caller_id(), "equipment reserved");
    Ok(ApiResponse::from_write(outcome, RESERVATION, WriteKind::Added))
}

pub async fn unreserve_equipment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let record = UNRESERVE.validate(&body)?;
    let guard = ScopingGuard::new(&identity);

    let mut tx = state.db.begin().await?;
    let result = unreserve(tx.as_mut(), &guard, &record).await;
    finish(tx, result).await
}

async fn unreserve(tx: &mut dyn Transaction, guard: &ScopingGuard<'_>, record: &Record) -> ApiResult {
    let equipment_id = field(record, "equipement_id")?;
    let event_id = field(record, "evenement_id")?;

    let remove = StatementBuilder::new(&RESERVATION_TABLE).delete(
        &ScopeSpec::new()
            .and(ScopePredicate::new("equipement_id=?", vec![equipment_id.clone()]))
            .and(ScopePredicate::new("evenement_id=?", vec![event_id]))
            .and(equipment_in_tenant(guard.caller_id())),
    )?;
    if tx.execute(&remove).await?.row_count == 0 {
        return Err(ApiError::not_found("No reservation found for this equipment and event"));
    }

    let release = StatementBuilder::new(&EQUIPMENT_TABLE).update(
        &Record::new().with("available", true),
        &[],
        &guard.row_scope(EQUIPMENT_TABLE.key_equals(equipment_id), Ownership::Entreprise),
    )?;
    tx.execute(&release).await?;

    Ok(ApiResponse::message("Equipment unreserved with success"))
}

fn field(record: &Record, name: &str) -> Result<Value, ApiError> {
    record
        .get(name)
        .cloned()
        .ok_or_else(|| ValidationError::field(name, "This field is required").into())
}
