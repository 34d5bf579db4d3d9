// handlers/transport.rs - transport writes that also touch transport_staff
//
// POST   /api/addTransport
// DELETE /api/deleteTransport
// POST   /api/addStaffToTransport
// DELETE /api/removeStaffFromTransport/:staff_id/:transport_id
// POST   /api/addCarToTransport
// DELETE /api/removeCarFromTransport

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use super::{finish, still_referenced, take_id};
use crate::app::AppState;
use crate::database::{DatabaseError, Transaction};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::logistics::{
    CAR_REFERENCE, TRANSPORT, TRANSPORT_CAR_LINK, TRANSPORT_CAR_UNLINK, TRANSPORT_CREATE, TRANSPORT_STAFF_LINK,
    TRANSPORT_STAFF_TABLE,
};
use crate::resources::DELETE_BY_ID;
use crate::scope::ownership::{staff_in_tenant, transport_in_tenant};
use crate::scope::{Identity, ScopingGuard};
use crate::statement::{DerivedColumn, FieldFilter, Record, ScopePredicate, ScopeSpec, StatementBuilder};

const ASSIGNMENT: &str = "Staff assignment";

/// Insert the transport and, when `staff_id` is given, its first staff link.
/// Both succeed or neither does.
pub async fn add_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = TRANSPORT_CREATE.validate(&body)?;
    let staff_id = record.remove("staff_id").as_ref().and_then(Value::as_i64);
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;
    let fields = FieldFilter::apply(&record)?;

    let mut tx = state.db.begin().await?;
    let result = insert_with_staff(tx.as_mut(), &guard, &fields, staff_id).await;
    finish(tx, result).await
}

async fn insert_with_staff(
    tx: &mut dyn Transaction,
    guard: &ScopingGuard<'_>,
    fields: &Record,
    staff_id: Option<i64>,
) -> ApiResult {
    let caller = guard.caller_id();
    let scope = guard.insert_scope(TRANSPORT.ownership, TRANSPORT.references, fields);
    let insert = StatementBuilder::new(TRANSPORT.table)
        .insert(fields, &[], &scope)?
        .returning(&TRANSPORT.table.readable_list());
    let outcome = tx.execute(&insert).await?;

    let transport_id = outcome
        .first()
        .and_then(|row| row.get("ID"))
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::not_found(TRANSPORT.missing_parent(fields)))?;

    if let Some(staff_id) = staff_id {
        let link = Record::new()
            .with("transport_id", transport_id)
            .with("staff_id", staff_id);
        let statement = StatementBuilder::new(&TRANSPORT_STAFF_TABLE).insert(
            &link,
            &[],
            &ScopeSpec::new().and(staff_in_tenant(caller)),
        )?;
        if tx.execute(&statement).await?.row_count == 0 {
            return Err(ApiError::not_found("Staff not found"));
        }
    }

    tracing::info!(transport_id, caller, "transport added");
    Ok(ApiResponse::from_write(outcome, TRANSPORT.label, WriteKind::Added))
}

/// Staff links go first so the transport row is no longer referenced.
pub async fn delete_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = DELETE_BY_ID.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;

    let mut tx = state.db.begin().await?;
    let result = delete_with_links(tx.as_mut(), &guard, id).await;
    finish(tx, result).await
}

async fn delete_with_links(tx: &mut dyn Transaction, guard: &ScopingGuard<'_>, id: i64) -> ApiResult {
    let unlink = StatementBuilder::new(&TRANSPORT_STAFF_TABLE).delete(
        &ScopeSpec::new()
            .and(TRANSPORT_STAFF_TABLE.key_equals(id))
            .and(transport_in_tenant(guard.caller_id())),
    )?;
    tx.execute(&unlink).await?;

    let scope = guard.row_scope(TRANSPORT.table.key_equals(id), TRANSPORT.ownership);
    let statement = StatementBuilder::new(TRANSPORT.table).delete(&scope)?;
    let outcome = tx
        .execute(&statement)
        .await
        .map_err(still_referenced(TRANSPORT.in_use))?;
    Ok(ApiResponse::from_write(outcome, TRANSPORT.label, WriteKind::Deleted))
}

/// Link a staff member to a transport. Both have to be in the caller's tenant.
pub async fn add_staff_to_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let record = TRANSPORT_STAFF_LINK.validate(&body)?;
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;

    let caller = guard.caller_id();
    let scope = ScopeSpec::new()
        .and(transport_in_tenant(caller))
        .and(staff_in_tenant(caller));
    let statement = StatementBuilder::new(&TRANSPORT_STAFF_TABLE)
        .insert(&record, &[], &scope)?
        .returning(&TRANSPORT_STAFF_TABLE.readable_list());

    let outcome = state.db.execute(&statement).await.map_err(|err| match err {
        DatabaseError::UniqueViolation { .. } => {
            ApiError::conflict("Staff member is already assigned to this transport")
        }
        other => other.into(),
    })?;
    if outcome.row_count == 0 {
        return Err(ApiError::not_found("Transport or staff not found"));
    }
    Ok(ApiResponse::from_write(outcome, ASSIGNMENT, WriteKind::Added))
}

pub async fn remove_staff_from_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((staff_id, transport_id)): Path<(i64, i64)>,
) -> ApiResult {
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;

    let scope = ScopeSpec::new()
        .and(TRANSPORT_STAFF_TABLE.key_equals(transport_id))
        .and(ScopePredicate::new("staff_id=?", vec![Value::from(staff_id)]))
        .and(transport_in_tenant(guard.caller_id()));
    let statement = StatementBuilder::new(&TRANSPORT_STAFF_TABLE).delete(&scope)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, ASSIGNMENT, WriteKind::Deleted))
}

/// Point a tenant transport at a tenant car.
pub async fn add_car_to_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = TRANSPORT_CAR_LINK.validate(&body)?;
    let transport_id = take_id(&mut record, "transport_id")?;
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;

    let fields = FieldFilter::apply(&record)?;
    let scope = guard.update_scope(
        TRANSPORT.table.key_equals(transport_id),
        TRANSPORT.ownership,
        &[CAR_REFERENCE],
        &fields,
    );
    let statement = StatementBuilder::new(TRANSPORT.table)
        .update(&fields, &[], &scope)?
        .returning(&TRANSPORT.table.readable_list());

    let outcome = state.db.execute(&statement).await?;
    if outcome.row_count == 0 {
        return Err(ApiError::not_found("Transport or car not found"));
    }
    Ok(ApiResponse::from_write(outcome, TRANSPORT.label, WriteKind::Updated))
}

pub async fn remove_car_from_transport(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = TRANSPORT_CAR_UNLINK.validate(&body)?;
    let transport_id = take_id(&mut record, "transport_id")?;
    let guard = ScopingGuard::new(&identity);
    TRANSPORT.authorize_write(&guard)?;

    // A NULL bind would be typed text, so the column is cleared literally.
    let clear = [DerivedColumn::new("car_id", "NULL", vec![])];
    let scope = guard.row_scope(TRANSPORT.table.key_equals(transport_id), TRANSPORT.ownership);
    let statement = StatementBuilder::new(TRANSPORT.table).update(&Record::new(), &clear, &scope)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, TRANSPORT.label, WriteKind::Updated))
}
