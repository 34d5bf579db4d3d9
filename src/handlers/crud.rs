// handlers/crud.rs - generic add / update / delete / list for a Resource
//
// Every write validates the body, checks the role, filters out empty fields and
// scopes the statement to the caller's entreprise. Rows of another tenant are
// never touched; a write that matches nothing is reported, not failed.

use axum::{
    extract::{Path, State},
    routing::{delete as delete_route, get, post, put},
    Extension, Router,
};
use serde_json::Value;

use super::{still_referenced, take_id};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::{ListRoute, Resource, DELETE_BY_ID};
use crate::scope::{Identity, ScopingGuard};
use crate::statement::{
    quote_ident, FieldFilter, Record, ScopePredicate, ScopeSpec, Statement, StatementBuilder, StatementError,
};

/// Mount the enabled write routes and every listing of `resource`.
pub fn routes(resource: &'static Resource) -> Router<AppState> {
    let mut router = Router::new();

    if resource.ops.add {
        router = router.route(
            &format!("/add{}", resource.entity),
            post(
                move |State(state): State<AppState>, Extension(identity): Extension<Identity>, Payload(body): Payload| async move {
                    add(resource, &state, &identity, &body).await
                },
            ),
        );
    }
    if resource.ops.update {
        router = router.route(
            &format!("/update{}", resource.entity),
            put(
                move |State(state): State<AppState>, Extension(identity): Extension<Identity>, Payload(body): Payload| async move {
                    update(resource, &state, &identity, &body).await
                },
            ),
        );
    }
    if resource.ops.delete {
        router = router.route(
            &format!("/delete{}", resource.entity),
            delete_route(
                move |State(state): State<AppState>, Extension(identity): Extension<Identity>, Payload(body): Payload| async move {
                    delete(resource, &state, &identity, &body).await
                },
            ),
        );
    }

    for list in resource.lists {
        router = match list.parent {
            Some(_) => router.route(
                list.path,
                get(
                    move |State(state): State<AppState>, Extension(identity): Extension<Identity>, Path(id): Path<i64>| async move {
                        list_rows(resource, list, &state, &identity, Some(id)).await
                    },
                ),
            ),
            None => router.route(
                list.path,
                get(
                    move |State(state): State<AppState>, Extension(identity): Extension<Identity>| async move {
                        list_rows(resource, list, &state, &identity, None).await
                    },
                ),
            ),
        };
    }

    router
}

/// Insert one row. Direct owners get their owner column derived from the
/// caller; child rows and supplied references are inserted only when the row
/// they name is in the tenant.
pub async fn add(resource: &'static Resource, state: &AppState, identity: &Identity, body: &Value) -> ApiResult {
    let record = resource.create.validate(body)?;
    let guard = ScopingGuard::new(identity);
    resource.authorize_write(&guard)?;

    let fields = FieldFilter::apply(&record)?;
    let caller = guard.caller_id();
    let derived: Vec<_> = resource.ownership.derived_on_insert(caller).into_iter().collect();
    let scope = guard.insert_scope(resource.ownership, resource.references, &fields);
    let statement = StatementBuilder::new(resource.table)
        .insert(&fields, &derived, &scope)?
        .returning(&resource.table.readable_list());

    let outcome = state.db.execute(&statement).await?;
    if outcome.row_count == 0 {
        // Only a guarded insert can come back empty: a parent or reference is
        // missing or belongs to another tenant.
        return Err(ApiError::not_found(resource.missing_parent(&fields)));
    }

    tracing::info!(resource = resource.label, caller, "row added");
    Ok(ApiResponse::from_write(outcome, resource.label, WriteKind::Added))
}

pub async fn update(resource: &'static Resource, state: &AppState, identity: &Identity, body: &Value) -> ApiResult {
    let mut record = resource.update.validate(body)?;
    let id = take_id(&mut record, resource.table.key)?;
    let guard = ScopingGuard::new(identity);
    resource.authorize_write(&guard)?;

    let fields = FieldFilter::apply(&record)?;
    let statement = update_statement(resource, &guard, id, &fields)?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_write(outcome, resource.label, WriteKind::Updated))
}

/// `UPDATE ... WHERE key AND tenant AND <reference checks>`.
pub fn update_statement(
    resource: &Resource,
    guard: &ScopingGuard<'_>,
    id: i64,
    fields: &Record,
) -> Result<Statement, StatementError> {
    let scope = guard.update_scope(resource.table.key_equals(id), resource.ownership, resource.references, fields);
    StatementBuilder::new(resource.table).update(fields, &[], &scope)
}

pub fn delete_statement(resource: &Resource, guard: &ScopingGuard<'_>, id: i64) -> Result<Statement, StatementError> {
    let scope = guard.row_scope(resource.table.key_equals(id), resource.ownership);
    StatementBuilder::new(resource.table).delete(&scope)
}

pub async fn delete(resource: &'static Resource, state: &AppState, identity: &Identity, body: &Value) -> ApiResult {
    let mut record = DELETE_BY_ID.validate(body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(identity);
    resource.authorize_write(&guard)?;

    let statement = delete_statement(resource, &guard, id)?;

    let outcome = state
        .db
        .execute(&statement)
        .await
        .map_err(still_referenced(resource.in_use))?;
    Ok(ApiResponse::from_write(outcome, resource.label, WriteKind::Deleted))
}

/// Tenant-scoped listing, optionally narrowed to one parent row.
pub async fn list_rows(
    resource: &'static Resource,
    list: &'static ListRoute,
    state: &AppState,
    identity: &Identity,
    parent_id: Option<i64>,
) -> ApiResult {
    let guard = ScopingGuard::new(identity);

    let mut scope = ScopeSpec::new();
    if let (Some(column), Some(id)) = (list.parent, parent_id) {
        let column = resource.table.column(column)?;
        scope.push(ScopePredicate::new(
            format!("{}=?", quote_ident(column.name)),
            vec![Value::from(id)],
        ));
    }
    scope.push(guard.tenant(resource.ownership));
    if let Some(filter) = list.filter {
        scope.push(ScopePredicate::fixed(filter));
    }

    let builder = StatementBuilder::new(resource.table);
    let statement = if list.columns.is_empty() {
        builder.select_readable(&scope, list.order)?
    } else {
        builder.select(list.columns, &scope, list.order)?
    };

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, list.message))
}
