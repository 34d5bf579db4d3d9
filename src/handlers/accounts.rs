// handlers/accounts.rs - session and account management
//
// POST   /api/logIn          (public)
// POST   /api/logOut         (public)
// POST   /api/addAccount
// PUT    /api/updateAccount
// DELETE /api/deleteAccount
// GET    /api/getAccounts

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Map, Value};

use super::{still_referenced, take_id};
use crate::app::AppState;
use crate::auth::cookie::{logout_cookie, session_cookie};
use crate::auth::password::{hash_password, verify_password, UNKNOWN_ACCOUNT_HASH};
use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Payload, WriteKind};
use crate::resources::accounts::{ACCOUNTS_TABLE, ACCOUNT_CREATE, ACCOUNT_UPDATE, LOGIN, TEMPORARY};
use crate::resources::DELETE_BY_ID;
use crate::scope::{Identity, Ownership, ScopingGuard};
use crate::statement::{FieldFilter, OrderBy, Record, ScopePredicate, ScopeSpec, StatementBuilder};

const ACCOUNT: &str = "Account";
const IN_USE: &str = "Account still owns clients, staff or teams and cannot be deleted";

/// Columns read at login. The hash is compared, never returned.
const LOGIN_COLUMNS: &[&str] = &[
    "ID",
    "nom",
    "email",
    "password",
    "role",
    "type",
    "activation_date",
    "deactivation_date",
];

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

pub(super) fn duplicate_email(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::UniqueViolation { .. } => ApiError::conflict("An account with this email already exists"),
        other => other.into(),
    }
}

fn text(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Permanent accounts are always active; temporary ones only between their
/// activation and deactivation dates, both inclusive.
fn within_window(account: &Map<String, Value>, today: NaiveDate) -> bool {
    if account.get("type").and_then(Value::as_str) != Some(TEMPORARY) {
        return true;
    }
    let date = |field: &str| {
        account
            .get(field)
            .and_then(Value::as_str)
            .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
    };
    match (date("activation_date"), date("deactivation_date")) {
        (Some(from), Some(until)) => from <= today && today <= until,
        _ => false,
    }
}

/// The hash to verify against; unknown emails still pay for one bcrypt check.
fn stored_hash(account: Option<&Map<String, Value>>) -> &str {
    account
        .and_then(|row| row.get("password"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ACCOUNT_HASH)
}

pub async fn log_in(State(state): State<AppState>, Payload(body): Payload) -> Result<Response, ApiError> {
    let record = LOGIN.validate(&body)?;
    let email = text(&record, "email").ok_or_else(invalid_credentials)?;
    let password = text(&record, "password").ok_or_else(invalid_credentials)?;

    let statement = StatementBuilder::new(&ACCOUNTS_TABLE).select(
        LOGIN_COLUMNS,
        &ScopeSpec::new().and(ScopePredicate::new("email=?", vec![Value::from(email)])),
        None,
    )?;
    let outcome = state.db.execute(&statement).await?;
    let account = outcome.first();

    let verified = match verify_password(&password, stored_hash(account)).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!("Stored password hash is unusable: {}", err);
            false
        }
    };
    let account = match account {
        Some(account) if verified => account,
        _ => return Err(invalid_credentials()),
    };

    if !within_window(account, Utc::now().date_naive()) {
        return Err(ApiError::forbidden("Account is not active"));
    }

    let id = account
        .get("ID")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::internal_server_error("Account row has no id"))?;
    let role = account.get("role").and_then(Value::as_str).unwrap_or_default().to_string();

    let token = generate_jwt(&Claims::new(id, role.clone()))?;
    let cookie = session_cookie(&token, &config::config().security);
    tracing::info!(account = id, "logged in");

    let data = json!({
        "id": id,
        "nom": account.get("nom").cloned().unwrap_or(Value::Null),
        "email": account.get("email").cloned().unwrap_or(Value::Null),
        "role": role,
    });
    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        ApiResponse::success("Logged in with success", data),
    )
        .into_response())
}

pub async fn log_out() -> Response {
    let cookie = logout_cookie(&config::config().security);
    (
        [(header::SET_COOKIE, cookie.to_string())],
        ApiResponse::message("Logged out with success"),
    )
        .into_response()
}

pub async fn add_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = ACCOUNT_CREATE.validate(&body)?;
    let guard = ScopingGuard::new(&identity);
    let role = text(&record, "role").unwrap_or_default();
    guard.authorize_role_grant(&role, None)?;

    if let Some(password) = text(&record, "password") {
        let hashed = hash_password(&password, config::config().security.bcrypt_cost).await?;
        record.insert("password", Value::from(hashed));
    }

    let fields = FieldFilter::apply(&record)?;
    let derived: Vec<_> = Ownership::Entreprise
        .derived_on_insert(guard.caller_id())
        .into_iter()
        .collect();
    let statement = StatementBuilder::new(&ACCOUNTS_TABLE)
        .insert(&fields, &derived, &ScopeSpec::new())?
        .returning(&ACCOUNTS_TABLE.readable_list());

    let outcome = state.db.execute(&statement).await.map_err(duplicate_email)?;
    tracing::info!(caller = guard.caller_id(), role = %role, "account added");
    Ok(ApiResponse::from_write(outcome, ACCOUNT, WriteKind::Added))
}

/// Role of a tenant account, or 404.
async fn target_role(state: &AppState, guard: &ScopingGuard<'_>, id: i64) -> Result<String, ApiError> {
    let statement = StatementBuilder::new(&ACCOUNTS_TABLE).select(
        &["ID", "role"],
        &guard.row_scope(ACCOUNTS_TABLE.key_equals(id), Ownership::Entreprise),
        None,
    )?;
    let outcome = state.db.execute(&statement).await?;
    outcome
        .first()
        .and_then(|row| row.get("role"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::not_found("Account not found"))
}

/// `"ID"=? AND tenant AND ("ID" = caller OR role = ANY(manageable))`
fn account_scope(guard: &ScopingGuard<'_>, id: i64) -> ScopeSpec {
    guard
        .row_scope(ACCOUNTS_TABLE.key_equals(id), Ownership::Entreprise)
        .and(guard.account_visibility())
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = ACCOUNT_UPDATE.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);

    let current = target_role(&state, &guard, id).await?;
    guard.authorize_target(id, &current)?;
    if let Some(role) = text(&record, "role") {
        guard.authorize_role_grant(&role, Some(&current))?;
    }

    if let Some(password) = text(&record, "password") {
        let hashed = hash_password(&password, config::config().security.bcrypt_cost).await?;
        record.insert("password", Value::from(hashed));
    }

    let fields = FieldFilter::apply(&record)?;
    let statement = StatementBuilder::new(&ACCOUNTS_TABLE).update(&fields, &[], &account_scope(&guard, id))?;

    let outcome = state.db.execute(&statement).await.map_err(duplicate_email)?;
    Ok(ApiResponse::from_write(outcome, ACCOUNT, WriteKind::Updated))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Payload(body): Payload,
) -> ApiResult {
    let mut record = DELETE_BY_ID.validate(&body)?;
    let id = take_id(&mut record, "ID")?;
    let guard = ScopingGuard::new(&identity);

    let current = target_role(&state, &guard, id).await?;
    guard.authorize_target(id, &current)?;

    let statement = StatementBuilder::new(&ACCOUNTS_TABLE).delete(&account_scope(&guard, id))?;
    let outcome = state.db.execute(&statement).await.map_err(still_referenced(IN_USE))?;
    tracing::info!(caller = guard.caller_id(), account = id, "account deleted");
    Ok(ApiResponse::from_write(outcome, ACCOUNT, WriteKind::Deleted))
}

pub async fn get_accounts(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> ApiResult {
    let guard = ScopingGuard::new(&identity);
    let scope = ScopeSpec::new()
        .and(guard.tenant(Ownership::Entreprise))
        .and(guard.account_visibility());
    let statement = StatementBuilder::new(&ACCOUNTS_TABLE).select_readable(&scope, Some(OrderBy::asc("nom")))?;

    let outcome = state.db.execute(&statement).await?;
    Ok(ApiResponse::from_rows(outcome, "Accounts fetched with success"))
}
