//! Request handlers.
//!
//! `crud` serves every table described in [`crate::resources`]; the other
//! modules hold the flows that do not fit a single-table write.

pub mod accounts;
pub mod crud;
pub mod entreprise;
pub mod equipment;
pub mod staff;
pub mod system;
pub mod transport;

use serde_json::Value;

use crate::database::{DatabaseError, Transaction};
use crate::error::ApiError;
use crate::statement::Record;
use crate::validation::ValidationError;

/// Commit on success, roll back on any error. A failed rollback is logged and
/// the original error is returned.
pub(crate) async fn finish<T>(tx: Box<dyn Transaction>, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Remove an integer field that validation already required.
pub(crate) fn take_id(record: &mut Record, field: &str) -> Result<i64, ApiError> {
    record
        .remove(field)
        .as_ref()
        .and_then(Value::as_i64)
        .ok_or_else(|| ValidationError::field(field, "This field is required").into())
}

/// Remove an id list field, e.g. `IDs`.
pub(crate) fn take_ids(record: &mut Record, field: &str) -> Result<Vec<i64>, ApiError> {
    let ids: Option<Vec<i64>> = record
        .remove(field)
        .as_ref()
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect());

    match ids {
        Some(ids) if !ids.is_empty() => Ok(ids),
        _ => Err(ValidationError::field(field, "Must be a non-empty list of ids").into()),
    }
}

/// Foreign-key violations on delete become a 400 with a resource specific
/// message; everything else keeps the default mapping.
pub(crate) fn still_referenced(message: &'static str) -> impl FnOnce(DatabaseError) -> ApiError {
    move |err| match err {
        DatabaseError::ForeignKeyViolation { constraint } => {
            tracing::debug!("Delete blocked by {}", constraint);
            ApiError::bad_request(message)
        }
        other => other.into(),
    }
}
