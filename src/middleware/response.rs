use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::QueryOutcome;

/// Wrapper for API responses that adds the `{success, message, data?}` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize = Value> {
    pub message: String,
    pub data: Option<T>,
    pub status_code: Option<StatusCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Added,
    Updated,
    Deleted,
}

impl WriteKind {
    pub fn verb(&self) -> &'static str {
        match self {
            WriteKind::Added => "added",
            WriteKind::Updated => "updated",
            WriteKind::Deleted => "deleted",
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: Some(StatusCode::CREATED),
            ..Self::success(message, data)
        }
    }
}

impl ApiResponse<Value> {
    /// Message only, no `data` key.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status_code: None,
        }
    }

    pub fn from_rows(outcome: QueryOutcome, message: impl Into<String>) -> Self {
        Self::success(message, outcome.rows_value())
    }

    /// Map a write result. Zero affected rows is still a success, reported
    /// with a message that says nothing changed.
    pub fn from_write(outcome: QueryOutcome, label: &str, kind: WriteKind) -> Self {
        if outcome.row_count == 0 {
            return Self::message(format!(
                "No {} matched; nothing was {}",
                label.to_lowercase(),
                kind.verb()
            ));
        }

        let message = format!("{} {} with success", label, kind.verb());
        let response = if outcome.rows.is_empty() {
            Self::message(message)
        } else {
            Self::success(message, outcome.rows_value())
        };

        match kind {
            WriteKind::Added => Self {
                status_code: Some(StatusCode::CREATED),
                ..response
            },
            _ => response,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let mut envelope = json!({
            "success": true,
            "message": self.message,
        });

        if let Some(data) = self.data {
            // Convert data to JSON Value for consistent envelope format
            match serde_json::to_value(&data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T = Value> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn row(id: i64) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("ID".to_string(), json!(id));
        map
    }

    #[test]
    fn zero_rows_is_success_with_distinct_message() {
        let response = ApiResponse::from_write(QueryOutcome::affected(0), "Accommodation", WriteKind::Updated);
        assert_eq!(response.message, "No accommodation matched; nothing was updated");
        assert!(response.data.is_none());
        assert_eq!(response.status_code, None);
    }

    #[test]
    fn successful_write_carries_returned_rows() {
        let response = ApiResponse::from_write(
            QueryOutcome::with_rows(vec![row(3)]),
            "Accommodation",
            WriteKind::Added,
        );
        assert_eq!(response.message, "Accommodation added with success");
        assert_eq!(response.data, Some(json!([{"ID": 3}])));
        assert_eq!(response.status_code, Some(StatusCode::CREATED));
    }

    #[test]
    fn delete_without_rows_has_no_data() {
        let response = ApiResponse::from_write(QueryOutcome::affected(2), "Car", WriteKind::Deleted);
        assert_eq!(response.message, "Car deleted with success");
        assert!(response.data.is_none());
    }
}
