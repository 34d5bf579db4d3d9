// handlers/system.rs - GET / and GET /health (public)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Event Manager API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant event management backend",
            "endpoints": {
                "health": "/health (public)",
                "session": "/api/logIn, /api/logOut (public)",
                "resources": "/api/add<Entity>, /api/update<Entity>, /api/delete<Entity>, /api/getAll<Entity>s (session cookie)",
                "equipment": "/api/reserveEquipment, /api/unreserveEquipment (session cookie)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
