// handlers/health.rs - GET /health datastore reachability probe

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::Database;

pub async fn health_get() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match Database::health_check().await {
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
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
