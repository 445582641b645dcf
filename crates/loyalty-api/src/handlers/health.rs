//! 健康检查

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::state::AppState;

/// 存活与数据库连通性
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (healthy, database) = match &state.database {
        Some(db) => match db.ping().await {
            Ok(latency) => (
                true,
                json!({
                    "status": "ok",
                    "latency_ms": latency.as_millis() as u64,
                    "pool": db.stats(),
                }),
            ),
            Err(e) => {
                warn!(error = %e, "数据库健康检查失败");
                (false, json!({ "status": "fail", "pool": db.stats() }))
            }
        },
        None => (true, json!({ "status": "skipped" })),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "service": "loyalty-api",
            "checks": { "database": database }
        })),
    )
}
