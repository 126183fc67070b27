//! Log viewing API backed by the in-memory capture layer.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;

use super::{ApiResult, err_json};
use crate::app::SharedState;
use crate::services::log_buffer;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
    pub level: Option<String>,
}

/// GET /api/logs
pub async fn get_logs(State(_state): State<SharedState>, Query(q): Query<LogQuery>) -> ApiResult {
    let limit = q.limit.unwrap_or(100);
    let level = match q.level.as_deref() {
        Some(raw) => Some(
            log_buffer::parse_level(raw)
                .ok_or_else(|| err_json(400, &format!("Unknown log level: {raw}")))?,
        ),
        None => None,
    };
    let logs = log_buffer::recent(limit, level);
    Ok(Json(json!({
        "count": logs.len(),
        "logs": logs,
        "limit": limit,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

/// POST /api/logs/clear
pub async fn clear_logs(State(_state): State<SharedState>) -> ApiResult {
    let cleared = log_buffer::clear();
    Ok(Json(json!({ "status": "ok", "cleared": cleared })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::app::test_support;

    #[tokio::test]
    async fn logs_round_trip() {
        let _guard = log_buffer::TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let (state, _) = test_support::state();
        log_buffer::clear();
        log_buffer::push_for_test("info", "hello");

        let Json(body) = get_logs(State(state.clone()), Query(LogQuery::default()))
            .await
            .unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["logs"][0]["message"], "hello");

        let Json(body) = clear_logs(State(state)).await.unwrap();
        assert_eq!(body["cleared"], 1);
    }

    #[tokio::test]
    async fn bad_level_is_rejected() {
        let (state, _) = test_support::state();
        let query = LogQuery {
            limit: None,
            level: Some("loud".into()),
        };
        let (code, _) = get_logs(State(state), Query(query)).await.unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }
}
