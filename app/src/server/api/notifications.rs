use axum::Json;
use axum::extract::State;
use serde_json::json;

use super::{ApiResult, err_json};
use crate::app::SharedState;

/// POST /api/notifications/test
pub async fn send_test(State(state): State<SharedState>) -> ApiResult {
    match state.presenter().present_test() {
        Some(id) => Ok(Json(json!({ "success": true, "id": id }))),
        None => Err(err_json(500, "Failed to show test notification")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support;

    #[tokio::test]
    async fn test_notification_is_shown() {
        let (state, sink) = test_support::state();
        let Json(body) = send_test(State(state)).await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(sink.shown.lock().unwrap().len(), 1);
    }
}
