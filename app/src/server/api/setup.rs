//! First-launch setup screen backing.

use axum::Json;
use axum::extract::State;
use serde_json::json;

use super::ApiResult;
use crate::app::SharedState;

/// GET /api/setup
pub async fn get_setup(State(state): State<SharedState>) -> ApiResult {
    let prefs = state.prefs();
    let status = state.coordinator().map(|c| c.status());
    Ok(Json(json!({
        "first_launch": prefs.is_first_launch(),
        "style_chosen": prefs.is_notification_style_set(),
        "push_available": status.is_some(),
        "registration": status,
    })))
}

/// POST /api/setup/complete
pub async fn complete_setup(State(state): State<SharedState>) -> ApiResult {
    state.prefs().set_first_launch_complete();
    tracing::info!("First-launch setup completed");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support;

    #[tokio::test]
    async fn first_launch_until_completed() {
        let (state, _) = test_support::state();
        let Json(body) = get_setup(State(state.clone())).await.unwrap();
        assert_eq!(body["first_launch"], true);
        assert_eq!(body["push_available"], false);

        complete_setup(State(state.clone())).await.unwrap();
        let Json(body) = get_setup(State(state)).await.unwrap();
        assert_eq!(body["first_launch"], false);
    }
}
