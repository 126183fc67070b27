//! Activity lifecycle reported by the WebView shell.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use super::ApiResult;
use crate::app::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct StoppedBody {
    #[serde(default)]
    pub changing_configurations: bool,
}

/// POST /api/lifecycle/started
pub async fn activity_started(State(state): State<SharedState>) -> ApiResult {
    state.foreground().activity_started();
    Ok(Json(lifecycle_json(&state)))
}

/// POST /api/lifecycle/stopped
pub async fn activity_stopped(
    State(state): State<SharedState>,
    body: Option<Json<StoppedBody>>,
) -> ApiResult {
    let changing = body.map(|Json(b)| b.changing_configurations).unwrap_or(false);
    state.foreground().activity_stopped(changing);
    Ok(Json(lifecycle_json(&state)))
}

/// GET /api/lifecycle
pub async fn get_lifecycle(State(state): State<SharedState>) -> ApiResult {
    Ok(Json(lifecycle_json(&state)))
}

fn lifecycle_json(state: &SharedState) -> serde_json::Value {
    let tracker = state.foreground();
    json!({
        "foreground": tracker.is_in_foreground(),
        "started": tracker.started_count(),
    })
}
