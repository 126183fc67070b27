//! Push registration API:
//!   GET  /api/push/status       – registration status + instance
//!   POST /api/push/register     – manual retry
//!   POST /api/push/distributor  – distributor chosen by the user
//!   POST /api/push/unregister

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;
use unifiedpush::{
    CoordinatorHandle, PushError, RegistrationState, RegistrationStatus, RegistrationStore,
};

use super::{ApiResult, err_json};
use crate::app::SharedState;

#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub name: String,
}

type ApiError = (axum::http::StatusCode, Json<serde_json::Value>);

fn coordinator(state: &SharedState) -> Result<&CoordinatorHandle, ApiError> {
    state
        .coordinator()
        .ok_or_else(|| err_json(503, "Push registration is unavailable (no session bus)"))
}

fn map_push_error(e: PushError) -> ApiError {
    match e {
        PushError::CoordinatorStopped => err_json(503, &e.to_string()),
        PushError::DistributorNotFound(_) => err_json(404, &e.to_string()),
        other => err_json(500, &other.to_string()),
    }
}

/// Status as last persisted, for when no coordinator is running.
fn stored_status(state: &SharedState) -> RegistrationStatus {
    let prefs = state.prefs();
    let endpoint = prefs.endpoint();
    RegistrationStatus {
        state: match &endpoint {
            Some(endpoint) => RegistrationState::Registered {
                endpoint: endpoint.clone(),
            },
            None => RegistrationState::Unregistered,
        },
        endpoint,
        distributor: prefs.current_distributor(),
        distributors: Vec::new(),
    }
}

/// GET /api/push/status
pub async fn get_status(State(state): State<SharedState>) -> ApiResult {
    let (available, status) = match state.coordinator() {
        Some(coordinator) => (true, coordinator.status()),
        None => (false, stored_status(&state)),
    };
    Ok(Json(json!({
        "available": available,
        "instance": state.prefs().instance_token(),
        "status": status,
    })))
}

/// POST /api/push/register
pub async fn register(State(state): State<SharedState>) -> ApiResult {
    coordinator(&state)?
        .register()
        .await
        .map_err(map_push_error)?;
    tracing::info!("Manual registration requested");
    Ok(Json(json!({ "success": true })))
}

/// POST /api/push/distributor
pub async fn select_distributor(
    State(state): State<SharedState>,
    Json(body): Json<SelectBody>,
) -> ApiResult {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(err_json(400, "Distributor name is required"));
    }
    coordinator(&state)?
        .select(name)
        .await
        .map_err(map_push_error)?;
    Ok(Json(json!({ "success": true, "distributor": name })))
}

/// POST /api/push/unregister
pub async fn unregister(State(state): State<SharedState>) -> ApiResult {
    coordinator(&state)?
        .unregister()
        .await
        .map_err(map_push_error)?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::app::test_support;

    #[tokio::test]
    async fn status_without_coordinator_uses_stored_endpoint() {
        let (state, _) = test_support::state();
        state.prefs().set_endpoint(Some("https://ntfy.sh/upA"));

        let Json(body) = get_status(State(state)).await.unwrap();
        assert_eq!(body["available"], false);
        assert_eq!(body["status"]["state"]["state"], "registered");
        assert_eq!(body["status"]["endpoint"], "https://ntfy.sh/upA");
        assert!(!body["instance"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn actions_need_a_coordinator() {
        let (state, _) = test_support::state();
        let (code, Json(body)) = register(State(state.clone())).await.unwrap_err();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");

        let (code, _) = unregister(State(state)).await.unwrap_err();
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn blank_distributor_is_rejected() {
        let (state, _) = test_support::state();
        let (code, _) = select_distributor(
            State(state),
            Json(SelectBody {
                name: "  ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }
}
