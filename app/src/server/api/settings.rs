//! Settings management API:
//!   GET  /api/settings                     – all settings (secrets masked) + status
//!   PUT  /api/settings                     – bulk update
//!   POST /api/settings/reset               – reset to defaults
//!   GET  /api/settings/status              – setup status only
//!   GET  /api/settings/notification-style
//!   PUT  /api/settings/notification-style

use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiResult, err_json};
use crate::app::SharedState;
use crate::config::{SettingInfo, SettingsManager};
use crate::events;
use crate::notification::types::NotificationStyle;

#[derive(Debug, Default, Deserialize)]
pub struct ResetBody {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StyleBody {
    pub style: String,
}

fn settings_json(all: HashMap<String, SettingInfo>) -> HashMap<String, Value> {
    all.into_iter()
        .map(|(key, info)| {
            let val = json!({
                "key": info.key,
                "value": info.value,
                "type": info.setting_type,
                "required": info.required,
                "description": info.description,
                "has_value": info.has_value,
            });
            (key, val)
        })
        .collect()
}

type Snapshot = (HashMap<String, Value>, Value);

fn snapshot(sm: &SettingsManager) -> Result<Snapshot, (axum::http::StatusCode, Json<Value>)> {
    let all = sm
        .get_all_settings_masked()
        .map_err(|e| err_json(500, &format!("Failed to get settings: {e}")))?;
    let status = sm
        .check_feature_status()
        .map_err(|e| err_json(500, &format!("Failed to check status: {e}")))?;
    Ok((settings_json(all), json!(status)))
}

fn notify_updated(state: &SharedState, count: u32) {
    let payload = events::SettingsUpdatedPayload {
        source: "api".into(),
        count,
    };
    let _ = state
        .ws_sender()
        .send(events::ws_payload(events::SETTINGS_UPDATED, &payload));
}

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    let (settings, status) = snapshot(&sm)?;
    Ok(Json(json!({
        "settings": settings,
        "status": status,
    })))
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(body): Json<HashMap<String, String>>,
) -> ApiResult {
    if body.is_empty() {
        return Err(err_json(400, "No settings provided"));
    }
    let sm = SettingsManager::new(state.db().clone());
    sm.set_settings(&body)
        .map_err(|e| err_json(400, &e.to_string()))?;

    state
        .reload_config()
        .await
        .map_err(|e| err_json(500, &format!("Failed to reload config: {e}")))?;

    let updated = body.len() as u32;
    notify_updated(&state, updated);
    tracing::info!(count = updated, "Settings updated");

    let (settings, status) = snapshot(&sm)?;
    Ok(Json(json!({
        "success": true,
        "status": status,
        "message": format!("Updated {updated} setting(s) successfully"),
        "settings": settings,
    })))
}

/// POST /api/settings/reset
pub async fn reset_settings(
    State(state): State<SharedState>,
    body: Option<Json<ResetBody>>,
) -> ApiResult {
    let keys = body.map(|Json(b)| b.keys).unwrap_or_default();
    let sm = SettingsManager::new(state.db().clone());
    let reset = sm
        .reset_to_defaults(&keys)
        .map_err(|e| err_json(500, &format!("Failed to reset settings: {e}")))?;

    state
        .reload_config()
        .await
        .map_err(|e| err_json(500, &format!("Failed to reload config: {e}")))?;
    notify_updated(&state, reset);

    Ok(Json(json!({
        "success": true,
        "message": format!("Reset {reset} setting(s) to default values"),
    })))
}

/// GET /api/settings/status
pub async fn get_settings_status(State(state): State<SharedState>) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    let status = sm
        .check_feature_status()
        .map_err(|e| err_json(500, &format!("Failed to check status: {e}")))?;
    Ok(Json(json!(status)))
}

/// GET /api/settings/notification-style
pub async fn get_notification_style(State(state): State<SharedState>) -> ApiResult {
    let prefs = state.prefs();
    Ok(Json(json!({
        "style": prefs.notification_style(),
        "chosen": prefs.is_notification_style_set(),
    })))
}

/// PUT /api/settings/notification-style
pub async fn set_notification_style(
    State(state): State<SharedState>,
    Json(body): Json<StyleBody>,
) -> ApiResult {
    let style = match body.style.trim().to_lowercase().as_str() {
        "multi" => NotificationStyle::Multi,
        "hybrid" => NotificationStyle::Hybrid,
        other => return Err(err_json(400, &format!("Unknown notification style: {other}"))),
    };
    state.prefs().set_notification_style(style);
    state
        .reload_config()
        .await
        .map_err(|e| err_json(500, &format!("Failed to reload config: {e}")))?;
    tracing::info!(style = style.as_str(), "Notification style chosen");

    Ok(Json(json!({ "success": true, "style": style, "chosen": true })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::app::test_support;

    #[tokio::test]
    async fn get_masks_secrets() {
        let (state, _) = test_support::state();
        let keys = unifiedpush::VapidKeyPair::generate().unwrap();
        unifiedpush::RegistrationStore::save_vapid_keys(state.prefs(), &keys);

        let Json(body) = get_settings(State(state)).await.unwrap();
        assert_eq!(body["settings"]["vapid_private_key"]["value"], "********");
        assert_eq!(body["settings"]["vapid_public_key"]["value"], keys.public_key());
    }

    #[tokio::test]
    async fn update_validates_and_reloads() {
        let (state, _) = test_support::state();
        let mut ws = state.subscribe_ws();
        let body = HashMap::from([("retry_max_attempts".to_string(), "7".to_string())]);

        let Json(resp) = update_settings(State(state.clone()), Json(body))
            .await
            .unwrap();
        assert_eq!(resp["success"], true);
        assert_eq!(state.config().await.retry.max_attempts, 7);
        assert!(ws.try_recv().unwrap().contains("settings_updated"));

        let bad = HashMap::from([("retry_max_attempts".to_string(), "0".to_string())]);
        let (code, _) = update_settings(State(state.clone()), Json(bad))
            .await
            .unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(state.config().await.retry.max_attempts, 7);
    }

    #[derive(Default)]
    struct NextPushOnly {
        unregisters: std::sync::atomic::AtomicUsize,
        registers: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl unifiedpush::DistributorRegistry for NextPushOnly {
        async fn distributors(&self) -> Result<Vec<String>, unifiedpush::PushError> {
            Ok(vec!["org.unifiedpush.Distributor.nextpush".into()])
        }

        async fn saved_distributor(&self) -> Option<String> {
            None
        }

        async fn save_distributor(&self, _d: Option<&str>) -> Result<(), unifiedpush::PushError> {
            Ok(())
        }

        async fn register(&self, _i: &str, _v: Option<&str>) -> Result<(), unifiedpush::PushError> {
            self.registers.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        async fn unregister(&self, _i: &str) -> Result<(), unifiedpush::PushError> {
            self.unregisters.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn update_reaches_running_coordinator() {
        use std::sync::atomic::Ordering;
        use unifiedpush::{Coordinator, CoordinatorConfig, RegistrationState};

        let (state, _) = test_support::state();
        let registry = std::sync::Arc::new(NextPushOnly::default());
        let handle = Coordinator::spawn(
            registry.clone(),
            std::sync::Arc::new(state.prefs().clone()),
            CoordinatorConfig::new("instance-1"),
        );
        state.set_coordinator(handle.clone());

        let body = HashMap::from([("distributor_quirks".to_string(), "[]".to_string())]);
        update_settings(State(state.clone()), Json(body))
            .await
            .unwrap();

        handle.register().await.unwrap();
        handle
            .subscribe()
            .wait_for(|s| matches!(s.state, RegistrationState::Registering { .. }))
            .await
            .unwrap();
        assert_eq!(registry.registers.load(Ordering::SeqCst), 1);
        assert_eq!(registry.unregisters.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let (state, _) = test_support::state();
        let body = HashMap::from([("retry_max_attempts".to_string(), "9".to_string())]);
        update_settings(State(state.clone()), Json(body))
            .await
            .unwrap();

        reset_settings(
            State(state.clone()),
            Some(Json(ResetBody {
                keys: vec!["retry_max_attempts".into()],
            })),
        )
        .await
        .unwrap();
        assert_eq!(state.config().await.retry.max_attempts, 5);
    }

    #[tokio::test]
    async fn style_prompt() {
        let (state, _) = test_support::state();
        let Json(body) = get_notification_style(State(state.clone())).await.unwrap();
        assert_eq!(body["style"], "hybrid");
        assert_eq!(body["chosen"], false);

        set_notification_style(
            State(state.clone()),
            Json(StyleBody {
                style: "multi".into(),
            }),
        )
        .await
        .unwrap();
        let Json(body) = get_notification_style(State(state.clone())).await.unwrap();
        assert_eq!(body["style"], "multi");
        assert_eq!(body["chosen"], true);

        let (code, _) = set_notification_style(
            State(state),
            Json(StyleBody {
                style: "single".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }
}
