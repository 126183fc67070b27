use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use super::{api, websocket};
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/ws", get(websocket::ws_handler))
        // --- Push registration ---
        .route("/api/push/status", get(api::push::get_status))
        .route("/api/push/register", post(api::push::register))
        .route("/api/push/distributor", post(api::push::select_distributor))
        .route("/api/push/unregister", post(api::push::unregister))
        // --- Settings ---
        .route(
            "/api/settings",
            get(api::settings::get_settings).put(api::settings::update_settings),
        )
        .route("/api/settings/reset", post(api::settings::reset_settings))
        .route("/api/settings/status", get(api::settings::get_settings_status))
        .route(
            "/api/settings/notification-style",
            get(api::settings::get_notification_style).put(api::settings::set_notification_style),
        )
        // --- Setup screen ---
        .route("/api/setup", get(api::setup::get_setup))
        .route("/api/setup/complete", post(api::setup::complete_setup))
        // --- Shell lifecycle ---
        .route("/api/lifecycle/started", post(api::lifecycle::activity_started))
        .route("/api/lifecycle/stopped", post(api::lifecycle::activity_stopped))
        .route("/api/lifecycle", get(api::lifecycle::get_lifecycle))
        // --- Notifications ---
        .route("/api/notifications/test", post(api::notifications::send_test))
        // --- Logs ---
        .route("/api/logs", get(api::logs::get_logs))
        .route("/api/logs/clear", post(api::logs::clear_logs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
