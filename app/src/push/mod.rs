//! UnifiedPush wiring: session bus connector, coordinator, and event intake.

pub mod receiver;

use std::sync::Arc;

use tokio::sync::mpsc;
use unifiedpush::dbus::DbusDistributor;
use unifiedpush::{Coordinator, CoordinatorConfig, CoordinatorHandle, PushError, PushEvent};

use crate::app::SharedState;

pub use receiver::{PushReceiver, status_broadcast_loop};

/// Well-known bus name the connector is served under.
pub const SERVICE_NAME: &str = "dev.discordpush.Daemon";
pub const DESCRIPTION: &str = "Discord";
pub const EVENT_CAPACITY: usize = 64;

/// Connect to the session bus and start the registration coordinator.
///
/// Distributor callbacks are delivered to `events`; the returned handle is
/// also installed in `state`.
pub async fn start_registration(
    state: &SharedState,
    events: mpsc::Sender<PushEvent>,
) -> Result<CoordinatorHandle, PushError> {
    let prefs = state.prefs().clone();
    let registry = DbusDistributor::connect(
        SERVICE_NAME,
        DESCRIPTION,
        Arc::new(prefs.clone()),
        events,
    )
    .await?;

    let config = {
        let config = state.config().await;
        CoordinatorConfig {
            instance: prefs.instance_token(),
            retry: config.retry,
            quirks: config.quirks.clone(),
        }
    };

    let handle = Coordinator::spawn(Arc::new(registry), Arc::new(prefs), config);
    state.set_coordinator(handle.clone());
    Ok(handle)
}
