//! Routes distributor callbacks.
//!
//! Messages go through decode and present; everything else belongs to the
//! coordinator.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use unifiedpush::{CoordinatorHandle, PushEvent, RegistrationStatus};

use crate::events;
use crate::notification::NotificationPresenter;
use crate::notification::decoder::decode;

pub struct PushReceiver {
    instance: String,
    coordinator: CoordinatorHandle,
    presenter: Arc<NotificationPresenter>,
}

impl PushReceiver {
    pub fn new(
        instance: impl Into<String>,
        coordinator: CoordinatorHandle,
        presenter: Arc<NotificationPresenter>,
    ) -> Self {
        Self {
            instance: instance.into(),
            coordinator,
            presenter,
        }
    }

    /// Handle one event. Returns the notification id when a message was shown.
    pub async fn handle_event(&self, event: PushEvent) -> Option<u32> {
        match event {
            PushEvent::Message { instance, payload } => {
                if instance != self.instance {
                    tracing::debug!(instance = %instance, "Message for another instance ignored");
                    return None;
                }
                let message = decode(&payload);
                tracing::info!(
                    title = %message.title,
                    channel_id = %message.channel_id,
                    "Push message decoded"
                );
                self.presenter.present(&message)
            }
            other => {
                let kind = other.kind();
                if let Err(e) = self.coordinator.dispatch(other).await {
                    tracing::error!(kind, "Failed to forward push event: {e}");
                }
                None
            }
        }
    }

    pub async fn run(self, mut events: mpsc::Receiver<PushEvent>, shutdown: CancellationToken) {
        tracing::info!(instance = %self.instance, "Push receiver started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => break,
                },
            }
        }
        tracing::info!("Push receiver stopped");
    }
}

/// Publish every registration status change on the WebSocket.
pub async fn status_broadcast_loop(
    mut status: watch::Receiver<RegistrationStatus>,
    ws_tx: broadcast::Sender<String>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = status.borrow_and_update().clone();
                let _ = ws_tx.send(events::ws_payload(events::REGISTRATION_STATUS, &snapshot));
            }
        }
    }
    tracing::debug!("Registration status broadcast stopped");
}
