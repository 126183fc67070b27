//! UnifiedPush over the D-Bus session bus.
//!
//! Distributors own a well-known name starting with
//! `org.unifiedpush.Distributor.` and expose `org.unifiedpush.Distributor1`.
//! The application serves `org.unifiedpush.Connector1` under its own name so
//! the distributor can call back with endpoints and messages.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use zbus::{Connection, fdo::DBusProxy, interface, proxy};

use crate::PushError;
use crate::distributor::DistributorRegistry;
use crate::event::{FailedReason, PushEvent};

pub const DISTRIBUTOR_PREFIX: &str = "org.unifiedpush.Distributor.";
pub const CONNECTOR_PATH: &str = "/org/unifiedpush/Connector";

const REGISTRATION_SUCCEEDED: &str = "REGISTRATION_SUCCEEDED";

#[proxy(
    interface = "org.unifiedpush.Distributor1",
    default_path = "/org/unifiedpush/Distributor",
    gen_blocking = false
)]
trait Distributor1 {
    fn register(
        &self,
        service_name: &str,
        token: &str,
        description: &str,
    ) -> zbus::Result<(String, String)>;

    fn unregister(&self, token: &str) -> zbus::Result<()>;
}

/// Where the adapter keeps the user's distributor choice.
pub trait SelectionStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, distributor: Option<&str>);
}

/// Receives distributor callbacks and turns them into [`PushEvent`]s.
struct Connector {
    events: mpsc::Sender<PushEvent>,
}

impl Connector {
    async fn forward(&self, event: PushEvent) {
        let kind = event.kind();
        if self.events.send(event).await.is_err() {
            tracing::warn!(kind, "Push event dropped, receiver closed");
        }
    }
}

#[interface(name = "org.unifiedpush.Connector1")]
impl Connector {
    async fn message(&self, token: String, message: Vec<u8>, id: String) {
        tracing::debug!(id = %id, bytes = message.len(), "Push message received");
        self.forward(PushEvent::Message {
            instance: token,
            payload: message,
        })
        .await;
    }

    async fn new_endpoint(&self, token: String, endpoint: String) {
        self.forward(PushEvent::NewEndpoint {
            instance: token,
            endpoint,
            keys: None,
        })
        .await;
    }

    async fn unregistered(&self, token: String) {
        self.forward(PushEvent::Unregistered { instance: token }).await;
    }
}

/// Bus names that belong to distributors, deduplicated and sorted.
fn distributor_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name.starts_with(DISTRIBUTOR_PREFIX) && name.len() > DISTRIBUTOR_PREFIX.len())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct DbusDistributor {
    conn: Connection,
    service_name: String,
    description: String,
    selection: Arc<dyn SelectionStore>,
    events: mpsc::Sender<PushEvent>,
}

impl DbusDistributor {
    /// Claim `service_name` on the session bus and serve the connector.
    pub async fn connect(
        service_name: &str,
        description: &str,
        selection: Arc<dyn SelectionStore>,
        events: mpsc::Sender<PushEvent>,
    ) -> Result<Self, PushError> {
        let connector = Connector {
            events: events.clone(),
        };
        let conn = zbus::connection::Builder::session()?
            .name(service_name.to_string())?
            .serve_at(CONNECTOR_PATH, connector)?
            .build()
            .await?;

        tracing::info!(service_name, path = CONNECTOR_PATH, "UnifiedPush connector ready");

        Ok(Self {
            conn,
            service_name: service_name.to_string(),
            description: description.to_string(),
            selection,
            events,
        })
    }

    async fn distributor_proxy(&self, name: &str) -> Result<Distributor1Proxy<'_>, PushError> {
        let proxy = Distributor1Proxy::builder(&self.conn)
            .destination(name.to_string())?
            .build()
            .await?;
        Ok(proxy)
    }
}

#[async_trait]
impl DistributorRegistry for DbusDistributor {
    async fn distributors(&self) -> Result<Vec<String>, PushError> {
        let dbus = DBusProxy::new(&self.conn).await?;
        let running = dbus.list_names().await?;
        let activatable = dbus.list_activatable_names().await?;
        Ok(distributor_names(
            running
                .iter()
                .chain(activatable.iter())
                .map(|name| name.as_str()),
        ))
    }

    async fn saved_distributor(&self) -> Option<String> {
        self.selection.load()
    }

    async fn save_distributor(&self, distributor: Option<&str>) -> Result<(), PushError> {
        self.selection.save(distributor);
        Ok(())
    }

    async fn register(&self, instance: &str, vapid: Option<&str>) -> Result<(), PushError> {
        let Some(distributor) = self.selection.load() else {
            return Err(PushError::SelectionRequired);
        };
        if vapid.is_some() {
            tracing::warn!(distributor = %distributor, "Distributor1 has no VAPID argument, key not forwarded");
        }

        let proxy = self.distributor_proxy(&distributor).await?;
        let (result, reason) = proxy
            .register(&self.service_name, instance, &self.description)
            .await?;

        if result != REGISTRATION_SUCCEEDED {
            tracing::warn!(distributor = %distributor, result = %result, reason = %reason, "Distributor refused registration");
            let event = PushEvent::RegistrationFailed {
                instance: instance.to_string(),
                reason: FailedReason::parse(&reason),
            };
            if self.events.try_send(event).is_err() {
                tracing::warn!("Could not queue registration failure event");
            }
        }
        Ok(())
    }

    async fn unregister(&self, instance: &str) -> Result<(), PushError> {
        let Some(distributor) = self.selection.load() else {
            return Ok(());
        };
        let proxy = self.distributor_proxy(&distributor).await?;
        proxy.unregister(instance).await?;
        Ok(())
    }

    fn supports_vapid(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_distributor_names_are_listed() {
        let names = distributor_names([
            "org.freedesktop.DBus",
            "org.unifiedpush.Distributor.ntfy",
            ":1.42",
            "org.unifiedpush.Distributor.kde",
            "org.unifiedpush.Distributor.ntfy",
            "org.unifiedpush.Distributor.",
        ]);
        assert_eq!(
            names,
            vec![
                "org.unifiedpush.Distributor.kde".to_string(),
                "org.unifiedpush.Distributor.ntfy".to_string(),
            ]
        );
    }
}
