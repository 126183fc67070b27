//! Seams between the coordinator and the outside world.

use async_trait::async_trait;

use crate::PushError;
use crate::event::WebPushKeys;
use crate::vapid::VapidKeyPair;

/// Call-through to the platform's distributor framework.
///
/// Registration outcomes never come back as return values; they arrive
/// later as [`crate::PushEvent`]s.
#[async_trait]
pub trait DistributorRegistry: Send + Sync {
    /// Installed distributors, in a stable order.
    async fn distributors(&self) -> Result<Vec<String>, PushError>;

    async fn saved_distributor(&self) -> Option<String>;

    /// Save (or with `None`, clear) the selected distributor.
    async fn save_distributor(&self, distributor: Option<&str>) -> Result<(), PushError>;

    /// Start a registration with the saved distributor.
    ///
    /// Returns [`PushError::SelectionRequired`] when nothing is saved and
    /// the platform cannot ask the user itself.
    async fn register(&self, instance: &str, vapid: Option<&str>) -> Result<(), PushError>;

    async fn unregister(&self, instance: &str) -> Result<(), PushError>;

    /// Whether `register` can hand a VAPID key to the distributor.
    fn supports_vapid(&self) -> bool {
        true
    }
}

/// Persistent registration state owned by the application.
pub trait RegistrationStore: Send + Sync {
    fn current_distributor(&self) -> Option<String>;
    fn set_current_distributor(&self, distributor: Option<&str>);

    fn endpoint(&self) -> Option<String>;
    fn set_endpoint(&self, endpoint: Option<&str>);

    fn vapid_enabled(&self) -> bool;
    fn vapid_keys(&self) -> Option<VapidKeyPair>;
    fn save_vapid_keys(&self, keys: &VapidKeyPair);

    fn save_webpush_keys(&self, keys: &WebPushKeys);
}
