//! UnifiedPush client library.
//!
//! Provides the push event model, endpoint validation, VAPID key handling,
//! the distributor registry seam with a D-Bus implementation, and the
//! registration coordinator that picks a distributor, registers, and
//! recovers from failures.

pub mod coordinator;
pub mod dbus;
pub mod distributor;
pub mod endpoint;
pub mod event;
pub mod quirks;
pub mod vapid;

pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, FailureKind, RegistrationState,
    RegistrationStatus, RetryPolicy,
};
pub use distributor::{DistributorRegistry, RegistrationStore};
pub use event::{FailedReason, PushEvent, WebPushKeys};
pub use quirks::{Quirk, QuirkTable};
pub use vapid::VapidKeyPair;

/// Unified error type for the unifiedpush crate.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("D-Bus request failed: {0}")]
    DbusFdo(#[from] zbus::fdo::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No distributor selected, user selection required")]
    SelectionRequired,

    #[error("Distributor not installed: {0}")]
    DistributorNotFound(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid quirk table: {0}")]
    InvalidQuirks(String),

    #[error("Registration coordinator stopped")]
    CoordinatorStopped,
}
