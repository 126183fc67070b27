//! Discord push daemon: UnifiedPush registration, message decoding, and
//! desktop notifications for a Discord WebView shell.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod events;
pub mod forward;
pub mod lifecycle;
pub mod notification;
pub mod push;
pub mod server;
pub mod services;
pub mod shutdown;

pub use bootstrap::{init_foundation, init_tracing};
