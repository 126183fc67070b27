//! notiforward: relays Discord desktop notifications from the session bus
//! to a UnifiedPush endpoint, where the daemon on the phone side picks them
//! up as push messages.

pub mod config;
pub mod dedup;
pub mod monitor;
pub mod sender;

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub use config::{ForwardConfig, Format};
use dedup::Deduplicator;
use monitor::{BlockParser, MATCH_RULE, NotifyCall};
use sender::Sender;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("dbus-monitor exited")]
    MonitorExited,
}

/// Watch `Notify` calls until shutdown. Fails when `dbus-monitor` ends.
pub async fn run(config: &ForwardConfig, shutdown: CancellationToken) -> Result<(), ForwardError> {
    let sender = Sender::new(config)?;
    tracing::info!(endpoint = %config.endpoint, app_match = %config.app_match, "Starting dbus-monitor");

    let mut child = Command::new("dbus-monitor")
        .arg(MATCH_RULE)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    let stdout = child.stdout.take().ok_or(ForwardError::MonitorExited)?;
    let mut lines = BufReader::new(stdout).lines();

    let mut parser = BlockParser::default();
    let mut dedup = Deduplicator::default();
    tracing::info!("Listening for notifications");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("notiforward stopped");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::error!("dbus-monitor process ended unexpectedly");
                    return Err(ForwardError::MonitorExited);
                };
                tracing::trace!(line = %line, "monitor");
                if let Some(block) = parser.push_line(&line) {
                    forward_block(&block, config, &mut dedup, &sender).await;
                }
            }
        }
    }
}

async fn forward_block(
    block: &str,
    config: &ForwardConfig,
    dedup: &mut Deduplicator,
    sender: &Sender,
) {
    if !block.contains(&config.app_match) {
        return;
    }
    let call = NotifyCall::parse(block);
    let content = call.content();
    tracing::info!(app = %call.app_name, "Matched notification");

    if !dedup.check(content) {
        tracing::info!("Skipping duplicate notification");
        return;
    }
    let title = if call.body.trim().is_empty() { "" } else { call.summary.as_str() };
    if let Err(e) = sender.send(title, content).await {
        tracing::error!("Failed to send notification: {e}");
    }
}

/// systemd user unit running `exe run`.
pub fn service_unit(exe: &Path, runtime_dir: &str) -> String {
    format!(
        "[Unit]
Description=Notiforward Discord Notification Forwarder
After=network.target graphical-session.target

[Service]
Type=simple
ExecStart={exe} run
Restart=on-failure
RestartSec=10
Environment=DBUS_SESSION_BUS_ADDRESS=unix:path={runtime_dir}/bus

[Install]
WantedBy=default.target
",
        exe = exe.display(),
    )
}
