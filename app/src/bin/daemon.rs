//! Push daemon: UnifiedPush registration over the session bus, desktop
//! notifications, and the local API used by the WebView shell.

use tokio::sync::mpsc;

use discord_push_lib::app::SharedState;
use discord_push_lib::push::{self, PushReceiver};
use discord_push_lib::{server, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    discord_push_lib::init_tracing();
    tracing::info!("Starting Discord push daemon");

    let (db, config, dir) = discord_push_lib::init_foundation()?;
    let state = SharedState::new(db, config, dir);
    state.presenter().ensure_channel();

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let (events_tx, events_rx) = mpsc::channel(push::EVENT_CAPACITY);
    match push::start_registration(&state, events_tx).await {
        Ok(coordinator) => {
            let receiver = PushReceiver::new(
                state.prefs().instance_token(),
                coordinator.clone(),
                state.presenter().clone(),
            );
            let token = state.shutdown_token().clone();
            tokio::spawn(receiver.run(events_rx, token));

            tokio::spawn(push::status_broadcast_loop(
                coordinator.subscribe(),
                state.ws_sender().clone(),
                state.shutdown_token().clone(),
            ));

            if let Err(e) = coordinator.register().await {
                tracing::error!("Failed to start registration: {e}");
            }
        }
        Err(e) => {
            tracing::error!("Push registration unavailable: {e}");
        }
    }

    tracing::info!(
        port = state.server_port(),
        "Daemon running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    shutdown::graceful_shutdown(&state).await;
    if let Err(e) = server_handle.await {
        tracing::warn!("Server task ended abnormally: {e}");
    }
    Ok(())
}
