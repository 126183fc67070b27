pub mod api;
pub mod router;
pub mod websocket;

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Result;

use crate::app::SharedState;

/// Start the local HTTP + WebSocket server used by the shell and setup screen.
pub async fn start_server(state: SharedState) -> Result<()> {
    let port = state.server_port();
    let shutdown_token = state.shutdown_token().clone();
    let app = router::create_router(state);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Local API listening on http://{addr}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;

    Ok(())
}
