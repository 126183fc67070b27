use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use prefs_db::Database;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use unifiedpush::CoordinatorHandle;

use crate::config::{AppConfig, Preferences, SettingsManager};
use crate::lifecycle::ForegroundTracker;
use crate::notification::{self, NotificationPresenter, NotificationSink};

/// Application shared state accessible from the daemon tasks and axum handlers.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Broadcast channel for WebSocket messages
    ws_tx: broadcast::Sender<String>,
    /// Application configuration (reloadable)
    config: RwLock<AppConfig>,
    db: Database,
    prefs: Preferences,
    data_dir: PathBuf,
    shutdown_token: CancellationToken,
    foreground: Arc<ForegroundTracker>,
    presenter: Arc<NotificationPresenter>,
    /// Set once the session bus connection is up.
    coordinator: OnceLock<CoordinatorHandle>,
}

impl SharedState {
    /// Create shared state from an already-opened database and loaded config.
    pub fn new(db: Database, config: AppConfig, data_dir: PathBuf) -> Self {
        Self::with_sink(db, config, data_dir, notification::default_sink)
    }

    /// Like [`SharedState::new`] with a caller-chosen notification sink.
    pub fn with_sink(
        db: Database,
        config: AppConfig,
        data_dir: PathBuf,
        make_sink: impl FnOnce(broadcast::Sender<String>) -> Arc<dyn NotificationSink>,
    ) -> Self {
        let (ws_tx, _) = broadcast::channel(256);
        let prefs = Preferences::new(db.clone());
        let foreground = Arc::new(ForegroundTracker::new());
        let presenter = Arc::new(NotificationPresenter::new(
            prefs.clone(),
            foreground.clone(),
            make_sink(ws_tx.clone()),
        ));

        Self {
            inner: Arc::new(SharedStateInner {
                ws_tx,
                config: RwLock::new(config),
                db,
                prefs,
                data_dir,
                shutdown_token: CancellationToken::new(),
                foreground,
                presenter,
                coordinator: OnceLock::new(),
            }),
        }
    }

    pub fn server_port(&self) -> u16 {
        self.inner
            .config
            .try_read()
            .map(|c| c.server_port)
            .unwrap_or(AppConfig::default().server_port)
    }

    pub fn ws_sender(&self) -> &broadcast::Sender<String> {
        &self.inner.ws_tx
    }

    pub fn subscribe_ws(&self) -> broadcast::Receiver<String> {
        self.inner.ws_tx.subscribe()
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn prefs(&self) -> &Preferences {
        &self.inner.prefs
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }

    pub fn foreground(&self) -> &Arc<ForegroundTracker> {
        &self.inner.foreground
    }

    pub fn presenter(&self) -> &Arc<NotificationPresenter> {
        &self.inner.presenter
    }

    /// Install the coordinator handle. Only the first call has an effect.
    pub fn set_coordinator(&self, handle: CoordinatorHandle) {
        if self.inner.coordinator.set(handle).is_err() {
            tracing::warn!("Registration coordinator already installed");
        }
    }

    pub fn coordinator(&self) -> Option<&CoordinatorHandle> {
        self.inner.coordinator.get()
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    /// Reload config from the database and hand the retry policy and quirk
    /// table to the running coordinator.
    pub async fn reload_config(&self) -> Result<(), anyhow::Error> {
        let sm = SettingsManager::new(self.inner.db.clone());
        let (retry, quirks) = {
            let mut config = self.inner.config.write().await;
            config.reload(&sm)?;
            (config.retry, config.quirks.clone())
        };
        if let Some(coordinator) = self.coordinator() {
            coordinator.reconfigure(retry, quirks).await?;
        }
        Ok(())
    }
}
