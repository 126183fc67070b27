//! Registration coordinator.
//!
//! A single task owns all registration state. Callers, distributor callbacks,
//! and timers talk to it through [`Command`]s; observers read the published
//! [`RegistrationStatus`] from a `watch` channel.
//!
//! Every scheduled timer carries the generation it was armed in. Any later
//! transition bumps the generation, so a stale timer arriving afterwards is
//! dropped instead of racing a manual retry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::PushError;
use crate::distributor::{DistributorRegistry, RegistrationStore};
use crate::endpoint::validate_endpoint;
use crate::event::{FailedReason, PushEvent, WebPushKeys};
use crate::quirks::{Quirk, QuirkTable};
use crate::vapid::VapidKeyPair;


const COMMAND_CAPACITY: usize = 64;

/// Bounded exponential backoff between automatic retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Instance token identifying this installation to the distributor.
    pub instance: String,
    pub retry: RetryPolicy,
    pub quirks: QuirkTable,
}

impl CoordinatorConfig {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            retry: RetryPolicy::default(),
            quirks: QuirkTable::builtin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoDistributors,
    NoAlternative,
    RetriesExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistrationState {
    Unregistered,
    Registering {
        distributor: Option<String>,
        attempt: u32,
    },
    AwaitingSelection,
    Registered {
        endpoint: String,
    },
    FailedRetrying {
        next: String,
        attempt: u32,
        retry_in_ms: u64,
    },
    Failed {
        reason: FailureKind,
    },
}

/// Snapshot published to observers (setup screen, API, WebSocket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub state: RegistrationState,
    pub endpoint: Option<String>,
    pub distributor: Option<String>,
    pub distributors: Vec<String>,
}

impl Default for RegistrationStatus {
    fn default() -> Self {
        Self {
            state: RegistrationState::Unregistered,
            endpoint: None,
            distributor: None,
            distributors: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Register,
    Select(String),
    Unregister,
    Event(PushEvent),
    Reconfigure { retry: RetryPolicy, quirks: QuirkTable },
    RetryDue { generation: u64 },
    SettleDue { generation: u64 },
    VerifyDue { generation: u64 },
}

pub struct Coordinator {
    registry: Arc<dyn DistributorRegistry>,
    store: Arc<dyn RegistrationStore>,
    config: CoordinatorConfig,
    status_tx: watch::Sender<RegistrationStatus>,
    commands: mpsc::WeakSender<Command>,
    generation: u64,
    attempts: u32,
    active: Option<String>,
    vapid_retried: bool,
    force_vapid: bool,
}

impl Coordinator {
    /// Start the coordinator task and return a handle to it.
    pub fn spawn(
        registry: Arc<dyn DistributorRegistry>,
        store: Arc<dyn RegistrationStore>,
        config: CoordinatorConfig,
    ) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let coordinator = Self::new(registry, store, config, &tx);
        let status = coordinator.status_tx.subscribe();
        tokio::spawn(coordinator.run(rx));
        CoordinatorHandle {
            commands: tx,
            status,
        }
    }

    pub(crate) fn new(
        registry: Arc<dyn DistributorRegistry>,
        store: Arc<dyn RegistrationStore>,
        config: CoordinatorConfig,
        commands: &mpsc::Sender<Command>,
    ) -> Self {
        let endpoint = store.endpoint();
        let initial = RegistrationStatus {
            state: match &endpoint {
                Some(endpoint) => RegistrationState::Registered {
                    endpoint: endpoint.clone(),
                },
                None => RegistrationState::Unregistered,
            },
            endpoint,
            distributor: store.current_distributor(),
            distributors: Vec::new(),
        };
        let (status_tx, _) = watch::channel(initial);

        Self {
            registry,
            store,
            config,
            status_tx,
            commands: commands.downgrade(),
            generation: 0,
            attempts: 0,
            active: None,
            vapid_retried: false,
            force_vapid: false,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!(instance = %self.config.instance, "Registration coordinator started");
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd).await;
        }
        tracing::info!("Registration coordinator stopped");
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status_tx.borrow().clone()
    }

    pub(crate) async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Register => self.register().await,
            Command::Select(distributor) => self.select(distributor).await,
            Command::Unregister => self.unregister().await,
            Command::Event(event) => self.on_event(event).await,
            Command::Reconfigure { retry, quirks } => {
                tracing::info!(
                    max_attempts = retry.max_attempts,
                    quirks = quirks.len(),
                    "Coordinator settings updated"
                );
                self.config.retry = retry;
                self.config.quirks = quirks;
            }
            Command::RetryDue { generation } => {
                if generation != self.generation {
                    tracing::debug!(generation, "Ignoring superseded retry");
                    return;
                }
                match self.active.clone() {
                    Some(distributor) => self.register_with(distributor).await,
                    None => self.register().await,
                }
            }
            Command::SettleDue { generation } => {
                if generation != self.generation {
                    tracing::debug!(generation, "Ignoring superseded settle timer");
                    return;
                }
                self.issue_register(true).await;
            }
            Command::VerifyDue { generation } => {
                if generation != self.generation {
                    return;
                }
                if matches!(
                    self.status_tx.borrow().state,
                    RegistrationState::Registering { .. }
                ) {
                    tracing::info!(
                        distributor = ?self.active,
                        "No registration outcome yet, re-issuing registration"
                    );
                    self.issue_register(false).await;
                }
            }
        }
    }

    // --- Commands ---

    async fn register(&mut self) {
        self.reset_cycle();

        let distributors = self.list_distributors().await;
        if distributors.is_empty() {
            tracing::warn!("No UnifiedPush distributor installed");
            self.clear_endpoint();
            self.active = None;
            self.set_state(RegistrationState::Failed {
                reason: FailureKind::NoDistributors,
            });
            return;
        }

        self.status_tx.send_modify(|s| s.endpoint = None);

        let chosen = if distributors.len() == 1 {
            Some(distributors[0].clone())
        } else {
            match self.registry.saved_distributor().await {
                Some(saved) if distributors.contains(&saved) => Some(saved),
                _ => None,
            }
        };

        match chosen {
            Some(distributor) => self.register_with(distributor).await,
            None => {
                tracing::info!(
                    count = distributors.len(),
                    "Multiple distributors and none saved, deferring to picker"
                );
                if let Err(e) = self.registry.save_distributor(None).await {
                    tracing::warn!(error = %e, "Failed to clear saved distributor");
                }
                self.active = None;
                self.issue_register(true).await;
            }
        }
    }

    async fn select(&mut self, distributor: String) {
        let distributors = self.list_distributors().await;
        if !distributors.contains(&distributor) {
            tracing::warn!(distributor = %distributor, "Selected distributor is not installed");
            return;
        }
        self.reset_cycle();
        self.register_with(distributor).await;
    }

    async fn unregister(&mut self) {
        self.generation += 1;
        if let Err(e) = self.registry.unregister(&self.config.instance).await {
            tracing::warn!(error = %e, "Distributor unregister failed");
        }
        self.clear_endpoint();
        self.active = None;
        self.set_state(RegistrationState::Unregistered);
        tracing::info!("Unregistered from push distributor");
    }

    // --- Events ---

    async fn on_event(&mut self, event: PushEvent) {
        if event.instance() != self.config.instance {
            tracing::debug!(
                kind = event.kind(),
                instance = event.instance(),
                "Ignoring event for another instance"
            );
            return;
        }

        match event {
            PushEvent::NewEndpoint { endpoint, keys, .. } => {
                self.on_new_endpoint(endpoint, keys).await
            }
            PushEvent::RegistrationFailed { reason, .. } => {
                self.on_registration_failed(reason).await
            }
            PushEvent::Unregistered { .. } => {
                // Pending timers stay armed: a clean start triggers this
                // callback itself and must still reach its settle timer.
                self.clear_endpoint();
                let in_flight = matches!(
                    self.status_tx.borrow().state,
                    RegistrationState::Registering { .. }
                        | RegistrationState::FailedRetrying { .. }
                );
                if in_flight {
                    tracing::debug!("Distributor confirmed unregistration during registration");
                } else {
                    self.set_state(RegistrationState::Unregistered);
                    tracing::info!("Distributor reported unregistration");
                }
            }
            PushEvent::Message { .. } => {
                tracing::debug!("Message events are not handled by the coordinator");
            }
        }
    }

    async fn on_new_endpoint(&mut self, endpoint: String, keys: Option<WebPushKeys>) {
        if let Err(e) = validate_endpoint(&endpoint) {
            tracing::warn!(error = %e, "Distributor returned an unusable endpoint");
            let failed = self.active.clone();
            self.handle_failure(failed).await;
            return;
        }

        self.generation += 1;
        self.attempts = 0;
        self.store.set_endpoint(Some(&endpoint));
        if let Some(keys) = &keys {
            self.store.save_webpush_keys(keys);
        }
        self.status_tx.send_modify(|s| s.endpoint = Some(endpoint.clone()));
        tracing::info!(endpoint = %endpoint, distributor = ?self.active, "Registered");
        self.set_state(RegistrationState::Registered { endpoint });
    }

    async fn on_registration_failed(&mut self, reason: FailedReason) {
        tracing::warn!(reason = %reason, distributor = ?self.active, "Registration failed");

        if reason.requires_vapid() && !self.registry.supports_vapid() {
            tracing::warn!("Distributor wants a VAPID key but this transport cannot send one");
        } else if reason.requires_vapid() && !self.vapid_retried {
            self.vapid_retried = true;
            match VapidKeyPair::generate() {
                Ok(keys) => {
                    self.store.save_vapid_keys(&keys);
                    self.force_vapid = true;
                    tracing::info!("Regenerated VAPID keys, retrying once");
                    self.issue_register(true).await;
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, "VAPID key generation failed");
                }
            }
        }

        let failed = match self.active.clone() {
            Some(active) => Some(active),
            None => self.registry.saved_distributor().await,
        };
        if let Err(e) = self.registry.save_distributor(None).await {
            tracing::warn!(error = %e, "Failed to clear saved distributor");
        }
        self.handle_failure(failed).await;
    }

    /// Clear the endpoint and fall back to another distributor if one exists.
    async fn handle_failure(&mut self, failed: Option<String>) {
        self.generation += 1;
        self.clear_endpoint();

        let distributors = self.list_distributors().await;
        if distributors.is_empty() {
            self.active = None;
            self.set_state(RegistrationState::Failed {
                reason: FailureKind::NoDistributors,
            });
            return;
        }

        let alternate = match &failed {
            Some(failed) if distributors.len() > 1 => {
                distributors.iter().find(|d| *d != failed).cloned()
            }
            _ => None,
        };
        let Some(next) = alternate else {
            tracing::warn!(failed = ?failed, "No alternate distributor to fall back to");
            self.set_state(RegistrationState::Failed {
                reason: FailureKind::NoAlternative,
            });
            return;
        };

        if self.attempts >= self.config.retry.max_attempts {
            tracing::error!(attempts = self.attempts, "Registration retries exhausted");
            self.set_state(RegistrationState::Failed {
                reason: FailureKind::RetriesExhausted,
            });
            return;
        }

        self.attempts += 1;
        let delay = self.config.retry.delay_for(self.attempts);
        self.persist_selection(&next).await;
        self.active = Some(next.clone());

        tracing::info!(
            next = %next,
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "Retrying with alternate distributor"
        );
        self.set_state(RegistrationState::FailedRetrying {
            next,
            attempt: self.attempts,
            retry_in_ms: delay.as_millis() as u64,
        });
        self.schedule(delay, |generation| Command::RetryDue { generation });
    }

    // --- Registration steps ---

    async fn register_with(&mut self, distributor: String) {
        self.persist_selection(&distributor).await;
        self.active = Some(distributor.clone());

        if let Some(quirk) = self.quirk_for(&distributor) {
            if quirk.clean_start {
                tracing::info!(distributor = %distributor, "Clean start: unregistering first");
                if let Err(e) = self.registry.unregister(&self.config.instance).await {
                    tracing::warn!(error = %e, "Clean-start unregister failed");
                }
                if quirk.settle_delay_ms > 0 {
                    self.set_registering();
                    self.schedule(Duration::from_millis(quirk.settle_delay_ms), |generation| {
                        Command::SettleDue { generation }
                    });
                    return;
                }
            }
        }

        self.issue_register(true).await;
    }

    async fn issue_register(&mut self, verify: bool) {
        let vapid = self.vapid_public_key();
        self.set_registering();

        match self
            .registry
            .register(&self.config.instance, vapid.as_deref())
            .await
        {
            Ok(()) => {
                tracing::debug!(distributor = ?self.active, vapid = vapid.is_some(), "Registration requested");
                if !verify {
                    return;
                }
                let verify_after = self
                    .active
                    .as_deref()
                    .and_then(|d| self.quirk_for(d))
                    .and_then(|q| q.verify_after_ms);
                if let Some(ms) = verify_after {
                    self.schedule(Duration::from_millis(ms), |generation| {
                        Command::VerifyDue { generation }
                    });
                }
            }
            Err(PushError::SelectionRequired) => {
                tracing::info!("Waiting for the user to pick a distributor");
                self.set_state(RegistrationState::AwaitingSelection);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration request failed");
                let failed = self.active.clone();
                self.handle_failure(failed).await;
            }
        }
    }

    fn vapid_public_key(&self) -> Option<String> {
        if !self.force_vapid && !self.store.vapid_enabled() {
            return None;
        }
        if let Some(keys) = self.store.vapid_keys() {
            return Some(keys.public_key().to_string());
        }
        match VapidKeyPair::generate() {
            Ok(keys) => {
                self.store.save_vapid_keys(&keys);
                Some(keys.public_key().to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "VAPID key generation failed, registering without");
                None
            }
        }
    }

    // --- Helpers ---

    fn reset_cycle(&mut self) {
        self.generation += 1;
        self.attempts = 0;
        self.vapid_retried = false;
        self.force_vapid = false;
    }

    async fn list_distributors(&mut self) -> Vec<String> {
        let distributors = match self.registry.distributors().await {
            Ok(distributors) => distributors,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list distributors");
                Vec::new()
            }
        };
        let published = distributors.clone();
        self.status_tx.send_modify(|s| s.distributors = published);
        distributors
    }

    async fn persist_selection(&self, distributor: &str) {
        self.store.set_current_distributor(Some(distributor));
        if let Err(e) = self.registry.save_distributor(Some(distributor)).await {
            tracing::warn!(error = %e, distributor, "Failed to save distributor");
        }
        let distributor = distributor.to_string();
        self.status_tx
            .send_modify(|s| s.distributor = Some(distributor));
    }

    fn clear_endpoint(&self) {
        self.store.set_endpoint(None);
        self.status_tx.send_modify(|s| s.endpoint = None);
    }

    fn quirk_for(&self, distributor: &str) -> Option<Quirk> {
        self.config.quirks.lookup(distributor).cloned()
    }

    fn set_registering(&self) {
        self.set_state(RegistrationState::Registering {
            distributor: self.active.clone(),
            attempt: self.attempts,
        });
    }

    fn set_state(&self, state: RegistrationState) {
        self.status_tx.send_modify(|s| s.state = state);
    }

    fn schedule(&mut self, delay: Duration, command: impl FnOnce(u64) -> Command) {
        self.generation += 1;
        let cmd = command(self.generation);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(cmd).await;
            }
        });
    }
}

/// Cloneable front door to a running [`Coordinator`].
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<RegistrationStatus>,
}

impl CoordinatorHandle {
    pub async fn register(&self) -> Result<(), PushError> {
        self.send(Command::Register).await
    }

    /// Register with a distributor picked by the user. Names missing from
    /// the last published distributor list are refused up front.
    pub async fn select(&self, distributor: impl Into<String>) -> Result<(), PushError> {
        let distributor = distributor.into();
        let unknown = {
            let status = self.status.borrow();
            !status.distributors.is_empty() && !status.distributors.contains(&distributor)
        };
        if unknown {
            return Err(PushError::DistributorNotFound(distributor));
        }
        self.send(Command::Select(distributor)).await
    }

    pub async fn unregister(&self) -> Result<(), PushError> {
        self.send(Command::Unregister).await
    }

    /// Replace the retry policy and quirk table. Applies from the next
    /// registration step on; a pending timer keeps its delay.
    pub async fn reconfigure(&self, retry: RetryPolicy, quirks: QuirkTable) -> Result<(), PushError> {
        self.send(Command::Reconfigure { retry, quirks }).await
    }

    /// Forward a distributor callback.
    pub async fn dispatch(&self, event: PushEvent) -> Result<(), PushError> {
        self.send(Command::Event(event)).await
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrationStatus> {
        self.status.clone()
    }

    async fn send(&self, cmd: Command) -> Result<(), PushError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| PushError::CoordinatorStopped)
    }
}
