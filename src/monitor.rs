//! One scheduled polling pass: configuration in, alerts out, state persisted
//!
//! `Monitor` owns the run configuration and the alert engine. It loads the
//! state file at the start of a pass and writes it back at the end; nothing
//! else touches the file.

use crate::alerts::{AlertEngine, LogNotifier, Notifier, RunSummary, TelegramNotifier};
use crate::config::{RunConfig, TelegramCredentials};
use crate::error::{ConfigError, StateError};
use crate::provider::{DowndetectorClient, ReportProvider};
use crate::state::AlertState;
use anyhow::Context;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Coordinates a single polling pass
pub struct Monitor {
    config: RunConfig,
    state_path: PathBuf,
    engine: AlertEngine,
    persist_state: bool,
}

impl Monitor {
    /// Create a monitor from already-built collaborators
    pub fn new(config: RunConfig, state_path: PathBuf, engine: AlertEngine) -> Self {
        Self {
            config,
            state_path,
            engine,
            persist_state: true,
        }
    }

    /// Create a monitor backed by Downdetector and Telegram
    ///
    /// Without credentials the monitor runs dry: alerts are logged instead of
    /// sent and the state file is left untouched.
    pub fn live(
        config: RunConfig,
        state_path: PathBuf,
        credentials: Option<TelegramCredentials>,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_seconds);

        let provider: Arc<dyn ReportProvider> = Arc::new(
            DowndetectorClient::new(timeout).context("failed to build Downdetector client")?,
        );

        let persist_state = credentials.is_some();
        let notifier: Arc<dyn Notifier> = match credentials {
            Some(credentials) => Arc::new(
                TelegramNotifier::new(credentials, timeout)
                    .context("failed to build Telegram notifier")?,
            ),
            None => {
                warn!("No Telegram credentials: dry run, state will not be saved");
                Arc::new(LogNotifier)
            }
        };

        let engine = AlertEngine::new(provider, notifier);
        Ok(Self::new(config, state_path, engine).persist_state(persist_state))
    }

    /// Whether `run_once` writes the state file back
    pub fn persist_state(mut self, persist: bool) -> Self {
        self.persist_state = persist;
        self
    }

    /// Load the run configuration
    ///
    /// Unlike state, a missing or invalid configuration is fatal.
    pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
        info!("Loading configuration from: {}", path.display());
        RunConfig::from_file(path)
    }

    /// Run one polling pass and persist the resulting state
    ///
    /// # Errors
    ///
    /// Only a failure to write the state file is returned; per-service
    /// failures are logged by the engine and counted in the summary.
    pub async fn run_once(&self) -> Result<RunSummary, StateError> {
        let state = AlertState::load(&self.state_path);
        info!(
            "Polling {} services (threshold {}, cooldown {} minutes, country {})",
            self.config.services.len(),
            self.config.threshold,
            self.config.cooldown_minutes,
            self.config.country
        );

        let outcome = self.engine.run(&self.config, state).await;

        if self.persist_state {
            outcome.state.save(&self.state_path)?;
        }

        Ok(outcome.summary)
    }
}
