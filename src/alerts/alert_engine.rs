use crate::alerts::cooldown::{CooldownGate, CooldownStatus};
use crate::alerts::notifier::Notifier;
use crate::config::{RunConfig, ServiceConfig};
use crate::error::ServiceError;
use crate::provider::ReportProvider;
use crate::series::{format_timestamp, Timestamp};
use crate::state::AlertState;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Decides, per service, whether to notify, and updates cooldown state
///
/// The engine walks the configured services in order. For each one it fetches
/// the latest report and baseline values, alerts when reports exceed the
/// threshold and the service is off cooldown, and records the alert time in the
/// state. Any failure is confined to the service it happened on.
pub struct AlertEngine {
    provider: Arc<dyn ReportProvider>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
}

/// What happened to a single service during a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServiceOutcome {
    /// Latest report count is at or below the threshold
    BelowThreshold,
    /// Above threshold, but the last alert was too recent
    OnCooldown,
    /// Notification sent and timestamp recorded
    Alerted,
}

/// Counters for one polling pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub alerts_sent: usize,
    pub skipped_below_threshold: usize,
    pub skipped_cooldown: usize,
    pub failures: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked {}, alerts sent {}, below threshold {}, on cooldown {}, failures {}",
            self.checked,
            self.alerts_sent,
            self.skipped_below_threshold,
            self.skipped_cooldown,
            self.failures
        )
    }
}

/// Updated state and counters returned by [`AlertEngine::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub state: AlertState,
    pub summary: RunSummary,
}

impl AlertEngine {
    /// Create an engine that reads the wall clock
    pub fn new(provider: Arc<dyn ReportProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(provider, notifier, Arc::new(Utc::now))
    }

    /// Create an engine with a custom time source
    pub fn with_clock(
        provider: Arc<dyn ReportProvider>,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
    ) -> Self {
        Self {
            provider,
            notifier,
            clock,
        }
    }

    /// Run one polling pass over every configured service
    ///
    /// The state is taken by value and handed back updated. Per-service
    /// failures are logged (and optionally notified) and never stop the pass.
    pub async fn run(&self, config: &RunConfig, mut state: AlertState) -> RunOutcome {
        let gate = CooldownGate::new(config.cooldown_minutes);
        let mut summary = RunSummary::default();

        for service in &config.services {
            summary.checked += 1;

            match self
                .process_service(config, &gate, service, &mut state)
                .await
            {
                Ok(ServiceOutcome::Alerted) => summary.alerts_sent += 1,
                Ok(ServiceOutcome::BelowThreshold) => summary.skipped_below_threshold += 1,
                Ok(ServiceOutcome::OnCooldown) => summary.skipped_cooldown += 1,
                Err(e) => {
                    summary.failures += 1;
                    error!("[{}] error: {}", service.slug, e);

                    if config.notify_errors {
                        self.report_failure(service, &e).await;
                    }
                }
            }
        }

        info!("Run finished: {}", summary);
        RunOutcome { state, summary }
    }

    /// Evaluate a single service and send its alert if warranted
    pub async fn process_service(
        &self,
        config: &RunConfig,
        gate: &CooldownGate,
        service: &ServiceConfig,
        state: &mut AlertState,
    ) -> Result<ServiceOutcome, ServiceError> {
        let series = self.provider.fetch(&service.slug, &config.country).await?;
        let reports_now = series.reports_now();
        let baseline_now = series.baseline_now();

        if !Self::exceeds_threshold(reports_now, config.threshold) {
            debug!(
                "[{}] {} reports, threshold {} not exceeded",
                service.slug, reports_now, config.threshold
            );
            return Ok(ServiceOutcome::BelowThreshold);
        }

        let now = (self.clock)();
        let last_sent = state.last_sent_at(&service.slug);

        if let CooldownStatus::OnCooldown { elapsed_minutes } = gate.check(last_sent.as_ref(), &now)
        {
            info!(
                "[{}] {} reports above threshold, on cooldown ({:.1} of {} minutes elapsed)",
                service.slug,
                reports_now,
                elapsed_minutes,
                gate.cooldown_minutes()
            );
            return Ok(ServiceOutcome::OnCooldown);
        }

        let message = Self::format_alert(service, reports_now, baseline_now, &now);
        self.notifier.send(&message).await?;

        state.record_sent(&service.slug, &now);
        info!(
            "[{}] alert sent ({} reports, baseline {})",
            service.slug, reports_now, baseline_now
        );
        Ok(ServiceOutcome::Alerted)
    }

    /// Strict comparison: a value equal to the threshold does not alert
    pub fn exceeds_threshold(reports_now: f64, threshold: f64) -> bool {
        reports_now > threshold
    }

    /// Render the reports/baseline ratio with one decimal, or `∞` without a baseline
    ///
    /// A ratio exactly halfway between two tenths rounds up (`2.25` → `2.3`).
    pub fn format_ratio(reports_now: f64, baseline_now: f64) -> String {
        if baseline_now <= 0.0 {
            return "∞".to_string();
        }

        let ratio = reports_now / baseline_now;
        // Only odd multiples of 0.25 sit exactly on a tie; `{:.1}` sends those to even.
        let quarters = ratio * 4.0;
        if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
            format!("{:.1}", (ratio * 10.0 + 0.5).floor() / 10.0)
        } else {
            format!("{:.1}", ratio)
        }
    }

    /// Format the alert message for a service
    pub fn format_alert(
        service: &ServiceConfig,
        reports_now: f64,
        baseline_now: f64,
        now: &Timestamp,
    ) -> String {
        [
            "🚨 Downdetector Alert".to_string(),
            format!("Servizio: {}", service.name),
            format!("Reports (ultimo punto): {}", reports_now),
            format!("Baseline (ultimo punto): {}", baseline_now),
            format!(
                "Rapporto reports/baseline: {}",
                Self::format_ratio(reports_now, baseline_now)
            ),
            format!("Link: {}", service.url),
            format!("Time: {}", format_timestamp(now)),
        ]
        .join("\n")
    }

    /// Format the message sent for a per-service failure
    pub fn format_failure(service: &ServiceConfig, error: &ServiceError) -> String {
        [
            "⚠️ Downdetector Monitor Error".to_string(),
            format!("Servizio: {}", service.name),
            format!("Errore: {}", error),
        ]
        .join("\n")
    }

    /// Push a per-service failure through the notifier, logging delivery problems
    async fn report_failure(&self, service: &ServiceConfig, error: &ServiceError) {
        let message = Self::format_failure(service, error);
        if let Err(e) = self.notifier.send(&message).await {
            warn!(
                "[{}] failed to deliver error notification: {}",
                service.slug, e
            );
        }
    }
}
