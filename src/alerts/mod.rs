/// Alert engine, cooldown gate and notification channels
pub mod alert_engine;
pub mod cooldown;
pub mod notifier;

pub use alert_engine::{AlertEngine, Clock, RunOutcome, RunSummary, ServiceOutcome};
pub use cooldown::{CooldownGate, CooldownStatus};
pub use notifier::{LogNotifier, MockNotifier, Notifier, TelegramNotifier};
