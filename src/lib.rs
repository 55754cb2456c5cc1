/// Error types for the outage monitor
pub mod error;

/// Report series types
pub mod series;

/// Report providers
pub mod provider;

/// Alert engine and notifications
pub mod alerts;

/// Persisted alert state
pub mod state;

/// Configuration management
pub mod config;

/// Single polling pass orchestration
pub mod monitor;

// Re-export commonly used types
pub use error::{AlertError, ConfigError, ProviderError, ServiceError, StateError};
pub use monitor::Monitor;
