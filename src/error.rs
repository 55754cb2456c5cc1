use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors that can occur when fetching report series from the provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Provider communication failed: {0}")]
    BackendError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur when sending alerts
#[derive(Error, Debug, Clone)]
pub enum AlertError {
    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

/// Errors that can occur while persisting alert state
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Failed to replace state file: {0}")]
    PersistError(String),
}

/// Failure while processing a single monitored service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Alert(#[from] AlertError),
}
