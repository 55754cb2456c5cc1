/// Run configuration and Telegram credentials
pub mod credentials;
pub mod run_config;

pub use credentials::{TelegramCredentials, BOT_TOKEN_VAR, CHAT_ID_VAR};
pub use run_config::{RunConfig, ServiceConfig};
