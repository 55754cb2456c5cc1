use crate::error::ConfigError;

/// Environment variable holding the Telegram bot token
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the destination chat id
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Telegram bot credential and destination chat
#[derive(Clone, PartialEq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    /// Read both credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` naming the first variable that is
    /// unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both credentials through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        Ok(Self {
            bot_token: read(BOT_TOKEN_VAR)?,
            chat_id: read(CHAT_ID_VAR)?,
        })
    }
}
