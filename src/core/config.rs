use anyhow::{Result, bail};
use tracing::debug;

pub const EMAIL_USER_VAR: &str = "EMAIL_USER";
pub const EMAIL_PASS_VAR: &str = "EMAIL_PASS";
pub const EMAIL_TO_VAR: &str = "EMAIL_TO";

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com";
pub const DEFAULT_SMTP_RELAY: &str = "smtp.gmail.com";

/// Mail account credentials and the notification recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub user: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl MailConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let user = read(EMAIL_USER_VAR);
        let password = read(EMAIL_PASS_VAR);
        let recipient = read(EMAIL_TO_VAR);

        match (user, password, recipient) {
            (Some(user), Some(password), Some(recipient)) => {
                debug!("Loaded mail configuration from environment");
                Ok(Self {
                    user,
                    password,
                    recipient,
                })
            }
            (user, password, recipient) => {
                let missing: Vec<&str> = [
                    (EMAIL_USER_VAR, user.is_none()),
                    (EMAIL_PASS_VAR, password.is_none()),
                    (EMAIL_TO_VAR, recipient.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                bail!(
                    "Missing mail configuration: set {} in the environment",
                    missing.join(", ")
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidersConfig {
    pub coingecko_url: String,
    pub smtp_relay: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko_url: DEFAULT_COINGECKO_URL.to_string(),
            smtp_relay: DEFAULT_SMTP_RELAY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Absent on dry runs, where nothing is mailed.
    pub mail: Option<MailConfig>,
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load(dry_run: bool) -> Result<Self> {
        debug!(dry_run, "Loading config");
        let mail = if dry_run {
            None
        } else {
            Some(MailConfig::from_env()?)
        };
        Ok(Self {
            mail,
            providers: ProvidersConfig::default(),
        })
    }
}
