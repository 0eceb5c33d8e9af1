//! Application configuration.

use crate::error::{AppError, AppResult};
use crate::provisioning::MemberDefaults;
use datastore::Key;
use once_cell::sync::Lazy;

/// Kind of guestbook keys.
pub const GUESTBOOK_KIND: &str = "Guestbook";

/// Name of the process-wide guestbook.
pub const DEFAULT_GUESTBOOK_NAME: &str = "default_guestbook";

/// Greetings shown per page.
pub const DEFAULT_GREETING_LIMIT: usize = 10;

/// Parent of every greeting in the default guestbook.
///
/// All greetings share this root, so they form a single entity group: reads
/// are strongly consistent and writes share one group's rate limit.
pub static DEFAULT_GUESTBOOK_KEY: Lazy<Key> =
    Lazy::new(|| Key::named(GUESTBOOK_KIND, DEFAULT_GUESTBOOK_NAME, None));

/// Configuration for the application services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the guestbook whose key parents all greetings.
    pub guestbook_name: String,

    /// Maximum greetings returned by one listing.
    pub greeting_limit: usize,

    /// Placeholder profile for newly provisioned members.
    pub member_defaults: MemberDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            guestbook_name: DEFAULT_GUESTBOOK_NAME.to_string(),
            greeting_limit: DEFAULT_GREETING_LIMIT,
            member_defaults: MemberDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Create a config with the default guestbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` if present, then read `CERTAPPS_GUESTBOOK` and
    /// `CERTAPPS_GREETING_LIMIT` over the defaults.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(name) = std::env::var("CERTAPPS_GUESTBOOK") {
            config.guestbook_name = name;
        }
        if let Ok(limit) = std::env::var("CERTAPPS_GREETING_LIMIT") {
            config.greeting_limit = limit.parse().map_err(|_| AppError::Config {
                reason: format!("CERTAPPS_GREETING_LIMIT is not a count: {limit:?}"),
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Set the guestbook name.
    pub fn with_guestbook_name(mut self, name: impl Into<String>) -> Self {
        self.guestbook_name = name.into();
        self
    }

    /// Set the greeting page size.
    pub fn with_greeting_limit(mut self, limit: usize) -> Self {
        self.greeting_limit = limit;
        self
    }

    /// Set the placeholder profile for new members.
    pub fn with_member_defaults(mut self, defaults: MemberDefaults) -> Self {
        self.member_defaults = defaults;
        self
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.guestbook_name.is_empty() {
            return Err(AppError::Config {
                reason: "guestbook name must not be empty".to_string(),
            });
        }
        if self.greeting_limit == 0 {
            return Err(AppError::Config {
                reason: "greeting limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Key of the configured guestbook.
    pub fn guestbook_key(&self) -> Key {
        if self.guestbook_name == DEFAULT_GUESTBOOK_NAME {
            DEFAULT_GUESTBOOK_KEY.clone()
        } else {
            Key::named(GUESTBOOK_KIND, self.guestbook_name.as_str(), None)
        }
    }
}
