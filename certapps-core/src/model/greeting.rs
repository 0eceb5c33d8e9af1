use chrono::serde::ts_microseconds;
use chrono::{DateTime, Utc};
use datastore::Entity;
use serde::{Deserialize, Serialize};

/// One guestbook message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Greeting {
    /// Rendered identity of the signer; empty when anonymous.
    pub author: String,
    pub content: String,
    #[serde(with = "ts_microseconds")]
    pub date: DateTime<Utc>,
}

impl Greeting {
    /// Property holding the signing time.
    pub const DATE: &'static str = "Date";

    /// A greeting signed now.
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            date: Utc::now(),
        }
    }

    /// Whether no identity signed this greeting.
    pub fn is_anonymous(&self) -> bool {
        self.author.is_empty()
    }
}

impl Entity for Greeting {
    const KIND: &'static str = "Greeting";
}
