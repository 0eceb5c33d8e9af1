//! Append-only guestbook scoped to one entity group.

use crate::error::AppResult;
use crate::identity::Identity;
use crate::model::Greeting;
use datastore::{Datastore, DatastoreExt, Entity, Key, Query};
use std::sync::Arc;

/// Guestbook service.
///
/// Every greeting is written under the guestbook key, which makes the whole
/// guestbook one entity group: a listing always observes appends that
/// completed before it started.
pub struct Guestbook {
    store: Arc<dyn Datastore>,
    key: Key,
    limit: usize,
}

impl Guestbook {
    /// Create a guestbook rooted at `key`, listing at most `limit` greetings.
    pub fn new(store: Arc<dyn Datastore>, key: Key, limit: usize) -> Self {
        Self { store, key, limit }
    }

    /// The guestbook's key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Most recent greetings first, capped at the configured limit.
    pub async fn list(&self) -> AppResult<Vec<Greeting>> {
        let query = Query::new(Greeting::KIND)
            .ancestor(&self.key)
            .order(&format!("-{}", Greeting::DATE))
            .limit(self.limit);

        let greetings = self
            .store
            .get_all_entities::<Greeting>(&query)
            .await?
            .into_iter()
            .map(|(_, greeting)| greeting)
            .collect();
        Ok(greetings)
    }

    /// Sign the guestbook.
    ///
    /// Content is stored as given, empty included. The author is the signed-in
    /// identity's display form, or empty for anonymous visitors.
    pub async fn append(&self, content: &str, author: Option<&Identity>) -> AppResult<Key> {
        let author = author.map(ToString::to_string).unwrap_or_default();
        let greeting = Greeting::new(author, content);

        let key = self
            .store
            .put_entity(&Key::incomplete(Greeting::KIND, Some(&self.key)), &greeting)
            .await?;
        tracing::info!(key = %key, anonymous = greeting.is_anonymous(), "greeting stored");
        Ok(key)
    }
}
