//! Testing utilities.
//!
//! `TestHarness` wires the application to a fresh in-memory store and a
//! guestbook key nobody else uses, so tests never observe each other's
//! greetings.

use crate::config::AppConfig;
use crate::handlers::{App, HandlerResponse, Request};
use crate::identity::{Identity, LocalIdentityProvider};
use datastore::{Datastore, MemoryDatastore, StoreConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GUESTBOOK: AtomicU64 = AtomicU64::new(1);

/// An application over an isolated in-memory store.
pub struct TestHarness {
    pub store: Arc<MemoryDatastore>,
    pub config: AppConfig,
    pub app: App,
}

impl TestHarness {
    /// Harness with immediate visibility for every query.
    pub fn new() -> Self {
        Self::with_store_config(StoreConfig::new())
    }

    /// Harness over a store with the given configuration.
    pub fn with_store_config(store_config: StoreConfig) -> Self {
        let n = NEXT_GUESTBOOK.fetch_add(1, Ordering::Relaxed);
        let config = AppConfig::new().with_guestbook_name(format!("test_guestbook_{n}"));
        Self::with_config(config, store_config)
    }

    /// Harness with explicit application and store configuration.
    pub fn with_config(config: AppConfig, store_config: StoreConfig) -> Self {
        let store = Arc::new(MemoryDatastore::with_config(store_config));
        let shared: Arc<dyn Datastore> = store.clone();
        let app = App::new(&config, shared, Arc::new(LocalIdentityProvider::default()));
        Self { store, config, app }
    }

    /// A signed-in identity with a derived display form.
    pub fn identity(id: &str) -> Identity {
        Identity::new(id, format!("{id}@example.com"))
    }

    /// Handle a request through the application.
    pub async fn send(&self, request: Request) -> HandlerResponse {
        self.app.handle(&request).await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harnesses_use_distinct_guestbooks() {
        let a = TestHarness::new();
        let b = TestHarness::new();
        assert_ne!(a.config.guestbook_key(), b.config.guestbook_key());
        assert_eq!(a.app.guestbook().key(), &a.config.guestbook_key());
    }
}
