//! # Datastore
//!
//! A hierarchical entity store addressed by structured keys.
//!
//! ## Core Concepts
//!
//! - **Key**: kind plus name or numeric id, optionally under a parent key
//! - **Entity group**: all keys sharing a root ancestor; the unit of strong
//!   consistency and serialized writes
//! - **Ancestor query**: restricted to one group, strongly consistent
//! - **Cross-group query**: filters across groups, eventually consistent
//!
//! ## Example
//!
//! ```rust,ignore
//! use datastore::prelude::*;
//!
//! let store = MemoryDatastore::new();
//! let book = Key::named("Guestbook", "default_guestbook", None);
//! let key = store.put(&Key::incomplete("Greeting", Some(&book)), props).await?;
//! let recent = store.get_all(&Query::new("Greeting").ancestor(&book).order("-Date").limit(10)).await?;
//! ```

pub mod error;
pub mod key;
pub mod memory;
pub mod query;
pub mod store;

/// Stored form of an entity.
pub type Properties = serde_json::Map<String, serde_json::Value>;

pub use error::{StoreError, StoreOp, StoreResult};
pub use key::{Key, KeyIdent};
pub use memory::{IdPolicy, MemoryDatastore, StoreConfig};
pub use query::{Direction, Filter, FilterOp, Order, Query};
pub use store::{Datastore, DatastoreExt, Entity};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{StoreError, StoreOp, StoreResult};
    pub use crate::key::Key;
    pub use crate::memory::{IdPolicy, MemoryDatastore, StoreConfig};
    pub use crate::query::Query;
    pub use crate::store::{Datastore, DatastoreExt, Entity};
    pub use crate::Properties;
}
