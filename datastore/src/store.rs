//! The store interface and typed entity access.

use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::query::Query;
use crate::Properties;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A hierarchical entity store.
///
/// Every call is a suspension point and may fail with a transient error.
/// Implementations never retry on the caller's behalf.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Upsert the properties at `key`.
    ///
    /// An incomplete key is resolved to a fresh id; the resolved key is
    /// returned. Keys with an incomplete ancestor are rejected.
    async fn put(&self, key: &Key, properties: Properties) -> StoreResult<Key>;

    /// Load the properties at a complete key.
    async fn get(&self, key: &Key) -> StoreResult<Properties>;

    /// Run a query, returning matching keys alongside their properties.
    async fn get_all(&self, query: &Query) -> StoreResult<Vec<(Key, Properties)>>;
}

/// A persistable record type with a fixed kind.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Kind name used in keys and queries.
    const KIND: &'static str;

    /// Encode into a property map.
    fn to_properties(&self) -> StoreResult<Properties> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAPropertyMap {
                kind: Self::KIND.to_string(),
            }),
        }
    }

    /// Decode from a property map.
    fn from_properties(properties: Properties) -> StoreResult<Self> {
        Ok(serde_json::from_value(Value::Object(properties))?)
    }
}

fn check_kind(expected: &str, found: &str) -> StoreResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(StoreError::KindMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

/// Typed helpers over any [`Datastore`].
#[async_trait]
pub trait DatastoreExt: Datastore {
    /// Put a typed entity; the key's kind must match.
    async fn put_entity<E: Entity>(&self, key: &Key, entity: &E) -> StoreResult<Key> {
        check_kind(E::KIND, key.kind())?;
        let properties = entity.to_properties()?;
        self.put(key, properties).await
    }

    /// Load a typed entity.
    async fn get_entity<E: Entity>(&self, key: &Key) -> StoreResult<E> {
        check_kind(E::KIND, key.kind())?;
        E::from_properties(self.get(key).await?)
    }

    /// Run a query and decode every result.
    async fn get_all_entities<E: Entity>(&self, query: &Query) -> StoreResult<Vec<(Key, E)>> {
        check_kind(E::KIND, query.kind())?;
        self.get_all(query)
            .await?
            .into_iter()
            .map(|(key, properties)| Ok((key, E::from_properties(properties)?)))
            .collect()
    }
}

impl<T: Datastore + ?Sized> DatastoreExt for T {}
