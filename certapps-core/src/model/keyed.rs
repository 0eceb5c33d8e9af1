use datastore::Key;
use serde::Serialize;

/// An entity together with the key the store resolved for it.
///
/// Entities as stored do not carry their own key; services attach it here so
/// callers can refer back to the entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyed<E> {
    #[serde(rename = "Key", with = "datastore::key::as_string")]
    pub key: Key,
    #[serde(rename = "KeyID")]
    pub key_id: i64,
    #[serde(flatten)]
    pub entity: E,
}

impl<E> Keyed<E> {
    /// Attach a resolved key to an entity.
    pub fn new(key: Key, entity: E) -> Self {
        Self {
            key_id: key.id().unwrap_or_default(),
            key,
            entity,
        }
    }
}

impl<E> From<(Key, E)> for Keyed<E> {
    fn from((key, entity): (Key, E)) -> Self {
        Self::new(key, entity)
    }
}
