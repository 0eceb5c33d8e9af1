//! Structured entity keys.
//!
//! A key names one entity by kind plus either a string name or a numeric id,
//! optionally nested under a parent key. Keys sharing a root ancestor form one
//! entity group, the unit of strong consistency.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The identifying part of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyIdent {
    /// Not yet assigned; the store picks an id on first write.
    Incomplete,
    /// Caller-chosen string name.
    Name(String),
    /// Numeric id, usually assigned by the store.
    Id(i64),
}

/// Address of one entity.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "KeyRepr", try_from = "KeyRepr")]
pub struct Key {
    kind: String,
    ident: KeyIdent,
    parent: Option<Box<Key>>,
}

impl Key {
    /// Create a key with a string name.
    pub fn named(kind: impl Into<String>, name: impl Into<String>, parent: Option<&Key>) -> Self {
        Self {
            kind: kind.into(),
            ident: KeyIdent::Name(name.into()),
            parent: parent.map(|p| Box::new(p.clone())),
        }
    }

    /// Create a key with a numeric id.
    pub fn with_id(kind: impl Into<String>, id: i64, parent: Option<&Key>) -> Self {
        Self {
            kind: kind.into(),
            ident: KeyIdent::Id(id),
            parent: parent.map(|p| Box::new(p.clone())),
        }
    }

    /// Create a key whose id will be assigned by the store on first write.
    pub fn incomplete(kind: impl Into<String>, parent: Option<&Key>) -> Self {
        Self {
            kind: kind.into(),
            ident: KeyIdent::Incomplete,
            parent: parent.map(|p| Box::new(p.clone())),
        }
    }

    /// The entity kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The identifying part.
    pub fn ident(&self) -> &KeyIdent {
        &self.ident
    }

    /// The string name, if this key is named.
    pub fn name(&self) -> Option<&str> {
        match &self.ident {
            KeyIdent::Name(name) => Some(name),
            _ => None,
        }
    }

    /// The numeric id, if this key has one.
    pub fn id(&self) -> Option<i64> {
        match self.ident {
            KeyIdent::Id(id) => Some(id),
            _ => None,
        }
    }

    /// The parent key, if any.
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Whether a name or id has been assigned.
    pub fn is_complete(&self) -> bool {
        !matches!(self.ident, KeyIdent::Incomplete)
    }

    /// Whether every key in the parent chain is complete.
    pub fn has_complete_ancestry(&self) -> bool {
        let mut current = self.parent();
        while let Some(key) = current {
            if !key.is_complete() {
                return false;
            }
            current = key.parent();
        }
        true
    }

    /// The root ancestor; identifies the entity group.
    pub fn root(&self) -> &Key {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Whether both keys live in the same entity group.
    pub fn same_group(&self, other: &Key) -> bool {
        self.root() == other.root()
    }

    /// Whether `self` is `other` or one of its ancestors.
    ///
    /// A key counts as its own ancestor, matching ancestor-query semantics.
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        let mut current = Some(other);
        while let Some(key) = current {
            if key == self {
                return true;
            }
            current = key.parent();
        }
        false
    }

    /// Same kind and parent, with the given id.
    pub(crate) fn completed(&self, id: i64) -> Self {
        Self {
            kind: self.kind.clone(),
            ident: KeyIdent::Id(id),
            parent: self.parent.clone(),
        }
    }

    /// Encode in path form, e.g. `/Guestbook,'default_guestbook'/Greeting,7`.
    pub fn encode(&self) -> String {
        let mut out = match self.parent() {
            Some(parent) => parent.encode(),
            None => String::new(),
        };
        out.push('/');
        out.push_str(&escape(&self.kind));
        out.push(',');
        match &self.ident {
            KeyIdent::Incomplete => out.push('?'),
            KeyIdent::Name(name) => {
                out.push('\'');
                out.push_str(&escape(name));
                out.push('\'');
            }
            KeyIdent::Id(id) => out.push_str(&id.to_string()),
        }
        out
    }

    /// Parse the path form produced by [`Key::encode`].
    pub fn decode(encoded: &str) -> StoreResult<Self> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            encoded: encoded.to_string(),
            reason: reason.to_string(),
        };

        let rest = encoded
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut key: Option<Key> = None;
        for segment in rest.split('/') {
            let (kind, ident) = segment
                .split_once(',')
                .ok_or_else(|| invalid("segment is missing ','"))?;
            if kind.is_empty() {
                return Err(invalid("empty kind"));
            }
            let kind = unescape(kind);
            let ident = if ident == "?" {
                KeyIdent::Incomplete
            } else if let Some(name) = ident.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
                KeyIdent::Name(unescape(name))
            } else {
                KeyIdent::Id(ident.parse().map_err(|_| invalid("id is not an integer"))?)
            };
            key = Some(Key {
                kind,
                ident,
                parent: key.map(Box::new),
            });
        }

        key.ok_or_else(|| invalid("no segments"))
    }
}

fn escape(part: &str) -> String {
    part.replace('%', "%25")
        .replace('/', "%2F")
        .replace(',', "%2C")
        .replace('\'', "%27")
}

fn unescape(part: &str) -> String {
    part.replace("%27", "'")
        .replace("%2C", ",")
        .replace("%2F", "/")
        .replace("%25", "%")
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.encode())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<Key> for serde_json::Value {
    fn from(key: Key) -> Self {
        serde_json::to_value(KeyRepr::from(key)).unwrap_or(serde_json::Value::Null)
    }
}

impl From<&Key> for serde_json::Value {
    fn from(key: &Key) -> Self {
        key.clone().into()
    }
}

/// Stored property form of a key.
#[derive(Serialize, Deserialize)]
struct KeyRepr {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Box<Key>>,
}

impl From<Key> for KeyRepr {
    fn from(key: Key) -> Self {
        let (name, id) = match key.ident {
            KeyIdent::Incomplete => (None, None),
            KeyIdent::Name(name) => (Some(name), None),
            KeyIdent::Id(id) => (None, Some(id)),
        };
        Self {
            kind: key.kind,
            name,
            id,
            parent: key.parent,
        }
    }
}

impl TryFrom<KeyRepr> for Key {
    type Error = String;

    fn try_from(repr: KeyRepr) -> Result<Self, Self::Error> {
        let ident = match (repr.name, repr.id) {
            (Some(_), Some(_)) => return Err("key has both a name and an id".to_string()),
            (Some(name), None) => KeyIdent::Name(name),
            (None, Some(id)) => KeyIdent::Id(id),
            (None, None) => KeyIdent::Incomplete,
        };
        Ok(Self {
            kind: repr.kind,
            ident,
            parent: repr.parent,
        })
    }
}

/// Serde adapter that writes a key in its encoded path form.
///
/// Use with `#[serde(with = "datastore::key::as_string")]`.
pub mod as_string {
    use super::Key;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &Key, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.encode())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Key, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Key::decode(&encoded).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guestbook() -> Key {
        Key::named("Guestbook", "default_guestbook", None)
    }

    #[test]
    fn test_incomplete_key() {
        let key = Key::incomplete("Greeting", Some(&guestbook()));
        assert!(!key.is_complete());
        assert!(key.has_complete_ancestry());
        assert_eq!(key.id(), None);
        assert_eq!(key.name(), None);
    }

    #[test]
    fn test_incomplete_ancestry() {
        let member = Key::incomplete("Member", None);
        let child = Key::incomplete("Location", Some(&member));
        assert!(!child.has_complete_ancestry());
    }

    #[test]
    fn test_group_membership() {
        let book = guestbook();
        let a = Key::with_id("Greeting", 1, Some(&book));
        let b = Key::with_id("Greeting", 2, Some(&book));
        let other = Key::with_id("Member", 1, None);

        assert!(a.same_group(&b));
        assert!(!a.same_group(&other));
        assert_eq!(a.root(), &book);
        assert!(book.is_ancestor_of(&a));
        assert!(a.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&b));
    }

    #[test]
    fn test_equality_covers_parent() {
        let a = Key::with_id("Greeting", 1, Some(&guestbook()));
        let b = Key::with_id("Greeting", 1, None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_encode_decode() {
        let key = Key::with_id("Greeting", 42, Some(&Key::named("Guestbook", "a/b,'c'", None)));
        let encoded = key.encode();
        assert!(encoded.starts_with("/Guestbook,'"));
        assert!(encoded.ends_with("/Greeting,42"));
        assert_eq!(Key::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Key::decode("Greeting,1").is_err());
        assert!(Key::decode("/Greeting").is_err());
        assert!(Key::decode("/Greeting,abc").is_err());
        assert!(Key::decode("/,1").is_err());
    }

    #[test]
    fn test_serde_structured() {
        let key = Key::with_id("Team", 42, None);
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "Team", "id": 42}));

        let parsed: Key = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_serde_rejects_name_and_id() {
        let value = serde_json::json!({"kind": "Team", "id": 1, "name": "x"});
        assert!(serde_json::from_value::<Key>(value).is_err());
    }
}
