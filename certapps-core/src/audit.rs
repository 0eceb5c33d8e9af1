//! Created/modified bookkeeping shared by every persisted entity.

use chrono::serde::ts_microseconds;
use chrono::{DateTime, Utc};
use datastore::Key;
use serde::{Deserialize, Serialize};

/// Audit fields embedded in an entity.
///
/// `created_by` and `modified_by` reference the acting member's key. They are
/// `None` only while that key does not exist yet, i.e. during the first write
/// of a freshly provisioned member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Audit {
    #[serde(with = "ts_microseconds")]
    pub created: DateTime<Utc>,
    pub created_by: Option<Key>,
    #[serde(with = "ts_microseconds")]
    pub modified: DateTime<Utc>,
    pub modified_by: Option<Key>,
}

impl Audit {
    /// Audit for a new entity created by `actor` at `at`.
    pub fn new(actor: Option<&Key>, at: DateTime<Utc>) -> Self {
        Self {
            created: at,
            created_by: actor.cloned(),
            modified: at,
            modified_by: actor.cloned(),
        }
    }

    /// Audit for an entity created before any member key exists.
    pub fn bootstrap(at: DateTime<Utc>) -> Self {
        Self::new(None, at)
    }

    /// Record a modification.
    pub fn touch(&mut self, actor: &Key, at: DateTime<Utc>) {
        self.modified = at;
        self.modified_by = Some(actor.clone());
    }

    /// Attribute creation and last modification to `actor` without changing times.
    pub fn attribute_to(&mut self, actor: &Key) {
        self.created_by = Some(actor.clone());
        self.modified_by = Some(actor.clone());
    }

    /// Whether no actor has been recorded yet.
    pub fn is_bootstrap(&self) -> bool {
        self.created_by.is_none() && self.modified_by.is_none()
    }
}

/// Capability of carrying audit fields.
pub trait Audited {
    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;
}

macro_rules! impl_audited {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::audit::Audited for $ty {
                fn audit(&self) -> &$crate::audit::Audit {
                    &self.audit
                }

                fn audit_mut(&mut self) -> &mut $crate::audit::Audit {
                    &mut self.audit
                }
            }
        )*
    };
}

pub(crate) use impl_audited;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_bootstrap_then_attribute() {
        let mut audit = Audit::bootstrap(at(10));
        assert!(audit.is_bootstrap());

        let member = Key::with_id("Member", 5, None);
        audit.attribute_to(&member);
        assert_eq!(audit.created_by, Some(member.clone()));
        assert_eq!(audit.modified_by, Some(member));
        assert_eq!(audit.created, at(10));
    }

    #[test]
    fn test_touch_keeps_creation() {
        let creator = Key::with_id("Member", 1, None);
        let editor = Key::with_id("Member", 2, None);
        let mut audit = Audit::new(Some(&creator), at(10));
        audit.touch(&editor, at(20));

        assert_eq!(audit.created_by, Some(creator));
        assert_eq!(audit.created, at(10));
        assert_eq!(audit.modified_by, Some(editor));
        assert_eq!(audit.modified, at(20));
    }

    #[test]
    fn test_timestamps_stored_as_micros() {
        let audit = Audit::new(None, at(2));
        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["Created"], 2_000_000);
        assert_eq!(value["ModifiedBy"], serde_json::Value::Null);
    }
}
