//! Find-or-create of the member behind an external identity.
//!
//! A new member and its home location reference each other's keys, and the
//! member's audit fields reference the member itself. None of those keys exist
//! until the store resolves them, so creation is three sequential writes:
//!
//! 1. put the member under an incomplete key, yielding the member key;
//! 2. put the location, attributed to the member key, yielding the location key;
//! 3. put the member again at its key with the home address and audit set.
//!
//! Members live under a root key named after the identity, so the lookup is
//! an ancestor query and always sees a member created by an earlier request.
//!
//! The writes touch two entity groups and are not atomic. A failure part way
//! leaves whatever was already written; nothing is rolled back.
//!
//! Lookup-then-create is not guarded either: two first-time requests for the
//! same identity racing each other can both create a member. Lookups take the
//! first match and never reconcile duplicates.

use crate::audit::Audit;
use crate::error::AppResult;
use crate::identity::Identity;
use crate::model::{Address, Location, Member};
use chrono::Utc;
use datastore::{Datastore, DatastoreExt, Entity, Key, Query, StoreResult};
use std::sync::Arc;

/// Kind of the per-identity root that parents a member.
pub const USER_KIND: &str = "User";

/// Entity group holding the members of one identity.
pub fn user_key(identity: &Identity) -> Key {
    Key::named(USER_KIND, identity.id.as_str(), None)
}

/// Placeholder profile given to newly provisioned members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDefaults {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub cell: String,
    pub address: Address,
}

impl Default for MemberDefaults {
    fn default() -> Self {
        Self {
            first_name: "Matt".to_string(),
            last_name: "Dragon".to_string(),
            email: "foo@example.com".to_string(),
            cell: "555-555-5555".to_string(),
            address: Address {
                line1: "123 Main St".to_string(),
                line2: String::new(),
                city: "Anytown".to_string(),
                state: "NJ".to_string(),
                zip: "55555".to_string(),
            },
        }
    }
}

/// Result of provisioning.
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned {
    /// The member's resolved key.
    pub key: Key,
    pub member: Member,
    /// Whether this call created the member.
    pub created: bool,
}

/// Member provisioning service.
pub struct MemberProvisioner {
    store: Arc<dyn Datastore>,
    defaults: MemberDefaults,
}

impl MemberProvisioner {
    pub fn new(store: Arc<dyn Datastore>, defaults: MemberDefaults) -> Self {
        Self { store, defaults }
    }

    /// Look up the member for an identity without creating one.
    pub async fn find(&self, identity: &Identity) -> AppResult<Option<(Key, Member)>> {
        let query = Query::new(Member::KIND)
            .ancestor(&user_key(identity))
            .filter_eq(Member::USER_ID, identity.id.as_str());
        let mut found = self.store.get_all_entities::<Member>(&query).await?;

        if found.len() > 1 {
            tracing::warn!(
                user_id = %identity.id,
                count = found.len(),
                "multiple members for one identity; using the first"
            );
        }
        Ok((!found.is_empty()).then(|| found.swap_remove(0)))
    }

    /// Return the identity's member, creating it and its location if needed.
    pub async fn find_or_create(&self, identity: &Identity) -> AppResult<Provisioned> {
        if let Some((key, member)) = self.find(identity).await? {
            tracing::info!(
                user_id = %identity.id,
                member = %key,
                home_address = ?member.home_address,
                "existing member found"
            );
            return Ok(Provisioned {
                key,
                member,
                created: false,
            });
        }

        tracing::info!(user_id = %identity.id, "existing member not found; creating");
        self.create(identity).await
    }

    async fn create(&self, identity: &Identity) -> AppResult<Provisioned> {
        let now = Utc::now();

        // No member key exists yet, so neither entity can name its creator.
        let mut location = Location {
            address: self.defaults.address.clone(),
            audit: Audit::bootstrap(now),
        };
        let mut member = Member {
            first_name: self.defaults.first_name.clone(),
            last_name: self.defaults.last_name.clone(),
            email: self.defaults.email.clone(),
            cell: self.defaults.cell.clone(),
            user_id: identity.id.clone(),
            audit: Audit::bootstrap(now),
            ..Default::default()
        };

        let member_key = step(
            "Trying to put Member",
            self.store
                .put_entity(
                    &Key::incomplete(Member::KIND, Some(&user_key(identity))),
                    &member,
                )
                .await,
        )?;

        location.audit.attribute_to(&member_key);
        let location_key = step(
            "Trying to put Location",
            self.store
                .put_entity(&Key::incomplete(Location::KIND, None), &location)
                .await,
        )?;

        member.home_address = Some(location_key.clone());
        member.audit.attribute_to(&member_key);
        step(
            "Trying to put Member again",
            self.store.put_entity(&member_key, &member).await,
        )?;

        tracing::info!(
            user_id = %identity.id,
            member = %member_key,
            location = %location_key,
            "member provisioned"
        );
        Ok(Provisioned {
            key: member_key,
            member,
            created: true,
        })
    }

    /// Load the location a member's home address points at.
    pub async fn resolve_home_address(&self, member: &Member) -> AppResult<Option<(Key, Location)>> {
        let Some(key) = &member.home_address else {
            return Ok(None);
        };
        let location = self.store.get_entity::<Location>(key).await?;
        Ok(Some((key.clone(), location)))
    }
}

fn step<T>(attempt: &'static str, result: StoreResult<T>) -> AppResult<T> {
    result.map_err(|err| {
        tracing::error!(error = %err, "While attempting: {attempt}");
        err.into()
    })
}
