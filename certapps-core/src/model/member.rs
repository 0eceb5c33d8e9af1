use crate::audit::{impl_audited, Audit};
use datastore::{Entity, Key};
use serde::{Deserialize, Serialize};

/// Postal address value, embedded wherever an address is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// A member's home address.
///
/// Owned by exactly one member through [`Member::home_address`]; the audit
/// fields point back at that member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(flatten)]
    pub address: Address,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Entity for Location {
    const KIND: &'static str = "Location";
}

/// Profile linked to one external identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Member {
    pub first_name: String,
    pub last_name: String,
    pub cell: String,
    pub home_phone: String,

    pub email: String,
    pub email2: String,

    pub show_cell: bool,
    pub show_email: bool,

    pub home_address: Option<Key>,
    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(flatten)]
    pub audit: Audit,
}

impl Member {
    /// Property holding the external identity id.
    pub const USER_ID: &'static str = "UserID";
}

impl Entity for Member {
    const KIND: &'static str = "Member";
}

impl_audited!(Member, Location);
