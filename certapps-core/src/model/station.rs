use crate::audit::{impl_audited, Audit};
use crate::model::Address;
use chrono::serde::ts_microseconds;
use chrono::{DateTime, Utc};
use datastore::{Entity, Key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reference to a team by numeric id, as sent by the web client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "KeyID", default)]
    pub key_id: i64,
}

impl Team {
    /// Kind of team keys.
    pub const KIND: &'static str = "Team";

    /// Reference team `key_id`.
    pub fn new(key_id: i64) -> Self {
        Self { key_id }
    }

    /// Root key for this team.
    pub fn key(&self) -> Key {
        Key::with_id(Self::KIND, self.key_id, None)
    }
}

/// A comfort station run by a team.
///
/// Each station is its own entity group; stations are found across groups by
/// their team reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ComfortStation {
    pub name: String,
    pub notes: String,

    /// Ids of members allowed to edit this station.
    pub edit_keys: BTreeSet<i64>,
    pub team_key: Option<Key>,

    #[serde(flatten)]
    pub address: Address,

    #[serde(flatten)]
    pub audit: Audit,
}

impl ComfortStation {
    /// Property holding the owning team's key.
    pub const TEAM_KEY: &'static str = "TeamKey";
}

impl Entity for ComfortStation {
    const KIND: &'static str = "ComfortStation";
}

/// An opening window for a comfort station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ComfortStationHours {
    #[serde(with = "ts_microseconds")]
    pub open: DateTime<Utc>,
    #[serde(with = "ts_microseconds")]
    pub close: DateTime<Utc>,

    pub team_key: Option<Key>,
    pub comfort_station_key: Option<Key>,

    #[serde(flatten)]
    pub audit: Audit,
}

impl ComfortStationHours {
    /// Property holding the station's key.
    pub const COMFORT_STATION_KEY: &'static str = "ComfortStationKey";
}

impl Entity for ComfortStationHours {
    const KIND: &'static str = "ComfortStationHours";
}

impl_audited!(ComfortStation, ComfortStationHours);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_key() {
        let key = Team::new(42).key();
        assert_eq!(key.kind(), "Team");
        assert_eq!(key.id(), Some(42));
        assert!(key.parent().is_none());
    }

    #[test]
    fn test_station_decodes_client_payload() {
        let json = serde_json::json!({
            "Name": "Firehouse",
            "Notes": "side door",
            "City": "Anytown",
            "KeyID": 12
        });
        let station: ComfortStation = serde_json::from_value(json).unwrap();
        assert_eq!(station.name, "Firehouse");
        assert_eq!(station.address.city, "Anytown");
        assert!(station.team_key.is_none());
        assert!(station.edit_keys.is_empty());
    }
}
