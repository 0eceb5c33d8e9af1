//! Comfort-station directory.
//!
//! Every station is the root of its own entity group. Listing by team is a
//! cross-group query on the station's team reference and may lag recent
//! writes; loading one station by key is always current.

use crate::audit::Audit;
use crate::error::{AppError, AppResult};
use crate::model::{ComfortStation, ComfortStationHours, Keyed, Team};
use chrono::{DateTime, Utc};
use datastore::{Datastore, DatastoreExt, Entity, Key, Query};
use std::sync::Arc;

/// Key of the station with numeric id `station_id`.
pub fn station_key(station_id: i64) -> Key {
    Key::with_id(ComfortStation::KIND, station_id, None)
}

/// Comfort-station directory service.
pub struct ComfortStationDirectory {
    store: Arc<dyn Datastore>,
}

impl ComfortStationDirectory {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// All stations belonging to a team, each with its key attached.
    pub async fn list_by_team(&self, team_id: i64) -> AppResult<Vec<Keyed<ComfortStation>>> {
        let team_key = Team::new(team_id).key();
        let query = Query::new(ComfortStation::KIND).filter_eq(ComfortStation::TEAM_KEY, &team_key);

        let stations: Vec<Keyed<ComfortStation>> = self
            .store
            .get_all_entities::<ComfortStation>(&query)
            .await?
            .into_iter()
            .map(Keyed::from)
            .collect();

        tracing::debug!(team = %team_key, count = stations.len(), "stations listed");
        Ok(stations)
    }

    /// One station by numeric id.
    pub async fn get(&self, station_id: i64) -> AppResult<Keyed<ComfortStation>> {
        let key = station_key(station_id);
        let station = self.store.get_entity::<ComfortStation>(&key).await?;
        Ok(Keyed::new(key, station))
    }

    /// Create or update a station for `team` on behalf of `actor`.
    ///
    /// `existing` names the station to update; `None` creates a new one under
    /// an incomplete key. Creation audit fields and stored editors survive
    /// updates. Editors sent with `station` are ignored; only the actor is
    /// added.
    pub async fn save(
        &self,
        mut station: ComfortStation,
        existing: Option<i64>,
        team: &Team,
        actor: &Key,
    ) -> AppResult<Keyed<ComfortStation>> {
        let now = Utc::now();
        let key = match existing {
            Some(id) => {
                let key = station_key(id);
                let stored = self.store.get_entity::<ComfortStation>(&key).await?;
                station.audit = stored.audit;
                station.audit.touch(actor, now);
                station.edit_keys = stored.edit_keys;
                key
            }
            None => {
                station.audit = Audit::new(Some(actor), now);
                station.edit_keys.clear();
                Key::incomplete(ComfortStation::KIND, None)
            }
        };

        station.team_key = Some(team.key());
        if let Some(actor_id) = actor.id() {
            station.edit_keys.insert(actor_id);
        }

        let key = self.store.put_entity(&key, &station).await?;
        tracing::info!(station = %key, team = team.key_id, "station saved");
        Ok(Keyed::new(key, station))
    }

    /// Record an opening window for a station.
    pub async fn add_hours(
        &self,
        station: &Keyed<ComfortStation>,
        open: DateTime<Utc>,
        close: DateTime<Utc>,
        actor: &Key,
    ) -> AppResult<Keyed<ComfortStationHours>> {
        if close < open {
            return Err(AppError::invalid(format!(
                "station hours close ({close}) before they open ({open})"
            )));
        }

        let hours = ComfortStationHours {
            open,
            close,
            team_key: station.entity.team_key.clone(),
            comfort_station_key: Some(station.key.clone()),
            audit: Audit::new(Some(actor), Utc::now()),
        };
        let key = self
            .store
            .put_entity(&Key::incomplete(ComfortStationHours::KIND, None), &hours)
            .await?;
        Ok(Keyed::new(key, hours))
    }

    /// All opening windows recorded for a station, earliest first.
    pub async fn hours_for(&self, station_key: &Key) -> AppResult<Vec<Keyed<ComfortStationHours>>> {
        let query = Query::new(ComfortStationHours::KIND)
            .filter_eq(ComfortStationHours::COMFORT_STATION_KEY, station_key)
            .order("Open");
        Ok(self
            .store
            .get_all_entities::<ComfortStationHours>(&query)
            .await?
            .into_iter()
            .map(Keyed::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use datastore::{MemoryDatastore, StoreError};

    fn directory() -> ComfortStationDirectory {
        ComfortStationDirectory::new(Arc::new(MemoryDatastore::new()))
    }

    fn actor() -> Key {
        Key::with_id("Member", 77, None)
    }

    #[tokio::test]
    async fn test_save_new_station() {
        let stations = directory();
        let station = ComfortStation {
            name: "Firehouse".to_string(),
            ..Default::default()
        };

        let saved = stations.save(station, None, &Team::new(42), &actor()).await.unwrap();
        assert!(saved.key.is_complete());
        assert_eq!(saved.key_id, saved.key.id().unwrap());
        assert_eq!(saved.entity.team_key, Some(Team::new(42).key()));
        assert_eq!(saved.entity.audit.created_by, Some(actor()));
        assert!(saved.entity.edit_keys.contains(&77));

        let loaded = stations.get(saved.key_id).await.unwrap();
        assert_eq!(loaded.entity.name, "Firehouse");
    }

    #[tokio::test]
    async fn test_update_keeps_creation_audit() {
        let stations = directory();
        let first = stations
            .save(ComfortStation::default(), None, &Team::new(1), &actor())
            .await
            .unwrap();

        let editor = Key::with_id("Member", 88, None);
        let update = ComfortStation {
            name: "Renamed".to_string(),
            ..Default::default()
        };
        let second = stations
            .save(update, Some(first.key_id), &Team::new(1), &editor)
            .await
            .unwrap();

        assert_eq!(second.key, first.key);
        assert_eq!(second.entity.audit.created_by, Some(actor()));
        assert_eq!(second.entity.audit.modified_by, Some(editor));
        assert_eq!(second.entity.name, "Renamed");
        assert_eq!(second.entity.edit_keys.iter().copied().collect::<Vec<_>>(), [77, 88]);
    }

    #[tokio::test]
    async fn test_client_editors_are_ignored() {
        let stations = directory();
        let forged = ComfortStation {
            edit_keys: [1, 2, 3].into_iter().collect(),
            ..Default::default()
        };
        let created = stations.save(forged.clone(), None, &Team::new(1), &actor()).await.unwrap();
        assert_eq!(created.entity.edit_keys.iter().copied().collect::<Vec<_>>(), [77]);

        let editor = Key::with_id("Member", 88, None);
        let updated = stations
            .save(forged, Some(created.key_id), &Team::new(1), &editor)
            .await
            .unwrap();
        assert_eq!(updated.entity.edit_keys.iter().copied().collect::<Vec<_>>(), [77, 88]);
        let stored = stations.get(created.key_id).await.unwrap();
        assert_eq!(stored.entity.edit_keys, updated.entity.edit_keys);
    }

    #[tokio::test]
    async fn test_update_missing_station() {
        let stations = directory();
        let err = stations
            .save(ComfortStation::default(), Some(404), &Team::new(1), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NoSuchEntity { .. })));
    }

    #[tokio::test]
    async fn test_hours() {
        let stations = directory();
        let station = stations
            .save(ComfortStation::default(), None, &Team::new(5), &actor())
            .await
            .unwrap();

        let open = Utc::now();
        stations
            .add_hours(&station, open + Duration::hours(24), open + Duration::hours(30), &actor())
            .await
            .unwrap();
        stations
            .add_hours(&station, open, open + Duration::hours(6), &actor())
            .await
            .unwrap();

        let hours = stations.hours_for(&station.key).await.unwrap();
        assert_eq!(hours.len(), 2);
        assert!(hours[0].entity.open < hours[1].entity.open);
        assert_eq!(hours[0].entity.team_key, Some(Team::new(5).key()));

        let err = stations
            .add_hours(&station, open, open - Duration::hours(1), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest { .. }));
    }
}
