//! Comfort-station JSON API.

use super::{App, HandlerResponse, Method, Request};
use crate::error::{AppError, AppResult};
use crate::model::{ComfortStation, Keyed, Team};
use serde::{Deserialize, Serialize};
use serde_json::json;

const STATION_PATH: &str = "/api/comfort-station";

/// Posted station plus the team it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationPost {
    #[serde(rename = "ComfortStation", default)]
    pub comfort_station: Option<StationInput>,
    #[serde(rename = "Team", default)]
    pub team: Option<Team>,
}

/// A station as sent by the client; a non-zero `KeyID` names an existing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationInput {
    #[serde(rename = "KeyID", default)]
    pub key_id: i64,
    #[serde(flatten)]
    pub station: ComfortStation,
}

impl StationPost {
    /// Decode a request body. An empty body is not an error and yields an
    /// empty post.
    pub fn decode(body: &str) -> AppResult<Self> {
        match serde_json::from_str(body) {
            Ok(post) => Ok(post),
            Err(err) if err.is_eof() && body.trim().is_empty() => {
                tracing::info!("empty station post body");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn team_id(request: &Request) -> AppResult<i64> {
    let team_id = match request.int_param("teamID")? {
        Some(id) => Some(id),
        None => request.int_param("id")?,
    };
    team_id.ok_or_else(|| AppError::invalid("missing teamID"))
}

fn locations(stations: Vec<Keyed<ComfortStation>>) -> AppResult<HandlerResponse> {
    Ok(HandlerResponse::Json(json!({ "locations": serde_json::to_value(stations)? })))
}

impl App {
    /// `GET|POST /api/comfort-station[/...]`.
    pub(super) async fn comfort_station(&self, request: &Request) -> AppResult<HandlerResponse> {
        match request.method {
            Method::Post => self.comfort_station_save(request).await,
            Method::Get if request.path.ends_with('/') => {
                tracing::debug!("comfort station collection");
                let stations = self.stations.list_by_team(team_id(request)?).await?;
                locations(stations)
            }
            Method::Get => self.comfort_station_get(request).await,
        }
    }

    async fn comfort_station_get(&self, request: &Request) -> AppResult<HandlerResponse> {
        let station_id = match request.int_param("id")? {
            Some(id) => id,
            None => request
                .path
                .strip_prefix(STATION_PATH)
                .and_then(|rest| rest.strip_prefix('/'))
                .ok_or_else(|| AppError::invalid("missing station id"))?
                .parse()
                .map_err(|_| AppError::invalid(format!("bad station path: {}", request.path)))?,
        };

        let station = self.stations.get(station_id).await?;
        Ok(HandlerResponse::Json(json!({ "ComfortStation": serde_json::to_value(station)? })))
    }

    async fn comfort_station_save(&self, request: &Request) -> AppResult<HandlerResponse> {
        let post = StationPost::decode(&request.body)?;
        let (Some(input), Some(team)) = (post.comfort_station.clone(), post.team) else {
            // Nothing to save; echo what was received.
            return Ok(HandlerResponse::Json(serde_json::to_value(post)?));
        };

        let identity = request
            .identity
            .as_ref()
            .ok_or_else(|| AppError::invalid("sign in to save a comfort station"))?;
        let actor = self.members.find_or_create(identity).await?;

        let existing = (input.key_id != 0).then_some(input.key_id);
        let saved = self
            .stations
            .save(input.station, existing, &team, &actor.key)
            .await?;
        Ok(HandlerResponse::Json(json!({ "ComfortStation": serde_json::to_value(saved)? })))
    }

    /// `GET /api/comfort-stations`: stations of the requested team.
    pub(super) async fn comfort_stations(&self, request: &Request) -> AppResult<HandlerResponse> {
        let stations = self.stations.list_by_team(team_id(request)?).await?;
        locations(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_benign() {
        assert_eq!(StationPost::decode("").unwrap(), StationPost::default());
        assert_eq!(StationPost::decode("  \n").unwrap(), StationPost::default());
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        assert!(matches!(
            StationPost::decode("{\"Team\":"),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_post() {
        let post = StationPost::decode(
            r#"{"ComfortStation": {"KeyID": 3, "Name": "Depot"}, "Team": {"KeyID": 42}}"#,
        )
        .unwrap();
        let input = post.comfort_station.unwrap();
        assert_eq!(input.key_id, 3);
        assert_eq!(input.station.name, "Depot");
        assert_eq!(post.team, Some(Team::new(42)));
    }

    #[test]
    fn test_team_id_param_names() {
        assert_eq!(team_id(&Request::get("/").with_query("teamID", "4")).unwrap(), 4);
        assert_eq!(team_id(&Request::get("/").with_query("id", "5")).unwrap(), 5);
        assert!(team_id(&Request::get("/")).is_err());
    }

    #[test]
    fn test_team_id_ignores_id_when_team_given() {
        let request = Request::get("/").with_query("teamID", "4").with_query("id", "x");
        assert_eq!(team_id(&request).unwrap(), 4);
        assert!(team_id(&Request::get("/").with_query("id", "x")).is_err());
    }
}
