//! Transport-agnostic request handling.
//!
//! An HTTP front end converts its requests into [`Request`] and writes back
//! the [`HandlerResponse`]. Failures become a 500 carrying the error message.

mod api;
mod guest;

pub use api::{StationInput, StationPost};
pub use guest::{render_guestbook, TemplateContext};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::guestbook::Guestbook;
use crate::identity::{Identity, IdentityProvider};
use crate::provisioning::MemberProvisioner;
use crate::stations::ComfortStationDirectory;
use datastore::Datastore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub body: String,
    /// Identity resolved by the front end, if signed in.
    pub identity: Option<Identity>,
}

impl Request {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            form: HashMap::new(),
            body: String::new(),
            identity: None,
        }
    }

    /// A GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// A POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a form field.
    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach the signed-in identity.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Path plus query string, used as the return target of login links.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let mut pairs: Vec<_> = self.query.iter().collect();
        pairs.sort();
        let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}?{}", self.path, query.join("&"))
    }

    /// A numeric parameter from the query string or form.
    pub fn int_param(&self, name: &str) -> AppResult<Option<i64>> {
        let Some(raw) = self.query.get(name).or_else(|| self.form.get(name)) else {
            return Ok(None);
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::invalid(format!("{name} is not an integer: {raw:?}")))
    }
}

/// Outcome of handling a request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResponse {
    Html(String),
    Json(Value),
    Redirect(String),
    Error { status: u16, message: String },
}

impl HandlerResponse {
    /// HTTP status code for this response.
    pub fn status(&self) -> u16 {
        match self {
            HandlerResponse::Html(_) | HandlerResponse::Json(_) => 200,
            HandlerResponse::Redirect(_) => 302,
            HandlerResponse::Error { status, .. } => *status,
        }
    }

    fn not_found(path: &str) -> Self {
        HandlerResponse::Error {
            status: 404,
            message: format!("no handler for {path}"),
        }
    }
}

impl From<AppError> for HandlerResponse {
    fn from(err: AppError) -> Self {
        HandlerResponse::Error {
            status: 500,
            message: err.to_string(),
        }
    }
}

/// The application: services wired to one store and identity provider.
pub struct App {
    identity: Arc<dyn IdentityProvider>,
    guestbook: Guestbook,
    members: MemberProvisioner,
    stations: ComfortStationDirectory,
}

impl App {
    /// Wire services from configuration.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Datastore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            identity,
            guestbook: Guestbook::new(store.clone(), config.guestbook_key(), config.greeting_limit),
            members: MemberProvisioner::new(store.clone(), config.member_defaults.clone()),
            stations: ComfortStationDirectory::new(store),
        }
    }

    pub fn guestbook(&self) -> &Guestbook {
        &self.guestbook
    }

    pub fn members(&self) -> &MemberProvisioner {
        &self.members
    }

    pub fn stations(&self) -> &ComfortStationDirectory {
        &self.stations
    }

    /// Route and handle one request.
    pub async fn handle(&self, request: &Request) -> HandlerResponse {
        tracing::debug!(method = ?request.method, path = %request.path, "request");

        let path = request.path.as_str();
        let result = match path {
            "/" => Ok(HandlerResponse::Redirect("/html/app.htm".to_string())),
            "/guest" => self.guest(request).await,
            "/sign" => self.sign(request).await,
            "/api/comfort-stations" => self.comfort_stations(request).await,
            _ if path == "/api/comfort-station" || path.starts_with("/api/comfort-station/") => {
                self.comfort_station(request).await
            }
            _ => return HandlerResponse::not_found(path),
        };

        result.unwrap_or_else(|err| {
            tracing::error!(path = %request.path, error = %err, "request failed");
            err.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_includes_sorted_query() {
        let request = Request::get("/guest").with_query("b", "2").with_query("a", "1");
        assert_eq!(request.url(), "/guest?a=1&b=2");
        assert_eq!(Request::get("/guest").url(), "/guest");
    }

    #[test]
    fn test_int_param() {
        let request = Request::get("/x").with_query("teamID", " 42 ").with_form("bad", "x");
        assert_eq!(request.int_param("teamID").unwrap(), Some(42));
        assert_eq!(request.int_param("missing").unwrap(), None);
        assert!(request.int_param("bad").is_err());
    }

    #[test]
    fn test_error_response_carries_message() {
        let response: HandlerResponse = AppError::invalid("nope").into();
        assert_eq!(response.status(), 500);
        assert_eq!(
            response,
            HandlerResponse::Error {
                status: 500,
                message: "invalid request: nope".to_string()
            }
        );
    }
}
