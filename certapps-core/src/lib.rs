//! Membership, guestbook and comfort-station services.
//!
//! This crate provides:
//! - Audit fields shared by every persisted entity
//! - A guestbook kept in one entity group for strongly consistent listings
//! - Find-or-create provisioning of members and their home locations
//! - A comfort-station directory queried by team across entity groups
//! - Transport-agnostic request handlers for the web client
//!
//! # Quick Start
//!
//! ```ignore
//! use certapps_core::{App, AppConfig, Request};
//! use certapps_core::identity::LocalIdentityProvider;
//! use datastore::MemoryDatastore;
//! use std::sync::Arc;
//!
//! let app = App::new(
//!     &AppConfig::from_env()?,
//!     Arc::new(MemoryDatastore::new()),
//!     Arc::new(LocalIdentityProvider::default()),
//! );
//! let page = app.handle(&Request::get("/guest")).await;
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod guestbook;
pub mod handlers;
pub mod identity;
pub mod model;
pub mod provisioning;
pub mod stations;
pub mod testing;

// Primary public API
pub use config::{AppConfig, DEFAULT_GUESTBOOK_KEY};
pub use error::{AppError, AppResult};
pub use guestbook::Guestbook;
pub use handlers::{App, HandlerResponse, Method, Request};
pub use identity::{Identity, IdentityProvider};
pub use provisioning::{MemberDefaults, MemberProvisioner, Provisioned};
pub use stations::ComfortStationDirectory;
pub use testing::TestHarness;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{Audit, Audited};
    pub use crate::config::AppConfig;
    pub use crate::error::{AppError, AppResult};
    pub use crate::handlers::{App, HandlerResponse, Request};
    pub use crate::identity::{Identity, IdentityProvider, LocalIdentityProvider};
    pub use crate::model::{ComfortStation, Greeting, Keyed, Location, Member, Team};
    pub use crate::{ComfortStationDirectory, Guestbook, MemberProvisioner};
}
