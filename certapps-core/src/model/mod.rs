//! Persisted entity types.
//!
//! Property names are PascalCase so stored entities and API payloads keep the
//! field names the web client already uses.

mod greeting;
mod keyed;
mod member;
mod station;

pub use greeting::Greeting;
pub use keyed::Keyed;
pub use member::{Address, Location, Member};
pub use station::{ComfortStation, ComfortStationHours, Team};
