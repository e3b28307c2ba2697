pub mod auth;
pub mod config;
pub mod error;
pub mod listings;
pub mod models;
pub mod query_service;
pub mod search;
pub mod telemetry;

pub use error::{DecodeError, ErrorKind, SearchError, ValidationError};
pub use models::{ListingStatus, Location, PropertyListing};
pub use search::{GuidedSearch, SearchSession, Stage};
