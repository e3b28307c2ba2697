pub mod http;
pub mod saved;
pub mod traits;
pub mod types;

pub use http::HttpListingStore;
pub use saved::InMemorySavedStore;
pub use traits::{ListingStore, SavedStore};
pub use types::{HousingPriority, ListingDraft, ListingFilter, ListingRecord, SavedSearch};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("you need to sign in first")]
    Unauthenticated,
    #[error("listing {id} was not found")]
    NotFound { id: String },
    #[error("{0}")]
    Invalid(String),
    #[error("listing API error {}: {}", .status, .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },
    #[error("listing API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("listing API returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),
}
