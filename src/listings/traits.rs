use super::types::{ListingDraft, ListingFilter, ListingRecord, SavedSearch};
use super::StoreError;
use async_trait::async_trait;

/// Persistent store of property listings.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn list(&self) -> Result<Vec<ListingRecord>, StoreError>;

    async fn get(&self, id: &str) -> Result<ListingRecord, StoreError>;

    async fn create(&self, draft: &ListingDraft) -> Result<ListingRecord, StoreError>;

    async fn update(&self, id: &str, draft: &ListingDraft) -> Result<ListingRecord, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<ListingRecord>, StoreError>;
}

/// Per-user bookmarks: saved listings and saved searches.
///
/// Every operation acts for the currently signed-in user.
#[async_trait]
pub trait SavedStore: Send + Sync {
    async fn is_saved(&self, listing_id: &str) -> Result<bool, StoreError>;

    /// Returns false if the listing was already saved.
    async fn save(&self, listing_id: &str) -> Result<bool, StoreError>;

    /// Returns false if the listing was not saved.
    async fn unsave(&self, listing_id: &str) -> Result<bool, StoreError>;

    /// Saved listing ids, most recently saved first.
    async fn saved_listings(&self) -> Result<Vec<String>, StoreError>;

    async fn save_search(&self, name: &str, filter: &ListingFilter) -> Result<SavedSearch, StoreError>;

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, StoreError>;

    /// Flips the saved state and returns the new one.
    async fn toggle(&self, listing_id: &str) -> Result<bool, StoreError> {
        if self.is_saved(listing_id).await? {
            self.unsave(listing_id).await?;
            Ok(false)
        } else {
            self.save(listing_id).await?;
            Ok(true)
        }
    }
}
