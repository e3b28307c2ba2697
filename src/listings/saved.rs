use super::traits::SavedStore;
use super::types::{ListingFilter, SavedSearch};
use super::StoreError;
use crate::auth::{AuthContext, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Bookmarks {
    /// Most recent first
    listings: Vec<String>,
    searches: Vec<SavedSearch>,
}

/// Saved-item store kept in process memory, keyed by user id.
pub struct InMemorySavedStore {
    auth: Arc<AuthContext>,
    bookmarks: RwLock<HashMap<String, Bookmarks>>,
}

impl InMemorySavedStore {
    pub fn new(auth: Arc<AuthContext>) -> Self {
        Self {
            auth,
            bookmarks: RwLock::new(HashMap::new()),
        }
    }

    fn user(&self) -> Result<User, StoreError> {
        if !self.auth.is_signed_in() {
            return Err(StoreError::Unauthenticated);
        }
        self.auth.current_user().ok_or(StoreError::Unauthenticated)
    }
}

#[async_trait]
impl SavedStore for InMemorySavedStore {
    async fn is_saved(&self, listing_id: &str) -> Result<bool, StoreError> {
        let user = self.user()?;
        let bookmarks = self.bookmarks.read().await;
        Ok(bookmarks
            .get(&user.id)
            .map_or(false, |saved| saved.listings.iter().any(|id| id == listing_id)))
    }

    async fn save(&self, listing_id: &str) -> Result<bool, StoreError> {
        let user = self.user()?;
        let mut bookmarks = self.bookmarks.write().await;
        let saved = bookmarks.entry(user.id).or_default();

        if saved.listings.iter().any(|id| id == listing_id) {
            return Ok(false);
        }
        saved.listings.insert(0, listing_id.to_string());
        debug!("Saved listing {}", listing_id);
        Ok(true)
    }

    async fn unsave(&self, listing_id: &str) -> Result<bool, StoreError> {
        let user = self.user()?;
        let mut bookmarks = self.bookmarks.write().await;
        let Some(saved) = bookmarks.get_mut(&user.id) else {
            return Ok(false);
        };

        let before = saved.listings.len();
        saved.listings.retain(|id| id != listing_id);
        Ok(saved.listings.len() != before)
    }

    async fn saved_listings(&self) -> Result<Vec<String>, StoreError> {
        let user = self.user()?;
        let bookmarks = self.bookmarks.read().await;
        Ok(bookmarks
            .get(&user.id)
            .map(|saved| saved.listings.clone())
            .unwrap_or_default())
    }

    /// Saving under an existing name replaces that search.
    async fn save_search(&self, name: &str, filter: &ListingFilter) -> Result<SavedSearch, StoreError> {
        let user = self.user()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("a saved search needs a name".to_string()));
        }
        filter.validate()?;

        let search = SavedSearch {
            name: name.to_string(),
            filter: filter.clone(),
            saved_at: Utc::now(),
        };

        let mut bookmarks = self.bookmarks.write().await;
        let saved = bookmarks.entry(user.id).or_default();
        saved.searches.retain(|existing| existing.name != search.name);
        saved.searches.push(search.clone());
        Ok(search)
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, StoreError> {
        let user = self.user()?;
        let bookmarks = self.bookmarks.read().await;
        Ok(bookmarks
            .get(&user.id)
            .map(|saved| saved.searches.clone())
            .unwrap_or_default())
    }
}
