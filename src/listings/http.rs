use super::traits::ListingStore;
use super::types::{ListingDraft, ListingFilter, ListingRecord};
use super::StoreError;
use crate::auth::AuthContext;
use crate::config::ListingsConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Listing store reached over its REST API.
///
/// Requests carry the signed-in user's bearer token when there is one;
/// create, update and delete refuse to run without it.
pub struct HttpListingStore {
    client: Client,
    base_url: String,
    auth: Arc<AuthContext>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl HttpListingStore {
    pub fn new(config: &ListingsConfig, auth: Arc<AuthContext>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/properties{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_sign_in(&self) -> Result<(), StoreError> {
        if self.auth.is_signed_in() {
            Ok(())
        } else {
            Err(StoreError::Unauthenticated)
        }
    }

    async fn send(&self, request: RequestBuilder, id: Option<&str>) -> Result<String, StoreError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
        }
        if !status.is_success() {
            warn!("Listing API returned status: {}", status);
            return Err(StoreError::Api {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        debug!("Listing API returned {} bytes", body.len());
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, id: Option<&str>) -> Result<T, StoreError> {
        let body = self.send(request, id).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// `detail` from a `{"detail": ...}` error body, if the API sent one.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl ListingStore for HttpListingStore {
    async fn list(&self) -> Result<Vec<ListingRecord>, StoreError> {
        self.fetch(self.client.get(self.url("")), None).await
    }

    async fn get(&self, id: &str) -> Result<ListingRecord, StoreError> {
        self.fetch(self.client.get(self.url(&format!("/{}", id))), Some(id))
            .await
    }

    async fn create(&self, draft: &ListingDraft) -> Result<ListingRecord, StoreError> {
        self.require_sign_in()?;
        draft.validate()?;

        let record: ListingRecord = self
            .fetch(self.client.post(self.url("")).json(draft), None)
            .await?;
        info!("Created listing {}", record.id);
        Ok(record)
    }

    async fn update(&self, id: &str, draft: &ListingDraft) -> Result<ListingRecord, StoreError> {
        self.require_sign_in()?;
        draft.validate()?;

        let record = self
            .fetch(self.client.put(self.url(&format!("/{}", id))).json(draft), Some(id))
            .await?;
        info!("Updated listing {}", id);
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.require_sign_in()?;

        self.send(self.client.delete(self.url(&format!("/{}", id))), Some(id))
            .await?;
        info!("Deleted listing {}", id);
        Ok(())
    }

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<ListingRecord>, StoreError> {
        filter.validate()?;
        let pairs = filter.to_query_pairs();
        info!("Searching listings with {} filter(s)", pairs.len());

        self.fetch(self.client.get(self.url("/search")).query(&pairs), None)
            .await
    }
}
