use super::traits::QueryService;
use super::types::{ExpandQueryRequest, QueryExpansion, SearchWithResponsesRequest};
use crate::config::QueryServiceConfig;
use crate::error::{DecodeError, SearchError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const EXPAND_PATH: &str = "api/expand-query";
const SEARCH_PATH: &str = "api/search-with-responses";

/// reqwest-backed client for the query service.
///
/// Every call is bounded by the configured timeout and is never retried.
pub struct HttpQueryService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpQueryService {
    pub fn new(config: &QueryServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("home-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, SearchError> {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        self.read_body(response).await
    }

    async fn read_body(&self, response: Response) -> Result<String, SearchError> {
        let status = response.status();
        if !status.is_success() {
            warn!("Query service returned status: {}", status);
            return Err(SearchError::Service {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        debug!("Received {} bytes", body.len());
        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> SearchError {
        if err.is_timeout() {
            warn!("Query service call timed out after {:?}", self.timeout);
            SearchError::Timeout(self.timeout)
        } else {
            warn!("Query service call failed: {}", err);
            SearchError::Transport(err)
        }
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn expand_query(
        &self,
        request: &ExpandQueryRequest,
    ) -> Result<QueryExpansion, SearchError> {
        info!("Expanding query ({} chars)", request.query.len());

        let body = self.post_json(EXPAND_PATH, request).await?;
        let expansion: QueryExpansion =
            serde_json::from_str(&body).map_err(DecodeError::InvalidJson)?;

        info!(
            "Query expanded with {} clarifying question(s)",
            expansion.clarifying_questions.len()
        );
        Ok(expansion)
    }

    async fn search_with_responses(
        &self,
        request: &SearchWithResponsesRequest,
    ) -> Result<Value, SearchError> {
        info!("Searching with {} response(s)", request.responses.len());

        let body = self.post_json(SEARCH_PATH, request).await?;
        let payload: Value = serde_json::from_str(&body).map_err(DecodeError::InvalidJson)?;
        Ok(payload)
    }

    fn service_name(&self) -> &'static str {
        "HTTP query service"
    }
}
