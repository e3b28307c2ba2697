use super::types::{ExpandQueryRequest, QueryExpansion, SearchWithResponsesRequest};
use crate::error::SearchError;
use async_trait::async_trait;
use serde_json::Value;

/// The natural-language query service behind guided search.
///
/// `search_with_responses` hands back the payload untouched; its shape varies
/// by backend and is normalized by the search session.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn expand_query(&self, request: &ExpandQueryRequest)
        -> Result<QueryExpansion, SearchError>;

    async fn search_with_responses(
        &self,
        request: &SearchWithResponsesRequest,
    ) -> Result<Value, SearchError>;

    /// Name used in logs
    fn service_name(&self) -> &'static str;
}
