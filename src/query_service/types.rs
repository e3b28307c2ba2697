use serde::{Deserialize, Serialize};

/// Body of `POST /api/expand-query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpandQueryRequest {
    pub query: String,
}

/// Reply to `expand-query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryExpansion {
    pub expanded_query: String,
    pub clarifying_questions: Vec<String>,
}

/// Body of `POST /api/search-with-responses`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchWithResponsesRequest {
    pub original_query: String,
    /// Index-aligned with the clarifying questions
    pub responses: Vec<String>,
}
