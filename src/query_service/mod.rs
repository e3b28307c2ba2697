pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpQueryService;
pub use traits::QueryService;
pub use types::{ExpandQueryRequest, QueryExpansion, SearchWithResponsesRequest};
