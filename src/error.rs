use crate::search::Stage;
use std::time::Duration;
use thiserror::Error;

/// Broad classes a UI layer reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught locally, never reached the network.
    Validation,
    /// Non-2xx, timeout or transport failure.
    Service,
    /// The service answered with something we can't read as listings.
    Shape,
    /// The caller drove the session out of order.
    Usage,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a search query")]
    EmptyQuery,
    #[error("Please answer all questions")]
    UnansweredQuestions { unanswered: Vec<usize> },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response is a JSON string that itself decodes to a string")]
    NestedEncoding,
    #[error("response is a JSON {found}, expected listings")]
    UnrecognizedShape { found: &'static str },
    #[error("listing {index} is a JSON {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
    #[error("`{field}` field is present but is not an array")]
    BadWrapper { field: &'static str },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("API error: {status}")]
    Service { status: u16 },
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected response: {0}")]
    Shape(#[from] DecodeError),
    #[error("a request is already in flight")]
    Busy,
    #[error("cannot {action} while {stage}")]
    InvalidStage { action: &'static str, stage: Stage },
    #[error("no clarifying question at index {index} (have {len})")]
    NoSuchQuestion { index: usize, len: usize },
    #[error("no listing at index {index} (have {len})")]
    NoSuchListing { index: usize, len: usize },
    #[error("reply does not belong to the outstanding request")]
    StaleReply,
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation(_) => ErrorKind::Validation,
            SearchError::Service { .. }
            | SearchError::Timeout(_)
            | SearchError::Transport(_) => ErrorKind::Service,
            SearchError::Shape(_) => ErrorKind::Shape,
            SearchError::Busy
            | SearchError::InvalidStage { .. }
            | SearchError::NoSuchQuestion { .. }
            | SearchError::NoSuchListing { .. }
            | SearchError::StaleReply => ErrorKind::Usage,
        }
    }

    /// Whether the failure came back from (or on the way to) the query service.
    pub fn is_remote(&self) -> bool {
        matches!(self.kind(), ErrorKind::Service | ErrorKind::Shape)
    }
}
