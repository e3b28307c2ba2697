use super::session::{Dispatch, SearchSession, Ticket};
use crate::error::SearchError;
use crate::query_service::QueryService;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on each query-service call. Nothing is retried.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives a `SearchSession` against a `QueryService`.
///
/// Holding `&mut self` across each call means a session can only ever have
/// one request outstanding.
pub struct GuidedSearch<S: QueryService> {
    service: S,
    session: SearchSession,
    call_timeout: Duration,
}

impl<S: QueryService> GuidedSearch<S> {
    pub fn new(service: S) -> Self {
        Self::with_timeout(service, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(service: S, call_timeout: Duration) -> Self {
        Self {
            service,
            session: SearchSession::new(),
            call_timeout,
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    /// Expands `query` and moves to clarifying questions on success.
    pub async fn submit_query(&mut self, query: &str) -> Result<(), SearchError> {
        let Dispatch { ticket, request } = self.session.submit_query(query)?;
        info!("Sending query to {}", self.service.service_name());

        let mut guard = InFlight::new(&mut self.session, ticket);
        let reply = bounded(self.call_timeout, self.service.expand_query(&request)).await;
        guard.session.apply_expansion(ticket, reply)
    }

    pub fn set_response(&mut self, index: usize, value: impl Into<String>) -> Result<(), SearchError> {
        self.session.set_response(index, value)
    }

    /// Sends the answers and, on success, returns how many listings came back.
    pub async fn submit_responses(&mut self) -> Result<usize, SearchError> {
        let Dispatch { ticket, request } = self.session.submit_responses()?;
        info!("Sending answers to {}", self.service.service_name());

        let mut guard = InFlight::new(&mut self.session, ticket);
        let reply = bounded(self.call_timeout, self.service.search_with_responses(&request)).await;
        guard.session.apply_results(ticket, reply)
    }

    pub fn next_image(&mut self, listing: usize) -> Result<usize, SearchError> {
        self.session.next_image(listing)
    }

    pub fn previous_image(&mut self, listing: usize) -> Result<usize, SearchError> {
        self.session.previous_image(listing)
    }

    pub fn start_over(&mut self) {
        self.session.start_over();
    }

    pub fn new_search(&mut self) {
        self.session.new_search();
    }
}

async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, SearchError>
where
    F: Future<Output = Result<T, SearchError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(reply) => reply,
        Err(_) => {
            warn!("Query service call exceeded {:?}", limit);
            Err(SearchError::Timeout(limit))
        }
    }
}

/// Releases the session's outstanding ticket if the call future is dropped
/// before its reply is applied.
struct InFlight<'a> {
    session: &'a mut SearchSession,
    ticket: Ticket,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a mut SearchSession, ticket: Ticket) -> Self {
        Self { session, ticket }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.abandon(self.ticket) {
            warn!("Guided search call abandoned before it completed");
        }
    }
}
