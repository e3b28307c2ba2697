use super::carousel::ImageCarousel;
use super::normalize::normalize_listings;
use crate::error::{SearchError, ValidationError};
use crate::models::PropertyListing;
use crate::query_service::{ExpandQueryRequest, QueryExpansion, SearchWithResponsesRequest};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Where a guided search currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Initial,
    AwaitingClarification,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Initial => "waiting for a query",
            Stage::AwaitingClarification => "awaiting clarification",
            Stage::Complete => "showing results",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ExpandQuery,
    SearchWithResponses,
}

/// Identifies one outstanding service call. Replies are only applied when
/// they carry the ticket the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    call: Call,
}

impl Ticket {
    pub fn call(&self) -> Call {
        self.call
    }
}

/// A request the caller should send, paired with the ticket to reply with.
#[derive(Debug, Clone)]
pub struct Dispatch<R> {
    pub ticket: Ticket,
    pub request: R,
}

/// State of one guided search: query, clarifying questions, answers, results.
///
/// Purely synchronous. Whoever owns the session sends the requests returned
/// by `submit_*` and feeds replies back through `apply_*`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    raw_query: String,
    expanded_query: String,
    clarifying_questions: Vec<String>,
    /// Always the same length as `clarifying_questions`
    responses: Vec<String>,
    stage: Stage,
    results: Vec<PropertyListing>,
    carousels: Vec<ImageCarousel>,
    last_error: Option<String>,
    #[serde(skip)]
    pending: Option<Ticket>,
    #[serde(skip)]
    issued: u64,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            raw_query: String::new(),
            expanded_query: String::new(),
            clarifying_questions: Vec::new(),
            responses: Vec::new(),
            stage: Stage::Initial,
            results: Vec::new(),
            carousels: Vec::new(),
            last_error: None,
            pending: None,
            issued: 0,
        }
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn expanded_query(&self) -> &str {
        &self.expanded_query
    }

    pub fn clarifying_questions(&self) -> &[String] {
        &self.clarifying_questions
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn results(&self) -> &[PropertyListing] {
        &self.results
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a service call is outstanding; submissions are refused.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn carousel(&self, listing: usize) -> Option<&ImageCarousel> {
        self.carousels.get(listing)
    }

    /// URL of the photo currently shown for a listing.
    pub fn active_image(&self, listing: usize) -> Option<&str> {
        let carousel = self.carousels.get(listing)?;
        self.results
            .get(listing)?
            .images
            .get(carousel.active_index())
            .map(String::as_str)
    }

    /// Starts a search from a raw query. Any session in progress is discarded.
    pub fn submit_query(&mut self, query: &str) -> Result<Dispatch<ExpandQueryRequest>, SearchError> {
        if self.is_busy() {
            return Err(SearchError::Busy);
        }
        if query.trim().is_empty() {
            return Err(self.reject(ValidationError::EmptyQuery));
        }

        if self.stage != Stage::Initial {
            debug!("Discarding {} session for a new query", self.stage);
            self.reset();
        }

        self.raw_query = query.to_string();
        self.last_error = None;
        let ticket = self.issue(Call::ExpandQuery);
        info!("Submitting query for expansion");

        Ok(Dispatch {
            ticket,
            request: ExpandQueryRequest {
                query: self.raw_query.clone(),
            },
        })
    }

    pub fn apply_expansion(
        &mut self,
        ticket: Ticket,
        reply: Result<QueryExpansion, SearchError>,
    ) -> Result<(), SearchError> {
        self.accept(ticket, Call::ExpandQuery)?;

        match reply {
            Ok(expansion) => {
                let count = expansion.clarifying_questions.len();
                self.expanded_query = expansion.expanded_query;
                self.clarifying_questions = expansion.clarifying_questions;
                self.responses = vec![String::new(); count];
                self.stage = Stage::AwaitingClarification;
                info!("Awaiting answers to {} clarifying question(s)", count);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Records the answer to one clarifying question.
    pub fn set_response(&mut self, index: usize, value: impl Into<String>) -> Result<(), SearchError> {
        self.require(Stage::AwaitingClarification, "answer a question")?;

        let len = self.responses.len();
        let slot = self
            .responses
            .get_mut(index)
            .ok_or(SearchError::NoSuchQuestion { index, len })?;
        *slot = value.into();
        Ok(())
    }

    /// Sends the answers. Rejected locally, with no request, if any is blank.
    pub fn submit_responses(&mut self) -> Result<Dispatch<SearchWithResponsesRequest>, SearchError> {
        if self.is_busy() {
            return Err(SearchError::Busy);
        }
        self.require(Stage::AwaitingClarification, "submit answers")?;

        let unanswered: Vec<usize> = self
            .responses
            .iter()
            .enumerate()
            .filter(|(_, response)| response.trim().is_empty())
            .map(|(index, _)| index)
            .collect();
        if !unanswered.is_empty() {
            return Err(self.reject(ValidationError::UnansweredQuestions { unanswered }));
        }

        self.last_error = None;
        let ticket = self.issue(Call::SearchWithResponses);
        info!("Submitting {} answer(s)", self.responses.len());

        Ok(Dispatch {
            ticket,
            request: SearchWithResponsesRequest {
                original_query: self.raw_query.clone(),
                responses: self.responses.clone(),
            },
        })
    }

    /// Normalizes the search payload into results. An unreadable payload
    /// fails like a service error and leaves the results empty.
    pub fn apply_results(
        &mut self,
        ticket: Ticket,
        reply: Result<Value, SearchError>,
    ) -> Result<usize, SearchError> {
        self.accept(ticket, Call::SearchWithResponses)?;

        let listings = reply.and_then(|payload| normalize_listings(payload).map_err(SearchError::from));
        match listings {
            Ok(listings) => {
                self.carousels = listings
                    .iter()
                    .map(|listing| ImageCarousel::new(listing.images.len()))
                    .collect();
                self.results = listings;
                self.stage = Stage::Complete;
                info!("Search complete with {} listing(s)", self.results.len());
                Ok(self.results.len())
            }
            Err(err) => {
                self.results.clear();
                self.carousels.clear();
                Err(self.fail(err))
            }
        }
    }

    /// Gives up on an outstanding call, e.g. when its future was dropped.
    /// Returns false if `ticket` was not the outstanding one.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn next_image(&mut self, listing: usize) -> Result<usize, SearchError> {
        Ok(self.carousel_mut(listing)?.next())
    }

    pub fn previous_image(&mut self, listing: usize) -> Result<usize, SearchError> {
        Ok(self.carousel_mut(listing)?.previous())
    }

    /// Back to a blank `Initial` session. A reply still in flight will be
    /// ignored when it arrives.
    pub fn start_over(&mut self) {
        info!("Starting over");
        self.reset();
    }

    pub fn new_search(&mut self) {
        self.start_over();
    }

    fn reset(&mut self) {
        let issued = self.issued;
        *self = Self {
            issued,
            ..Self::new()
        };
    }

    fn issue(&mut self, call: Call) -> Ticket {
        self.issued += 1;
        let ticket = Ticket {
            id: self.issued,
            call,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Clears the outstanding ticket if `ticket` is it and was issued for `call`.
    fn accept(&mut self, ticket: Ticket, call: Call) -> Result<(), SearchError> {
        if ticket.call != call {
            debug!("Ignoring {:?} reply offered as {:?}", ticket.call, call);
            return Err(SearchError::StaleReply);
        }
        if self.pending != Some(ticket) {
            debug!("Ignoring stale {:?} reply", ticket.call);
            return Err(SearchError::StaleReply);
        }
        self.pending = None;
        Ok(())
    }

    fn require(&self, stage: Stage, action: &'static str) -> Result<(), SearchError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(SearchError::InvalidStage {
                action,
                stage: self.stage,
            })
        }
    }

    fn reject(&mut self, err: ValidationError) -> SearchError {
        self.last_error = Some(err.to_string());
        SearchError::Validation(err)
    }

    fn fail(&mut self, err: SearchError) -> SearchError {
        warn!("Guided search call failed while {}: {}", self.stage, err);
        self.last_error = Some(err.to_string());
        err
    }

    fn carousel_mut(&mut self, listing: usize) -> Result<&mut ImageCarousel, SearchError> {
        self.require(Stage::Complete, "browse images")?;
        let len = self.carousels.len();
        self.carousels
            .get_mut(listing)
            .ok_or(SearchError::NoSuchListing { index: listing, len })
    }
}
