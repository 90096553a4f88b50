//! Per-request pipeline context.
//!
//! The [`RequestContext`] carries mutable state through the pipeline:
//! the request id, the parsed shaping directives, the handler's response
//! payload and the first error raised by any stage or handler. It is
//! created fresh for every request and never shared across requests.

use clipshelf_core::{ApiError, Record};
use http::StatusCode;
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

use crate::params::{FilterParams, SearchCriteria};

/// The payload a handler deposits for the shaping stage.
///
/// An absent slot means "no content", answered as 204 — it is not an
/// error condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSlot {
    /// A single record; search and pagination are skipped, only field
    /// projection applies.
    Single(Record),
    /// A collection; shaped by search, projection and pagination.
    Collection(Vec<Record>),
}

impl ResponseSlot {
    /// Converts the shaped slot to a JSON value for serialization.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Single(record) => Value::Object(record),
            Self::Collection(items) => {
                Value::Array(items.into_iter().map(Value::Object).collect())
            }
        }
    }
}

/// Context that flows through the request pipeline.
///
/// Stages enrich it on the way in (request id, shaping directives) and
/// consume it on the way out (payload shaping, error formatting). The
/// error slot holds at most one error: the first failure wins and the
/// stages behind it never run.
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    started_at: Instant,
    filter: FilterParams,
    search: SearchCriteria,
    payload: Option<ResponseSlot>,
    payload_status: StatusCode,
    error: Option<ApiError>,
}

impl RequestContext {
    /// Creates a new context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            started_at: Instant::now(),
            filter: FilterParams::default(),
            search: SearchCriteria::default(),
            payload: None,
            payload_status: StatusCode::OK,
            error: None,
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Sets the request id.
    ///
    /// This should only be called by the request-id stage.
    pub fn set_request_id(&mut self, request_id: Uuid) {
        self.request_id = request_id;
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the parsed filter/offset/limit directives.
    #[must_use]
    pub fn filter(&self) -> &FilterParams {
        &self.filter
    }

    /// Stores the parsed filter/offset/limit directives.
    pub fn set_filter(&mut self, filter: FilterParams) {
        self.filter = filter;
    }

    /// Returns the parsed search criteria.
    #[must_use]
    pub fn search(&self) -> &SearchCriteria {
        &self.search
    }

    /// Stores the parsed search criteria.
    pub fn set_search(&mut self, search: SearchCriteria) {
        self.search = search;
    }

    /// Deposits the handler's payload and the success status to answer
    /// with once the payload is shaped.
    pub fn set_payload(&mut self, slot: ResponseSlot, status: StatusCode) {
        self.payload = Some(slot);
        self.payload_status = status;
    }

    /// Takes the payload out of the context, leaving it empty.
    pub fn take_payload(&mut self) -> Option<ResponseSlot> {
        self.payload.take()
    }

    /// Returns the status the shaped payload should be answered with.
    #[must_use]
    pub fn payload_status(&self) -> StatusCode {
        self.payload_status
    }

    /// Records the first error of the request.
    ///
    /// A later error never displaces an earlier one.
    pub fn set_error(&mut self, error: ApiError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Takes the error out of the context, leaving it empty.
    ///
    /// Only the error-normalization stage calls this; taking (rather
    /// than reading) is what keeps the terminal classifier unreachable
    /// twice for one request.
    pub fn take_error(&mut self) -> Option<ApiError> {
        self.error.take()
    }

    /// Checks whether an error has been recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_error_wins() {
        let mut ctx = RequestContext::new();
        ctx.set_error(ApiError::InvalidOffset);
        ctx.set_error(ApiError::InvalidLimit);

        let err = ctx.take_error().unwrap();
        assert!(matches!(err, ApiError::InvalidOffset));
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_take_error_empties_slot() {
        let mut ctx = RequestContext::new();
        ctx.set_error(ApiError::RouteNotFound);
        assert!(ctx.take_error().is_some());
        assert!(ctx.take_error().is_none());
    }

    #[test]
    fn test_payload_round_trip() {
        let mut ctx = RequestContext::new();
        assert!(ctx.take_payload().is_none());

        let mut record = Record::new();
        record.insert("title".into(), json!("T"));
        ctx.set_payload(ResponseSlot::Single(record), StatusCode::CREATED);

        assert_eq!(ctx.payload_status(), StatusCode::CREATED);
        let slot = ctx.take_payload().unwrap();
        assert_eq!(slot.into_value(), json!({"title": "T"}));
    }

    #[test]
    fn test_collection_into_value() {
        let mut a = Record::new();
        a.insert("id".into(), json!(1));
        let slot = ResponseSlot::Collection(vec![a]);
        assert_eq!(slot.into_value(), json!([{"id": 1}]));
    }
}
