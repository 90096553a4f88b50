//! Error taxonomy and HTTP status mapping.
//!
//! [`ApiError`] is the single error type flowing through validators,
//! parsers and handlers. Every variant maps to exactly one HTTP status
//! code, so the terminal error-formatting stage is a plain lookup with
//! no transitions:
//!
//! | Variants | Status |
//! |---|---|
//! | payload/filter/search/pagination validation | 400 |
//! | missing id, malformed id, unknown record, unknown route | 404 (except missing id: 400) |
//! | unsupported verb on a matched route | 405 |
//! | `Accept-Version` / `Accept` cannot be fulfilled | 406 |
//! | non-JSON body on a write verb | 415 |
//! | everything else | 500 |
//!
//! Validation errors are values, not exceptions: validators return
//! `Result<_, ApiError>` and the first error aborts the remaining
//! pipeline stages.
//!
//! The wire envelope is `{"error": {"message": ..., "error": {}}}`; the
//! inner `error` member carries detail text only when the server is
//! configured to expose internals (a deployment-mode switch, never a
//! per-request decision).

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// All failure conditions the request pipeline can report.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required schema field is absent from the payload.
    #[error("required property {field} must be present")]
    MissingRequiredField {
        /// The missing field name.
        field: String,
    },

    /// A payload value does not match the declared type tag.
    #[error("property {field} must be of type {expected}")]
    TypeMismatch {
        /// The offending field name.
        field: String,
        /// The declared type name.
        expected: &'static str,
    },

    /// A numeric payload value is negative.
    #[error("{field} must not be negative, please enter a positive value")]
    NegativeValue {
        /// The offending field name.
        field: String,
    },

    /// A counter-field patch value is not a signed-delta string.
    #[error("{field} must be in the format (+|-)[0-9]+ (e.g. +1, -2)")]
    InvalidDeltaFormat {
        /// The counter field name.
        field: String,
    },

    /// The request body is absent or not a JSON object.
    #[error("content in body is missing or not a JSON object: {detail}")]
    MalformedBody {
        /// What was wrong with the body.
        detail: String,
    },

    /// The path identifier is empty.
    #[error("please send a valid id")]
    MissingId,

    /// The path identifier does not parse as a decimal integer.
    ///
    /// Answers 404, not 400. This mirrors long-committed behavior and
    /// is kept as the documented, if debatable, contract.
    #[error("id '{raw}' is not a parsable number")]
    InvalidIdFormat {
        /// The raw path segment.
        raw: String,
    },

    /// No record with the given id exists in the resource.
    #[error("a {resource} record with id {id} does not exist")]
    RecordNotFound {
        /// The resource name.
        resource: String,
        /// The id that was looked up, as supplied.
        id: String,
    },

    /// A `filter` token is not a known field of the resource.
    #[error("filter key '{key}' is not valid for this resource")]
    UnknownFilterKey {
        /// The unknown token.
        key: String,
    },

    /// The `offset` query parameter is not an integer >= 0.
    #[error("offset must be a number >= 0")]
    InvalidOffset,

    /// The `limit` query parameter is not an integer > 0.
    #[error("limit must be a number > 0")]
    InvalidLimit,

    /// The query string could not be decoded.
    #[error("query string is not valid: {detail}")]
    InvalidQueryString {
        /// What was wrong with the query string.
        detail: String,
    },

    /// A search query key is not a known field of the resource.
    #[error("property '{key}' does not exist in this resource")]
    UnknownSearchKey {
        /// The unknown query key.
        key: String,
    },

    /// `offset` points past the end of a non-empty collection.
    #[error("offset must not be greater than the number of available items")]
    OffsetOutOfRange {
        /// The requested offset.
        offset: usize,
        /// The collection length.
        len: usize,
    },

    /// The route exists but does not support the request verb.
    #[error("method {method} is not allowed")]
    MethodNotAllowed {
        /// The request method.
        method: String,
    },

    /// No route matches the request path.
    #[error("not found")]
    RouteNotFound,

    /// A write verb carried a body that is not `application/json`.
    #[error("wrong Content-Type, only application/json is supported")]
    UnsupportedMediaType,

    /// The `Accept-Version` header names an unsupported version.
    #[error("Accept-Version cannot be fulfilled")]
    VersionNotFulfillable,

    /// The client's `Accept` header rejects JSON responses.
    #[error("response is application/json only, please accept this")]
    NotAcceptable,

    /// Unclassified failure; detail is never leaked in production mode.
    #[error("an internal error occurred")]
    Internal {
        /// The underlying error, logged but not exposed to clients.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates an internal error wrapping an opaque source.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingRequiredField { .. }
            | Self::TypeMismatch { .. }
            | Self::NegativeValue { .. }
            | Self::InvalidDeltaFormat { .. }
            | Self::MalformedBody { .. }
            | Self::MissingId
            | Self::UnknownFilterKey { .. }
            | Self::InvalidOffset
            | Self::InvalidLimit
            | Self::InvalidQueryString { .. }
            | Self::UnknownSearchKey { .. }
            | Self::OffsetOutOfRange { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidIdFormat { .. }
            | Self::RecordNotFound { .. }
            | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::VersionNotFulfillable | Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts this error to the serializable wire envelope.
    ///
    /// In production mode (`expose_internal = false`) the nested `error`
    /// member is always the empty object. In development mode it carries
    /// the error chain as text.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, expose_internal: bool) -> ErrorEnvelope {
        let message = if matches!(self, Self::Internal { .. }) && !expose_internal {
            "an internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let detail = if expose_internal {
            Value::String(format!("{self:?}"))
        } else {
            Value::Object(serde_json::Map::new())
        };

        ErrorEnvelope {
            error: ErrorBody {
                message,
                error: detail,
                request_id: request_id.map(ToString::to_string),
            },
        }
    }
}

/// Serializable error envelope: `{"error": {"message", "error"}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    /// The error body.
    pub error: ErrorBody,
}

/// Body of the error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub message: String,
    /// Detail object: `{}` in production, error chain text in development.
    pub error: Value,
    /// Correlation id of the failing request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
