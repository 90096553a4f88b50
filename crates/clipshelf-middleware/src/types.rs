//! Common types used throughout the request pipeline.
//!
//! This module defines the HTTP request and response types shared by
//! every stage and handler.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

/// The HTTP request type used in the pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a response with the given status and an empty body.
    fn empty(status: StatusCode) -> Response;

    /// Creates an `application/json` response from a serializable value.
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response;
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        http::Response::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .expect("failed to build empty response")
    }

    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => http::Response::builder()
                .status(status)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(body)))
                .expect("failed to build JSON response"),
            Err(_) => Self::empty(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(http::header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(StatusCode::OK, &json!({"title": "T"}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
