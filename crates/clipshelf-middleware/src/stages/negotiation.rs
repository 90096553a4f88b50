//! Content negotiation stage.
//!
//! Three header checks, in order:
//!
//! - `Accept-Version`, when present, must name the supported version,
//!   else 406 (`VersionNotFulfillable`);
//! - `Accept`, when present, must allow `application/json`, else 406
//!   (`NotAcceptable`);
//! - on write verbs (POST/PUT/PATCH) the `Content-Type` must be
//!   `application/json`, else 415 (`UnsupportedMediaType`).
//!
//! Responses are JSON only; there is no content-type fallback.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use clipshelf_core::{ApiError, ApiResult};
use http::{header, Method};

/// The header clients use to pin an API version.
pub const ACCEPT_VERSION_HEADER: &str = "accept-version";

/// Stage that enforces the content negotiation contract.
#[derive(Debug, Clone)]
pub struct NegotiationStage {
    supported_version: String,
}

impl NegotiationStage {
    /// Creates the stage for the given supported API version.
    #[must_use]
    pub fn new(supported_version: impl Into<String>) -> Self {
        Self {
            supported_version: supported_version.into(),
        }
    }

    fn check(&self, request: &Request) -> ApiResult<()> {
        if let Some(value) = request.headers().get(ACCEPT_VERSION_HEADER) {
            let requested = value.to_str().unwrap_or("");
            if requested != self.supported_version {
                return Err(ApiError::VersionNotFulfillable);
            }
        }

        if let Some(value) = request.headers().get(header::ACCEPT) {
            let accept = value.to_str().unwrap_or("");
            if !accept_allows_json(accept) {
                return Err(ApiError::NotAcceptable);
            }
        }

        if is_write_verb(request.method()) {
            let content_type = request
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("");
            if !content_type_is_json(content_type) {
                return Err(ApiError::UnsupportedMediaType);
            }
        }

        Ok(())
    }
}

fn is_write_verb(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Media-range check over a raw `Accept` value: any listed range that
/// covers `application/json` is enough.
fn accept_allows_json(accept: &str) -> bool {
    accept.split(',').any(|range| {
        let media = range.split(';').next().unwrap_or("").trim();
        matches!(media, "application/json" | "application/*" | "*/*")
    })
}

fn content_type_is_json(content_type: &str) -> bool {
    let media = content_type.split(';').next().unwrap_or("").trim();
    media.eq_ignore_ascii_case("application/json")
}

impl Middleware for NegotiationStage {
    fn name(&self) -> &'static str {
        "negotiation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Err(err) = self.check(&request) {
                let status = err.status_code();
                ctx.set_error(err);
                return Response::empty(status);
            }

            next.run(ctx, request).await
        })
    }
}
