//! Error normalization stage.
//!
//! The single terminal error classifier. Any stage or handler that
//! fails records an [`ApiError`] on the context and the chain unwinds;
//! this stage, sitting directly inside the request-id stage, takes the
//! error out of the context and formats the wire envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "message": "required property title must be present",
//!     "error": {},
//!     "request_id": "uuid-v7"
//!   }
//! }
//! ```
//!
//! Taking (not reading) the error is what makes the classifier
//! unreachable twice for one request. The nested `error` member stays
//! the empty object unless the stage was configured to expose internal
//! detail, which is a deployment-mode switch, never a per-request
//! decision.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use clipshelf_core::ApiError;

/// Stage that converts recorded errors into the standard envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorNormalizationStage {
    expose_internal: bool,
}

impl ErrorNormalizationStage {
    /// Creates the stage in production mode (internal detail hidden).
    #[must_use]
    pub fn new() -> Self {
        Self {
            expose_internal: false,
        }
    }

    /// Enables internal error detail in envelopes.
    ///
    /// Only enable this in development environments.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal = expose;
        self
    }

    fn format(&self, ctx: &RequestContext, err: &ApiError) -> Response {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!(request_id = %ctx.request_id(), error = %err, "request failed");
        } else {
            tracing::debug!(request_id = %ctx.request_id(), error = %err, "request rejected");
        }

        let request_id = ctx.request_id().to_string();
        let envelope = err.to_envelope(Some(&request_id), self.expose_internal);
        Response::json(status, &envelope)
    }
}

impl Middleware for ErrorNormalizationStage {
    fn name(&self) -> &'static str {
        "error_normalization"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;

            match ctx.take_error() {
                None => response,
                Some(err) => self.format(ctx, &err),
            }
        })
    }
}
