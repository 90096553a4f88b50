//! Response shaping stage.
//!
//! The single post-handler stage. Once the handler returns, this stage
//! empties the context's payload slot, applies search, projection and
//! pagination via [`shape_response`], and serializes the result:
//!
//! - an empty slot on a successful request means "no content" → 204;
//! - a shaped payload is answered with the handler's chosen status
//!   (200 by default, 201 on create);
//! - a shaping failure (offset past the end) is recorded on the
//!   context for the error-normalization stage.
//!
//! If an error was already recorded, the slot is left alone and the
//! placeholder response passes through untouched.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::shape::shape_response;
use crate::types::{Request, Response, ResponseExt};
use clipshelf_core::Schema;
use http::StatusCode;
use std::sync::Arc;

/// Stage that shapes and serializes the handler payload.
#[derive(Debug, Clone)]
pub struct ShapingStage {
    schema: Arc<Schema>,
}

impl ShapingStage {
    /// Creates the stage for a resource schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Middleware for ShapingStage {
    fn name(&self) -> &'static str {
        "shaping"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;

            if ctx.has_error() {
                return response;
            }

            let Some(slot) = ctx.take_payload() else {
                return Response::empty(StatusCode::NO_CONTENT);
            };

            match shape_response(&self.schema, ctx.filter(), ctx.search(), slot) {
                Ok(shaped) => Response::json(ctx.payload_status(), &shaped.into_value()),
                Err(err) => {
                    let status = err.status_code();
                    ctx.set_error(err);
                    Response::empty(status)
                }
            }
        })
    }
}
