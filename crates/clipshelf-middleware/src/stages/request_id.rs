//! Request ID stage.
//!
//! Assigns a UUID v7 to every request, echoes it in the `X-Request-ID`
//! response header, and logs one request line on completion. The same
//! id appears in the error envelope, so a client can quote it when
//! reporting a failure.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use uuid::Uuid;

/// The header name carrying the request id on responses.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Stage that assigns request ids and logs the request line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdStage;

impl RequestIdStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestIdStage {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = Uuid::now_v7();
            ctx.set_request_id(request_id);

            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let mut response = next.run(ctx, request).await;

            tracing::info!(
                request_id = %request_id,
                %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request complete"
            );

            response.headers_mut().insert(
                REQUEST_ID_HEADER,
                request_id.to_string().parse().expect("valid header value"),
            );

            response
        })
    }
}
