//! Fixed-order request pipeline.
//!
//! Every resource request flows through the same stage order; stages
//! cannot be reordered or disabled per request.
//!
//! ## Pipeline Stages
//!
//! 1. **Request ID** - assign a UUID v7 id, log the request line
//! 2. **Error Normalization** - format the error envelope on exit
//! 3. **Negotiation** - Accept-Version / Accept / Content-Type checks
//! 4. **Filter Parsing** - `filter`/`offset`/`limit` directives
//! 5. **Search Parsing** - remaining query keys as search criteria
//! 6. **Shaping** - (post-handler) search, projection, pagination
//!
//! Error normalization sits directly inside the request-id stage, so
//! every error recorded deeper in the chain passes through it exactly
//! once on the way out, and the request-id header is stamped on the
//! formatted envelope.

use crate::context::RequestContext;
use crate::middleware::{Handler, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased stage that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order request pipeline.
///
/// Constructed once per resource at startup; the stage list is
/// immutable afterwards.
pub struct Pipeline {
    /// Stages that wrap the handler, outermost first.
    pre_handler_stages: Vec<BoxedMiddleware>,

    /// Stages that run directly around the handler (innermost).
    post_handler_stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through the entire pipeline.
    ///
    /// The request flows through the pre-handler stages in order, into
    /// the handler, and back out through the same stages.
    pub async fn process(
        &self,
        mut ctx: RequestContext,
        request: Request,
        handler: &dyn Handler,
    ) -> Response {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    /// Builds the middleware chain from back to front.
    fn build_chain<'a>(&'a self, handler: &'a dyn Handler) -> Next<'a> {
        let mut next = Next::terminal(handler);

        for middleware in self.post_handler_stages.iter().rev() {
            next = Next::chain(middleware.as_ref(), next);
        }

        for middleware in self.pre_handler_stages.iter().rev() {
            next = Next::chain(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pre_handler_stages
            .iter()
            .chain(&self.post_handler_stages)
            .map(|mw| mw.name())
            .collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.pre_handler_stages.len() + self.post_handler_stages.len()
    }
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    pre_handler_stages: Vec<BoxedMiddleware>,
    post_handler_stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pre_handler_stages: Vec::new(),
            post_handler_stages: Vec::new(),
        }
    }

    /// Adds a pre-handler stage.
    ///
    /// Pre-handler stages run before the handler, in insertion order:
    /// request id, error normalization, negotiation, filter parsing,
    /// search parsing.
    #[must_use]
    pub fn add_pre_handler_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.pre_handler_stages.push(Arc::new(middleware));
        self
    }

    /// Adds a post-handler stage.
    ///
    /// Post-handler stages wrap only the handler; shaping is the single
    /// post-handler stage of the standard pipeline.
    #[must_use]
    pub fn add_post_handler_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.post_handler_stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            pre_handler_stages: self.pre_handler_stages,
            post_handler_stages: self.post_handler_stages,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Stage marker for the fixed pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: request id assignment and request logging.
    RequestId = 1,
    /// Stage 2: error envelope formatting (on the response path).
    ErrorNormalization = 2,
    /// Stage 3: content negotiation.
    Negotiation = 3,
    /// Stage 4: filter/offset/limit parsing.
    FilterParsing = 4,
    /// Stage 5: search criteria parsing.
    SearchParsing = 5,
    /// Stage 6: response shaping (post-handler).
    Shaping = 6,
}

impl Stage {
    /// Returns true if this stage runs before the handler wrapper.
    #[must_use]
    pub const fn is_pre_handler(self) -> bool {
        (self as u8) <= 5
    }

    /// Returns true if this stage wraps only the handler.
    #[must_use]
    pub const fn is_post_handler(self) -> bool {
        (self as u8) >= 6
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::ErrorNormalization => "error_normalization",
            Self::Negotiation => "negotiation",
            Self::FilterParsing => "filter_parsing",
            Self::SearchParsing => "search_parsing",
            Self::Shaping => "shaping",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::RequestId,
            Self::ErrorNormalization,
            Self::Negotiation,
            Self::FilterParsing,
            Self::SearchParsing,
            Self::Shaping,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, FnHandler};
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::Mutex;

    struct OrderTrackingStage {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTrackingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            let order = self.order.clone();
            let name = self.name;
            Box::pin(async move {
                order.lock().unwrap().push(name);
                next.run(ctx, request).await
            })
        }
    }

    fn ok_handler<'a>(
        _ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async { Response::empty(StatusCode::OK) })
    }

    fn make_request() -> Request {
        http::Request::builder()
            .uri("/videos")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .add_pre_handler_stage(OrderTrackingStage {
                name: "first",
                order: order.clone(),
            })
            .add_pre_handler_stage(OrderTrackingStage {
                name: "second",
                order: order.clone(),
            })
            .add_post_handler_stage(OrderTrackingStage {
                name: "third",
                order: order.clone(),
            })
            .build();

        let handler = FnHandler::new(ok_handler);
        let response = pipeline
            .process(RequestContext::new(), make_request(), &handler)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_reaches_handler() {
        let pipeline = Pipeline::builder().build();
        let handler = FnHandler::new(ok_handler);

        let response = pipeline
            .process(RequestContext::new(), make_request(), &handler)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::RequestId < Stage::ErrorNormalization);
        assert!(Stage::ErrorNormalization < Stage::Negotiation);
        assert!(Stage::Negotiation < Stage::FilterParsing);
        assert!(Stage::FilterParsing < Stage::SearchParsing);
        assert!(Stage::SearchParsing < Stage::Shaping);
    }

    #[test]
    fn test_stage_categories() {
        for stage in Stage::all() {
            assert_ne!(stage.is_pre_handler(), stage.is_post_handler());
        }
        assert!(Stage::SearchParsing.is_pre_handler());
        assert!(Stage::Shaping.is_post_handler());
    }
}
