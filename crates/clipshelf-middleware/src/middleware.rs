//! Core middleware trait and chain types.
//!
//! This module defines the [`Middleware`] trait every pipeline stage
//! implements, the [`Handler`] trait at the end of the chain, and the
//! [`Next`] continuation that links them.
//!
//! # Design
//!
//! The pipeline order is fixed. Stages cannot be reordered or disabled
//! per request; a stage that detects a failure records it on the context
//! and short-circuits by returning without calling `next.run()`. The
//! outer stages still see the response on the way out, which is where
//! the error envelope is produced.
//!
//! # Example
//!
//! ```
//! use clipshelf_middleware::{BoxFuture, Middleware, Next, Request, Response};
//! use clipshelf_middleware::context::RequestContext;
//!
//! struct TimingStage;
//!
//! impl Middleware for TimingStage {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "stage timing");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::RequestContext;
use crate::types::{Request, Response};

pub use clipshelf_core::BoxFuture;

/// The core middleware trait.
///
/// All pipeline stages implement this trait. A stage receives the
/// mutable context, the incoming request, and a [`Next`] continuation
/// for the rest of the chain.
///
/// # Invariants
///
/// - A stage calls `next.run()` exactly once, or not at all when it
///   short-circuits.
/// - A stage that fails records the error via
///   [`RequestContext::set_error`] before returning.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used for logging.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The terminal point of the chain: a resource operation.
///
/// Handlers read the request, consult the backing store, and deposit
/// their result on the context (payload slot or error slot). The
/// returned response is a placeholder the post-handler stages rewrite.
pub trait Handler: Send + Sync {
    /// Executes the operation.
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Response>;
}

/// A handler built from a plain function.
///
/// Useful in tests and for trivial operations:
///
/// ```
/// use clipshelf_middleware::{BoxFuture, FnHandler, Request, Response, ResponseExt};
/// use clipshelf_middleware::context::RequestContext;
/// use http::StatusCode;
///
/// fn no_op<'a>(_ctx: &'a mut RequestContext, _req: Request) -> BoxFuture<'a, Response> {
///     Box::pin(async { Response::empty(StatusCode::OK) })
/// }
///
/// let handler = FnHandler::new(no_op);
/// ```
pub struct FnHandler<F>(F);

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, Response> + Send + Sync,
{
    /// Wraps a function as a [`Handler`].
    pub const fn new(func: F) -> Self {
        Self(func)
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request) -> BoxFuture<'a, Response> + Send + Sync,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Response> {
        (self.0)(ctx, request)
    }
}

/// Continuation that invokes the rest of the chain.
///
/// Passed to each stage; consuming `run` ensures a stage cannot invoke
/// the remainder of the pipeline twice.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More stages to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: the resource handler.
    Terminal(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given stage first.
    pub(crate) fn chain(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    #[must_use]
    pub fn terminal(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Terminal(handler),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Terminal(handler) => handler.call(ctx, request).await,
        }
    }
}
