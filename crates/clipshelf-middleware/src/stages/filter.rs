//! Filter parsing stage.
//!
//! Decodes the query string once and parses the reserved `filter`,
//! `offset` and `limit` keys into the context's shaping directives.
//! A bad directive short-circuits the chain with a 400.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::params::{parse_filter_params, parse_query};
use crate::types::{Request, Response, ResponseExt};
use clipshelf_core::Schema;
use std::sync::Arc;

/// Stage that parses filter/offset/limit directives.
#[derive(Debug, Clone)]
pub struct FilterParserStage {
    schema: Arc<Schema>,
}

impl FilterParserStage {
    /// Creates the stage for a resource schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Middleware for FilterParserStage {
    fn name(&self) -> &'static str {
        "filter_parsing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let query = request.uri().query().unwrap_or("");
            let parsed = parse_query(query)
                .and_then(|pairs| parse_filter_params(&self.schema, &pairs));

            match parsed {
                Ok(params) => {
                    ctx.set_filter(params);
                    next.run(ctx, request).await
                }
                Err(err) => {
                    let status = err.status_code();
                    ctx.set_error(err);
                    Response::empty(status)
                }
            }
        })
    }
}
