//! Search parsing stage.
//!
//! Turns every non-reserved query key into a search criterion against
//! the resource schema. An unknown key short-circuits with a 400.

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::params::{parse_query, parse_search_params};
use crate::types::{Request, Response, ResponseExt};
use clipshelf_core::Schema;
use std::sync::Arc;

/// Stage that parses search criteria.
#[derive(Debug, Clone)]
pub struct SearchParserStage {
    schema: Arc<Schema>,
}

impl SearchParserStage {
    /// Creates the stage for a resource schema.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Middleware for SearchParserStage {
    fn name(&self) -> &'static str {
        "search_parsing"
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
                .and_then(|pairs| parse_search_params(&self.schema, &pairs));

            match parsed {
                Ok(criteria) => {
                    ctx.set_search(criteria);
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
