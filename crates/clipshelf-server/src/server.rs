//! HTTP server bootstrap and request dispatch.
//!
//! One [`Pipeline`] is built per resource at startup; every request is
//! routed, wrapped in an [`OperationHandler`], and pushed through the
//! pipeline of the resource it addresses. Routing failures (unknown
//! path, unsupported method) never reach a pipeline; they are answered
//! with an envelope directly so they still carry a request id.

use crate::config::ServerConfig;
use crate::resources::{self, comments, read_json_body, videos, Operation};
use crate::router::{RouteOutcome, Router};
use clipshelf_core::{ApiError, ApiResult, ResourceStore, Schema};
use clipshelf_middleware::stages::request_id::REQUEST_ID_HEADER;
use clipshelf_middleware::stages::{
    ErrorNormalizationStage, FilterParserStage, NegotiationStage, RequestIdStage,
    SearchParserStage, ShapingStage,
};
use clipshelf_middleware::{
    BoxFuture, Handler, Pipeline, Request, RequestContext, Response, ResponseExt,
};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Failures that terminate the server before or during the accept loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address does not parse.
    #[error("invalid listen address '{addr}'")]
    InvalidAddr {
        /// The configured address text.
        addr: String,
        /// The parse failure.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// The bind failure.
        #[source]
        source: std::io::Error,
    },
}

/// Shared per-process state: store handle, schemas, pipelines, routes.
pub struct AppState {
    config: ServerConfig,
    store: Arc<dyn ResourceStore>,
    video_schema: Arc<Schema>,
    comment_schema: Arc<Schema>,
    video_pipeline: Pipeline,
    comment_pipeline: Pipeline,
    router: Router,
}

impl AppState {
    /// Builds the state: schemas, one pipeline per resource, routes.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn ResourceStore>) -> Self {
        let video_schema = Arc::new(resources::video_schema());
        let comment_schema = Arc::new(resources::comment_schema());

        Self {
            video_pipeline: build_pipeline(&config, video_schema.clone()),
            comment_pipeline: build_pipeline(&config, comment_schema.clone()),
            router: build_router(),
            config,
            store,
            video_schema,
            comment_schema,
        }
    }

    /// Routes and processes a single request.
    pub async fn handle(self: &Arc<Self>, request: Request) -> Response {
        match self.router.lookup(request.method(), request.uri().path()) {
            RouteOutcome::Matched { operation, params } => {
                let pipeline = if operation.resource() == comments::RESOURCE {
                    &self.comment_pipeline
                } else {
                    &self.video_pipeline
                };
                let handler = OperationHandler {
                    state: self.clone(),
                    operation,
                    params,
                };
                pipeline
                    .process(RequestContext::new(), request, &handler)
                    .await
            }
            RouteOutcome::MethodNotAllowed => self.routing_error(ApiError::MethodNotAllowed {
                method: request.method().to_string(),
            }),
            RouteOutcome::NotFound => self.routing_error(ApiError::RouteNotFound),
        }
    }

    /// Answers a request that never entered a pipeline with an error
    /// envelope carrying a fresh request id.
    fn routing_error(&self, err: ApiError) -> Response {
        let request_id = Uuid::now_v7().to_string();
        tracing::info!(request_id, error = %err, "request rejected at routing");

        let envelope = err.to_envelope(Some(&request_id), self.config.expose_internal_errors());
        let mut response = Response::json(err.status_code(), &envelope);
        response.headers_mut().insert(
            REQUEST_ID_HEADER,
            request_id.parse().expect("valid header value"),
        );
        response
    }
}

/// Binds the routed operation to the pipeline's handler seam.
struct OperationHandler {
    state: Arc<AppState>,
    operation: Operation,
    params: HashMap<String, String>,
}

impl OperationHandler {
    fn raw_id(&self) -> &str {
        self.params.get("id").map_or("", String::as_str)
    }

    async fn dispatch(&self, ctx: &mut RequestContext, request: Request) -> ApiResult<()> {
        let store = self.state.store.as_ref();
        match self.operation {
            Operation::ListVideos => videos::list(store, ctx).await,
            Operation::CreateVideo => {
                let body = read_json_body(request).await?;
                videos::create(store, &self.state.video_schema, ctx, body).await
            }
            Operation::GetVideo => videos::get(store, ctx, self.raw_id()).await,
            Operation::ReplaceVideo => {
                let body = read_json_body(request).await?;
                videos::replace(store, &self.state.video_schema, ctx, self.raw_id(), body).await
            }
            Operation::PatchVideo => {
                let body = read_json_body(request).await?;
                videos::patch(store, &self.state.video_schema, ctx, self.raw_id(), body).await
            }
            Operation::DeleteVideo => videos::delete(store, self.raw_id()).await,
            Operation::ListVideoComments => videos::list_comments(store, ctx, self.raw_id()).await,
            Operation::DeleteVideoComments => videos::delete_comments(store, self.raw_id()).await,
            Operation::ListComments => comments::list(store, ctx).await,
            Operation::CreateComment => {
                let body = read_json_body(request).await?;
                comments::create(store, &self.state.comment_schema, ctx, body).await
            }
            Operation::GetComment => comments::get(store, ctx, self.raw_id()).await,
            Operation::ReplaceComment => {
                let body = read_json_body(request).await?;
                comments::replace(store, &self.state.comment_schema, ctx, self.raw_id(), body)
                    .await
            }
            Operation::PatchComment => {
                let body = read_json_body(request).await?;
                comments::patch(store, &self.state.comment_schema, ctx, self.raw_id(), body).await
            }
            Operation::DeleteComment => comments::delete(store, self.raw_id()).await,
        }
    }
}

impl Handler for OperationHandler {
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.dispatch(ctx, request).await {
                Ok(()) => Response::empty(StatusCode::OK),
                Err(err) => {
                    let status = err.status_code();
                    ctx.set_error(err);
                    Response::empty(status)
                }
            }
        })
    }
}

/// Builds the standard six-stage pipeline for a resource schema.
fn build_pipeline(config: &ServerConfig, schema: Arc<Schema>) -> Pipeline {
    Pipeline::builder()
        .add_pre_handler_stage(RequestIdStage::new())
        .add_pre_handler_stage(
            ErrorNormalizationStage::new()
                .expose_internal_errors(config.expose_internal_errors()),
        )
        .add_pre_handler_stage(NegotiationStage::new(config.api_version()))
        .add_pre_handler_stage(FilterParserStage::new(schema.clone()))
        .add_pre_handler_stage(SearchParserStage::new(schema.clone()))
        .add_post_handler_stage(ShapingStage::new(schema))
        .build()
}

/// Builds the route table for both resources.
fn build_router() -> Router {
    Router::new()
        .route(Method::GET, "/videos", Operation::ListVideos)
        .route(Method::POST, "/videos", Operation::CreateVideo)
        .route(Method::GET, "/videos/{id}", Operation::GetVideo)
        .route(Method::PUT, "/videos/{id}", Operation::ReplaceVideo)
        .route(Method::PATCH, "/videos/{id}", Operation::PatchVideo)
        .route(Method::DELETE, "/videos/{id}", Operation::DeleteVideo)
        .route(
            Method::GET,
            "/videos/{id}/comments",
            Operation::ListVideoComments,
        )
        .route(
            Method::DELETE,
            "/videos/{id}/comments",
            Operation::DeleteVideoComments,
        )
        .route(Method::GET, "/comments", Operation::ListComments)
        .route(Method::POST, "/comments", Operation::CreateComment)
        .route(Method::GET, "/comments/{id}", Operation::GetComment)
        .route(Method::PUT, "/comments/{id}", Operation::ReplaceComment)
        .route(Method::PATCH, "/comments/{id}", Operation::PatchComment)
        .route(Method::DELETE, "/comments/{id}", Operation::DeleteComment)
}

/// The clipshelf HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a server over the given store.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn ResourceStore>) -> Self {
        let state = Arc::new(AppState::new(config.clone(), store));
        Self { config, state }
    }

    /// Returns a handle to the shared state, for in-process dispatch.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Runs the accept loop until a shutdown signal arrives.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddr {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, version = self.config.api_version(), "listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            tracing::warn!(error = %err, "accept failed");
                            continue;
                        }
                    };
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |request: http::Request<Incoming>| {
                            let state = state.clone();
                            async move { Ok::<_, Infallible>(serve(&state, request).await) }
                        });
                        let connection = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service);
                        if let Err(err) = connection.await {
                            tracing::debug!(%peer, error = %err, "connection error");
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

/// Buffers the request body and dispatches through the shared state.
async fn serve(state: &Arc<AppState>, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    match body.collect().await {
        Ok(collected) => {
            let request = http::Request::from_parts(parts, Full::new(collected.to_bytes()));
            state.handle(request).await
        }
        Err(err) => state.routing_error(ApiError::MalformedBody {
            detail: err.to_string(),
        }),
    }
}
