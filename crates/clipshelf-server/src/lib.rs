//! # Clipshelf Server
//!
//! HTTP surface of the clipshelf REST framework: route table, resource
//! schemas and handlers for videos and comments, and the hyper-based
//! accept loop.
//!
//! Requests are routed to an [`resources::Operation`] and pushed
//! through the per-resource middleware pipeline; handlers deposit raw
//! records in the request context and the pipeline shapes them
//! (search, projection, pagination) into the wire response.
//!
//! ```
//! use clipshelf_server::{Server, ServerConfig};
//! use clipshelf_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let config = ServerConfig::builder().http_addr("127.0.0.1:8000").build();
//! let server = Server::new(config, Arc::new(MemoryStore::new()));
//! let state = server.state();
//! ```

#![doc(html_root_url = "https://docs.rs/clipshelf-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod resources;
pub mod router;
pub mod server;

pub use config::{ServerConfig, ServerConfigBuilder, API_VERSION};
pub use resources::{comment_schema, demo_seed, video_schema, Operation};
pub use router::{RouteOutcome, Router};
pub use server::{AppState, Server, ServerError};
