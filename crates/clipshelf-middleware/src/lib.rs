//! # Clipshelf Middleware
//!
//! Fixed-order request pipeline for clipshelf resources.
//!
//! Every resource request flows through the same stage order:
//!
//! ```text
//! Request → RequestId → ErrorNorm → Negotiation → Filter → Search → Shaping → Handler
//!                           │                                          │
//! Response ←────────────────┴──────────── (envelope on error) ←────────┘
//! ```
//!
//! | Stage | Purpose                                            |
//! |-------|----------------------------------------------------|
//! | 1     | Request ID: assign UUID v7, log the request line   |
//! | 2     | Error Normalization: format the error envelope     |
//! | 3     | Negotiation: Accept-Version / Accept / Content-Type|
//! | 4     | Filter Parsing: `filter`/`offset`/`limit`          |
//! | 5     | Search Parsing: remaining query keys               |
//! | 6     | Shaping: search → projection → pagination (post)   |
//!
//! Stages and handlers never write error bodies themselves: they record
//! an [`ApiError`](clipshelf_core::ApiError) on the [`context::RequestContext`]
//! and short-circuit; the error-normalization stage is the single point
//! where envelopes are produced. Handlers deposit their result in the
//! context's payload slot; an empty slot on success maps to 204.
//!
//! ```
//! use clipshelf_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 6);
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[5].name(), "shaping");
//! ```

#![doc(html_root_url = "https://docs.rs/clipshelf-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod params;
pub mod pipeline;
pub mod shape;
pub mod stages;
pub mod types;

pub use context::{RequestContext, ResponseSlot};
pub use middleware::{BoxFuture, FnHandler, Handler, Middleware, Next};
pub use params::{FilterParams, Limit, SearchCriteria};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use shape::shape_response;
pub use types::{Request, Response, ResponseExt};
