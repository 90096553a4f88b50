//! # Clipshelf Core
//!
//! Core types for the Clipshelf REST framework: declarative resource
//! schemas, payload/identifier validation, the error taxonomy with its
//! HTTP status mapping, and the backing-store trait.
//!
//! Resources (videos, comments, ...) are described by a [`Schema`] built
//! once at startup. Validators consume a schema plus a raw JSON payload
//! and produce a normalized [`Record`] or an [`ApiError`] carrying the
//! status code the HTTP layer should answer with.
//!
//! ## Example
//!
//! ```
//! use clipshelf_core::{Schema, TypeTag, validate_complete};
//! use serde_json::json;
//!
//! let schema = Schema::builder("videos")
//!     .required("title", TypeTag::String)
//!     .optional("ranking", TypeTag::Number, json!(0))
//!     .internal("id", TypeTag::Number)
//!     .build();
//!
//! let record = validate_complete(&schema, json!({"title": "T"})).unwrap();
//! assert_eq!(record["ranking"], json!(0));
//! ```

#![doc(html_root_url = "https://docs.rs/clipshelf-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod record;
pub mod schema;
pub mod store;
pub mod validate;

pub use error::{ApiError, ApiResult, ErrorEnvelope};
pub use record::{now_millis, record_id, Record, ID_KEY, TIMESTAMP_KEY};
pub use schema::{FieldDescriptor, FieldRole, Schema, SchemaBuilder, TypeTag};
pub use store::{BoxFuture, ResourceStore, StoreError, StoreResult};
pub use validate::{validate_complete, validate_id, validate_patch};
