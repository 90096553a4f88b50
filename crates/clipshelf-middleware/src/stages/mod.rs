//! The stages of the standard pipeline.
//!
//! Execution order is fixed (see [`crate::pipeline::Stage`]):
//!
//! 1. [`request_id`] - assign a request id, log the request line
//! 2. [`error_normalization`] - error envelope formatting
//! 3. [`negotiation`] - Accept-Version / Accept / Content-Type
//! 4. [`filter`] - `filter`/`offset`/`limit` parsing
//! 5. [`search`] - search criteria parsing
//! 6. [`shaping`] - post-handler response shaping

pub mod error_normalization;
pub mod filter;
pub mod negotiation;
pub mod request_id;
pub mod search;
pub mod shaping;

pub use error_normalization::ErrorNormalizationStage;
pub use filter::FilterParserStage;
pub use negotiation::NegotiationStage;
pub use request_id::RequestIdStage;
pub use search::SearchParserStage;
pub use shaping::ShapingStage;
