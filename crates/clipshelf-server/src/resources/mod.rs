//! Resource definitions and operation handlers.
//!
//! Each resource declares its schema here, once, at startup; the
//! validators, filter parser and search parser all read the same
//! schema. Handlers live in the per-resource submodules and only move
//! records between the store and the request context; response shaping
//! belongs to the pipeline.

use clipshelf_core::{ApiError, ApiResult, Record, Schema, TypeTag};
use clipshelf_middleware::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;

pub mod comments;
pub mod videos;

/// The operations the route table can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /videos`
    ListVideos,
    /// `POST /videos`
    CreateVideo,
    /// `GET /videos/{id}`
    GetVideo,
    /// `PUT /videos/{id}`
    ReplaceVideo,
    /// `PATCH /videos/{id}`
    PatchVideo,
    /// `DELETE /videos/{id}` (cascades to the video's comments)
    DeleteVideo,
    /// `GET /videos/{id}/comments`
    ListVideoComments,
    /// `DELETE /videos/{id}/comments`
    DeleteVideoComments,
    /// `GET /comments`
    ListComments,
    /// `POST /comments`
    CreateComment,
    /// `GET /comments/{id}`
    GetComment,
    /// `PUT /comments/{id}`
    ReplaceComment,
    /// `PATCH /comments/{id}`
    PatchComment,
    /// `DELETE /comments/{id}`
    DeleteComment,
}

impl Operation {
    /// Returns the resource whose schema and pipeline serve this
    /// operation.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::ListComments
            | Self::CreateComment
            | Self::GetComment
            | Self::ReplaceComment
            | Self::PatchComment
            | Self::DeleteComment => comments::RESOURCE,
            _ => videos::RESOURCE,
        }
    }
}

/// Builds the videos schema.
///
/// `playcount` is the designated counter field: PATCH accepts signed
/// deltas (`"+1"`, `"-2"`) for it instead of replacement values.
#[must_use]
pub fn video_schema() -> Schema {
    Schema::builder(videos::RESOURCE)
        .required("title", TypeTag::String)
        .required("src", TypeTag::String)
        .required("length", TypeTag::Number)
        .optional("description", TypeTag::String, json!(""))
        .optional("playcount", TypeTag::Number, json!(0))
        .optional("ranking", TypeTag::Number, json!(0))
        .internal("id", TypeTag::Number)
        .internal("timestamp", TypeTag::Number)
        .counter("playcount")
        .build()
}

/// Builds the comments schema.
#[must_use]
pub fn comment_schema() -> Schema {
    Schema::builder(comments::RESOURCE)
        .required("text", TypeTag::String)
        .required(comments::VIDEO_ID_KEY, TypeTag::Number)
        .optional("likes", TypeTag::Number, json!(0))
        .optional("dislikes", TypeTag::Number, json!(0))
        .internal("id", TypeTag::Number)
        .internal("timestamp", TypeTag::Number)
        .build()
}

/// Demo fixtures for local runs: two videos and a comment on the first.
#[must_use]
pub fn demo_seed() -> HashMap<String, Vec<Record>> {
    let as_record = |value: Value| value.as_object().cloned().unwrap_or_default();

    let mut seed = HashMap::new();
    seed.insert(
        videos::RESOURCE.to_string(),
        vec![
            as_record(json!({
                "id": 1,
                "title": "Ten Minute Pasta",
                "src": "pasta.mp4",
                "length": 600,
                "description": "Weeknight carbonara from scratch",
                "playcount": 42,
                "ranking": 3,
                "timestamp": 1_706_000_000_000_u64,
            })),
            as_record(json!({
                "id": 2,
                "title": "Sourdough Basics",
                "src": "sourdough.mp4",
                "length": 1260,
                "description": "",
                "playcount": 7,
                "ranking": 0,
                "timestamp": 1_706_100_000_000_u64,
            })),
        ],
    );
    seed.insert(
        comments::RESOURCE.to_string(),
        vec![as_record(json!({
            "id": 3,
            "text": "tried this tonight, worked great",
            "videoid": 1,
            "likes": 5,
            "dislikes": 0,
            "timestamp": 1_706_200_000_000_u64,
        }))],
    );
    seed
}

/// Reads and parses the JSON body of a write request.
///
/// An empty body is rejected the same way as a non-JSON one; write
/// verbs always require a JSON object payload.
pub(crate) async fn read_json_body(request: Request) -> ApiResult<Value> {
    let collected = match request.into_body().collect().await {
        Ok(collected) => collected,
        Err(never) => match never {},
    };

    let bytes = collected.to_bytes();
    if bytes.is_empty() {
        return Err(ApiError::MalformedBody {
            detail: "body is empty".to_string(),
        });
    }

    serde_json::from_slice(&bytes).map_err(|err| ApiError::MalformedBody {
        detail: err.to_string(),
    })
}
