//! Comment operation handlers.
//!
//! Comments reference their video through `videoid`; creating a
//! comment against a video that does not exist is answered 404, same
//! as addressing the video directly.

use super::videos;
use clipshelf_core::{
    now_millis, validate_complete, validate_id, validate_patch, ApiError, ApiResult, Record,
    ResourceStore, Schema, TIMESTAMP_KEY,
};
use clipshelf_middleware::{RequestContext, ResponseSlot};
use http::StatusCode;
use serde_json::{json, Value};

/// The store collection name for comments.
pub const RESOURCE: &str = "comments";

/// Name of the field linking a comment to its video.
pub const VIDEO_ID_KEY: &str = "videoid";

/// `GET /comments`
pub async fn list(store: &dyn ResourceStore, ctx: &mut RequestContext) -> ApiResult<()> {
    let records = store.find(RESOURCE).await?;
    ctx.set_payload(ResponseSlot::Collection(records), StatusCode::OK);
    Ok(())
}

/// `POST /comments`
///
/// The referenced video must exist before the comment is stored.
pub async fn create(
    store: &dyn ResourceStore,
    schema: &Schema,
    ctx: &mut RequestContext,
    body: Value,
) -> ApiResult<()> {
    let mut record = validate_complete(schema, body)?;

    let video_id = referenced_video(&record)?;
    if store.find_by_id(videos::RESOURCE, video_id).await?.is_none() {
        return Err(ApiError::RecordNotFound {
            resource: videos::RESOURCE.to_string(),
            id: video_id.to_string(),
        });
    }

    record.insert(TIMESTAMP_KEY.to_string(), json!(now_millis()));
    let id = store.insert(RESOURCE, record).await?;
    let stored = fetch(store, id).await?;
    ctx.set_payload(ResponseSlot::Single(stored), StatusCode::CREATED);
    Ok(())
}

/// `GET /comments/{id}`
pub async fn get(
    store: &dyn ResourceStore,
    ctx: &mut RequestContext,
    raw_id: &str,
) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    let record = fetch(store, id).await?;
    ctx.set_payload(ResponseSlot::Single(record), StatusCode::OK);
    Ok(())
}

/// `PUT /comments/{id}`
pub async fn replace(
    store: &dyn ResourceStore,
    schema: &Schema,
    ctx: &mut RequestContext,
    raw_id: &str,
    body: Value,
) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    let existing = fetch(store, id).await?;

    let mut record = validate_complete(schema, body)?;
    if let Some(timestamp) = existing.get(TIMESTAMP_KEY) {
        record.insert(TIMESTAMP_KEY.to_string(), timestamp.clone());
    }

    store.replace(RESOURCE, id, record).await?;
    let stored = fetch(store, id).await?;
    ctx.set_payload(ResponseSlot::Single(stored), StatusCode::OK);
    Ok(())
}

/// `PATCH /comments/{id}`
pub async fn patch(
    store: &dyn ResourceStore,
    schema: &Schema,
    ctx: &mut RequestContext,
    raw_id: &str,
    body: Value,
) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    let existing = fetch(store, id).await?;

    let updated = validate_patch(schema, &existing, body)?;
    store.replace(RESOURCE, id, updated).await?;

    let stored = fetch(store, id).await?;
    ctx.set_payload(ResponseSlot::Single(stored), StatusCode::OK);
    Ok(())
}

/// `DELETE /comments/{id}`
pub async fn delete(store: &dyn ResourceStore, raw_id: &str) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    store.remove(RESOURCE, id).await?;
    Ok(())
}

/// Reads the referenced video id from a validated comment record.
///
/// `videoid` is schema-required as a number; a fractional or negative
/// value cannot address any video, so it maps to the same 404 the
/// lookup would produce.
fn referenced_video(record: &Record) -> ApiResult<u64> {
    record
        .get(VIDEO_ID_KEY)
        .and_then(Value::as_u64)
        .ok_or_else(|| ApiError::RecordNotFound {
            resource: videos::RESOURCE.to_string(),
            id: record
                .get(VIDEO_ID_KEY)
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
}

async fn fetch(store: &dyn ResourceStore, id: u64) -> ApiResult<Record> {
    store
        .find_by_id(RESOURCE, id)
        .await?
        .ok_or_else(|| ApiError::RecordNotFound {
            resource: RESOURCE.to_string(),
            id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{comment_schema, video_schema};
    use clipshelf_core::record_id;
    use clipshelf_store::MemoryStore;

    async fn seeded_video(store: &MemoryStore) -> u64 {
        let schema = video_schema();
        let mut ctx = RequestContext::new();
        videos::create(
            store,
            &schema,
            &mut ctx,
            json!({"title": "T", "src": "t.mp4", "length": 10}),
        )
        .await
        .unwrap();

        match ctx.take_payload().unwrap() {
            ResponseSlot::Single(record) => record_id(&record).unwrap(),
            ResponseSlot::Collection(_) => panic!("expected single record"),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_likes_and_dislikes() {
        let store = MemoryStore::new();
        let schema = comment_schema();
        let video_id = seeded_video(&store).await;

        let mut ctx = RequestContext::new();
        create(
            &store,
            &schema,
            &mut ctx,
            json!({"text": "nice", "videoid": video_id}),
        )
        .await
        .unwrap();

        assert_eq!(ctx.payload_status(), StatusCode::CREATED);
        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(record["likes"], json!(0));
        assert_eq!(record["dislikes"], json!(0));
        assert_eq!(record["videoid"], json!(video_id));
    }

    #[tokio::test]
    async fn test_create_requires_existing_video() {
        let store = MemoryStore::new();
        let schema = comment_schema();
        let mut ctx = RequestContext::new();

        let err = create(
            &store,
            &schema,
            &mut ctx,
            json!({"text": "orphan", "videoid": 999}),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ApiError::RecordNotFound { ref resource, .. } if resource == "videos"
        ));
        assert!(store.is_empty(RESOURCE));
    }

    #[tokio::test]
    async fn test_fractional_videoid_is_not_found() {
        let store = MemoryStore::new();
        let schema = comment_schema();
        let mut ctx = RequestContext::new();

        let err = create(
            &store,
            &schema,
            &mut ctx,
            json!({"text": "x", "videoid": 1.5}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_patch_updates_likes() {
        let store = MemoryStore::new();
        let schema = comment_schema();
        let video_id = seeded_video(&store).await;

        let mut ctx = RequestContext::new();
        create(
            &store,
            &schema,
            &mut ctx,
            json!({"text": "nice", "videoid": video_id}),
        )
        .await
        .unwrap();
        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        let id = record_id(&record).unwrap();

        let mut ctx = RequestContext::new();
        patch(&store, &schema, &mut ctx, &id.to_string(), json!({"likes": 3}))
            .await
            .unwrap();

        let ResponseSlot::Single(updated) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(updated["likes"], json!(3));
        assert_eq!(updated["text"], json!("nice"));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let schema = comment_schema();
        let video_id = seeded_video(&store).await;

        let mut ctx = RequestContext::new();
        create(
            &store,
            &schema,
            &mut ctx,
            json!({"text": "bye", "videoid": video_id}),
        )
        .await
        .unwrap();
        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        let id = record_id(&record).unwrap();

        delete(&store, &id.to_string()).await.unwrap();
        assert!(store.is_empty(RESOURCE));

        let err = delete(&store, &id.to_string()).await.unwrap_err();
        assert!(matches!(err, ApiError::RecordNotFound { .. }));
    }
}
