//! Video operation handlers.
//!
//! Handlers validate, talk to the store, and deposit their result in
//! the context's payload slot; the shaping stage turns the slot into
//! the wire response. Deleting a video also deletes its comments, so
//! no comment can outlive the video it refers to.

use super::comments;
use clipshelf_core::{
    now_millis, record_id, validate_complete, validate_id, validate_patch, ApiError, ApiResult,
    Record, ResourceStore, Schema, TIMESTAMP_KEY,
};
use clipshelf_middleware::{RequestContext, ResponseSlot};
use http::StatusCode;
use serde_json::{json, Value};

/// The store collection name for videos.
pub const RESOURCE: &str = "videos";

/// `GET /videos`
pub async fn list(store: &dyn ResourceStore, ctx: &mut RequestContext) -> ApiResult<()> {
    let records = store.find(RESOURCE).await?;
    ctx.set_payload(ResponseSlot::Collection(records), StatusCode::OK);
    Ok(())
}

/// `POST /videos`
pub async fn create(
    store: &dyn ResourceStore,
    schema: &Schema,
    ctx: &mut RequestContext,
    body: Value,
) -> ApiResult<()> {
    let mut record = validate_complete(schema, body)?;
    record.insert(TIMESTAMP_KEY.to_string(), json!(now_millis()));

    let id = store.insert(RESOURCE, record).await?;
    let stored = fetch(store, id).await?;
    ctx.set_payload(ResponseSlot::Single(stored), StatusCode::CREATED);
    Ok(())
}

/// `GET /videos/{id}`
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

/// `PUT /videos/{id}`
///
/// Wholesale replacement; the server-managed id and creation timestamp
/// survive the replace.
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

/// `PATCH /videos/{id}`
///
/// Partial update; `playcount` accepts signed deltas.
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

/// `DELETE /videos/{id}`
///
/// Removes the video and every comment referencing it. The payload
/// slot stays empty, which the shaping stage maps to 204.
pub async fn delete(store: &dyn ResourceStore, raw_id: &str) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    store.remove(RESOURCE, id).await?;
    remove_comments_for(store, id).await?;
    Ok(())
}

/// `GET /videos/{id}/comments`
pub async fn list_comments(
    store: &dyn ResourceStore,
    ctx: &mut RequestContext,
    raw_id: &str,
) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    let records = comments_for(store, id).await?;
    ctx.set_payload(ResponseSlot::Collection(records), StatusCode::OK);
    Ok(())
}

/// `DELETE /videos/{id}/comments`
pub async fn delete_comments(store: &dyn ResourceStore, raw_id: &str) -> ApiResult<()> {
    let id = validate_id(store, RESOURCE, raw_id).await?;
    remove_comments_for(store, id).await?;
    Ok(())
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

async fn comments_for(store: &dyn ResourceStore, video_id: u64) -> ApiResult<Vec<Record>> {
    let all = store.find(comments::RESOURCE).await?;
    Ok(all
        .into_iter()
        .filter(|record| {
            record
                .get(comments::VIDEO_ID_KEY)
                .and_then(Value::as_u64)
                == Some(video_id)
        })
        .collect())
}

async fn remove_comments_for(store: &dyn ResourceStore, video_id: u64) -> ApiResult<()> {
    for comment in comments_for(store, video_id).await? {
        if let Some(comment_id) = record_id(&comment) {
            store.remove(comments::RESOURCE, comment_id).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{comment_schema, video_schema};
    use clipshelf_store::MemoryStore;

    async fn seeded_video(store: &MemoryStore) -> u64 {
        let schema = video_schema();
        let mut ctx = RequestContext::new();
        create(
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
    async fn test_create_applies_defaults_and_stamps() {
        let store = MemoryStore::new();
        let schema = video_schema();
        let mut ctx = RequestContext::new();

        create(
            &store,
            &schema,
            &mut ctx,
            json!({"title": "T", "src": "t.mp4", "length": 10}),
        )
        .await
        .unwrap();

        assert_eq!(ctx.payload_status(), StatusCode::CREATED);
        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(record["description"], json!(""));
        assert_eq!(record["playcount"], json!(0));
        assert_eq!(record["ranking"], json!(0));
        assert!(record["timestamp"].as_u64().unwrap() > 0);
        assert!(record_id(&record).is_some());
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let mut ctx = RequestContext::new();

        let err = get(&store, &mut ctx, "999").await.unwrap_err();
        assert!(matches!(err, ApiError::RecordNotFound { .. }));

        let err = get(&store, &mut ctx, "abc").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidIdFormat { .. }));
    }

    #[tokio::test]
    async fn test_replace_preserves_id_and_timestamp() {
        let store = MemoryStore::new();
        let schema = video_schema();
        let id = seeded_video(&store).await;

        let before = store.find_by_id(RESOURCE, id).await.unwrap().unwrap();
        let original_timestamp = before["timestamp"].clone();

        let mut ctx = RequestContext::new();
        replace(
            &store,
            &schema,
            &mut ctx,
            &id.to_string(),
            json!({"title": "New", "src": "n.mp4", "length": 99}),
        )
        .await
        .unwrap();

        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(record["title"], json!("New"));
        assert_eq!(record_id(&record), Some(id));
        assert_eq!(record["timestamp"], original_timestamp);
    }

    #[tokio::test]
    async fn test_patch_counter_delta() {
        let store = MemoryStore::new();
        let schema = video_schema();
        let id = seeded_video(&store).await;

        let mut ctx = RequestContext::new();
        patch(
            &store,
            &schema,
            &mut ctx,
            &id.to_string(),
            json!({"playcount": "+5"}),
        )
        .await
        .unwrap();

        let ResponseSlot::Single(record) = ctx.take_payload().unwrap() else {
            panic!("expected single record");
        };
        assert_eq!(record["playcount"], json!(5));
        assert_eq!(record["title"], json!("T"));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_comments() {
        let store = MemoryStore::new();
        let comment_schema = comment_schema();
        let id = seeded_video(&store).await;

        let mut ctx = RequestContext::new();
        comments::create(
            &store,
            &comment_schema,
            &mut ctx,
            json!({"text": "nice", "videoid": id}),
        )
        .await
        .unwrap();
        assert_eq!(store.len(comments::RESOURCE), 1);

        delete(&store, &id.to_string()).await.unwrap();

        assert!(store.is_empty(RESOURCE));
        assert!(store.is_empty(comments::RESOURCE));
    }

    #[tokio::test]
    async fn test_list_comments_filters_by_video() {
        let store = MemoryStore::new();
        let comment_schema = comment_schema();
        let first = seeded_video(&store).await;
        let second = seeded_video(&store).await;

        for (text, videoid) in [("a", first), ("b", first), ("c", second)] {
            let mut ctx = RequestContext::new();
            comments::create(
                &store,
                &comment_schema,
                &mut ctx,
                json!({"text": text, "videoid": videoid}),
            )
            .await
            .unwrap();
        }

        let mut ctx = RequestContext::new();
        list_comments(&store, &mut ctx, &first.to_string())
            .await
            .unwrap();

        let ResponseSlot::Collection(records) = ctx.take_payload().unwrap() else {
            panic!("expected collection");
        };
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r["videoid"].as_u64() == Some(first)));
    }
}
