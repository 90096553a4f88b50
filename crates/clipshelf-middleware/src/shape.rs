//! Response shaping: search, projection, pagination.
//!
//! [`shape_response`] is the single canonical implementation of the
//! shaping contract. Order of operations is fixed:
//!
//! 1. a single record skips search and pagination entirely;
//! 2. search retains collection members matching every criterion;
//! 3. projection replaces each record with a copy holding only the
//!    requested fields (missing fields are absent, not null);
//! 4. pagination slices `offset..offset + min(limit, remaining)`, and
//!    an offset at or past the end of a non-empty collection is a 400.
//!
//! Records are rebuilt, never truncated in place, so store-held values
//! are untouched by projection.

use clipshelf_core::{ApiError, ApiResult, Record, Schema, TypeTag};
use serde_json::Value;

use crate::context::ResponseSlot;
use crate::params::{FilterParams, SearchCriteria};

/// Shapes a handler payload according to the request's directives.
pub fn shape_response(
    schema: &Schema,
    params: &FilterParams,
    search: &SearchCriteria,
    slot: ResponseSlot,
) -> ApiResult<ResponseSlot> {
    match slot {
        ResponseSlot::Single(record) => Ok(ResponseSlot::Single(project(params, &record))),
        ResponseSlot::Collection(items) => {
            let retained: Vec<Record> = items
                .into_iter()
                .filter(|record| matches_all(schema, search, record))
                .collect();
            let projected: Vec<Record> = retained
                .iter()
                .map(|record| project(params, record))
                .collect();
            Ok(ResponseSlot::Collection(paginate(params, projected)?))
        }
    }
}

/// Builds the projected copy of a record.
///
/// An empty projection keeps every field. Requested fields the record
/// does not carry are simply absent from the copy.
fn project(params: &FilterParams, record: &Record) -> Record {
    if params.projection().is_empty() {
        return record.clone();
    }

    let mut projected = Record::new();
    for field in params.projection() {
        if let Some(value) = record.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    projected
}

fn matches_all(schema: &Schema, search: &SearchCriteria, record: &Record) -> bool {
    search
        .terms()
        .all(|(field, raw)| matches_criterion(schema, record, field, raw))
}

/// Resolves one criterion against the declared field type.
///
/// Numbers compare for equality after parsing the raw query value;
/// strings compare by case-sensitive substring containment. A record
/// without the field never matches. Criteria on boolean/array fields
/// have no defined comparison and retain the record.
#[allow(clippy::float_cmp)]
fn matches_criterion(schema: &Schema, record: &Record, field: &str, raw: &str) -> bool {
    let Some(value) = record.get(field) else {
        return false;
    };

    match schema.type_of(field) {
        Some(TypeTag::Number) => match (raw.parse::<f64>(), value.as_f64()) {
            (Ok(wanted), Some(actual)) => actual == wanted,
            _ => false,
        },
        Some(TypeTag::String) => value.as_str().is_some_and(|text| text.contains(raw)),
        _ => true,
    }
}

fn paginate(params: &FilterParams, items: Vec<Record>) -> ApiResult<Vec<Record>> {
    let len = items.len();
    let offset = params.offset();

    if offset >= len && len > 0 {
        return Err(ApiError::OffsetOutOfRange { offset, len });
    }

    let take = params.limit().cap(len.saturating_sub(offset));
    Ok(items.into_iter().skip(offset).take(take).collect())
}

/// Convenience for tests and handlers assembling records literally.
#[must_use]
pub fn record_from(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Limit;
    use serde_json::json;

    fn video_schema() -> Schema {
        Schema::builder("videos")
            .required("title", TypeTag::String)
            .required("length", TypeTag::Number)
            .optional("ranking", TypeTag::Number, json!(0))
            .internal("id", TypeTag::Number)
            .build()
    }

    fn videos() -> Vec<Record> {
        vec![
            record_from(json!({"id": 1, "title": "foo bar", "length": 10, "ranking": 3})),
            record_from(json!({"id": 2, "title": "baz", "length": 20, "ranking": 1})),
            record_from(json!({"id": 3, "title": "foo", "length": 10, "ranking": 2})),
        ]
    }

    fn shape(
        params: &FilterParams,
        search: &SearchCriteria,
        items: Vec<Record>,
    ) -> ApiResult<Vec<Record>> {
        match shape_response(
            &video_schema(),
            params,
            search,
            ResponseSlot::Collection(items),
        )? {
            ResponseSlot::Collection(items) => Ok(items),
            ResponseSlot::Single(_) => unreachable!(),
        }
    }

    #[test]
    fn test_identity_with_defaults() {
        let items = videos();
        let shaped = shape(&FilterParams::default(), &SearchCriteria::default(), items.clone())
            .unwrap();
        assert_eq!(shaped, items);
    }

    #[test]
    fn test_substring_search() {
        let search = SearchCriteria::default().with_term("title", "foo");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert_eq!(shaped.len(), 2);
        assert!(shaped.iter().all(|r| r["title"].as_str().unwrap().contains("foo")));
    }

    #[test]
    fn test_numeric_search_is_exact() {
        let search = SearchCriteria::default().with_term("length", "10");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert_eq!(shaped.len(), 2);

        let search = SearchCriteria::default().with_term("length", "15");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_search_is_conjunctive() {
        let search = SearchCriteria::default()
            .with_term("title", "foo")
            .with_term("length", "10");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert_eq!(shaped.len(), 2);

        let search = SearchCriteria::default()
            .with_term("title", "baz")
            .with_term("length", "10");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_unparsable_numeric_criterion_matches_nothing() {
        let search = SearchCriteria::default().with_term("length", "ten");
        let shaped = shape(&FilterParams::default(), &search, videos()).unwrap();
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_projection_exposes_only_listed_keys() {
        let params = FilterParams::new(
            vec!["title".into(), "length".into()],
            0,
            Limit::Unbounded,
        );
        let shaped = shape(&params, &SearchCriteria::default(), videos()).unwrap();
        for record in shaped {
            let keys: Vec<_> = record.keys().map(String::as_str).collect();
            assert_eq!(keys, ["title", "length"]);
        }
    }

    #[test]
    fn test_projection_of_missing_field_is_absent() {
        let params = FilterParams::new(vec!["title".into(), "ranking".into()], 0, Limit::Unbounded);
        let record = record_from(json!({"id": 9, "title": "T", "length": 1}));
        let shaped = shape_response(
            &video_schema(),
            &params,
            &SearchCriteria::default(),
            ResponseSlot::Single(record),
        )
        .unwrap();
        assert_eq!(shaped.into_value(), json!({"title": "T"}));
    }

    #[test]
    fn test_single_record_skips_search_and_pagination() {
        // A search term that would never match, plus an out-of-range
        // offset: both are ignored for single records.
        let params = FilterParams::new(Vec::new(), 99, Limit::Count(1));
        let search = SearchCriteria::default().with_term("title", "nope");
        let record = record_from(json!({"id": 1, "title": "T", "length": 1}));
        let shaped = shape_response(
            &video_schema(),
            &params,
            &search,
            ResponseSlot::Single(record.clone()),
        )
        .unwrap();
        assert_eq!(shaped, ResponseSlot::Single(record));
    }

    #[test]
    fn test_pagination_boundaries() {
        let items = videos();
        let n = items.len();

        // offset == N fails.
        let params = FilterParams::new(Vec::new(), n, Limit::Unbounded);
        let err = shape(&params, &SearchCriteria::default(), items.clone()).unwrap_err();
        assert!(matches!(err, ApiError::OffsetOutOfRange { .. }));

        // offset == N-1 with a generous limit returns exactly one item.
        let params = FilterParams::new(Vec::new(), n - 1, Limit::Count(100));
        let shaped = shape(&params, &SearchCriteria::default(), items.clone()).unwrap();
        assert_eq!(shaped.len(), 1);

        // offset == 0, limit == 1 returns exactly the first item.
        let params = FilterParams::new(Vec::new(), 0, Limit::Count(1));
        let shaped = shape(&params, &SearchCriteria::default(), items.clone()).unwrap();
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0]["id"], json!(1));
    }

    #[test]
    fn test_empty_collection_with_zero_offset_is_fine() {
        let shaped = shape(&FilterParams::default(), &SearchCriteria::default(), Vec::new())
            .unwrap();
        assert!(shaped.is_empty());
    }

    #[test]
    fn test_pagination_applies_after_search() {
        // Two of three match the search; offset 1 into the matches.
        let params = FilterParams::new(Vec::new(), 1, Limit::Unbounded);
        let search = SearchCriteria::default().with_term("length", "10");
        let shaped = shape(&params, &search, videos()).unwrap();
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0]["id"], json!(3));
    }
}
