//! Query-parameter parsing for response shaping.
//!
//! Two parsers share the query string of a collection request:
//!
//! - [`parse_filter_params`] consumes the reserved keys `filter`,
//!   `offset` and `limit` into a [`FilterParams`] directive;
//! - [`parse_search_params`] treats every other key as a per-field
//!   search criterion, validated against the resource schema.
//!
//! Both are pure functions over the decoded query pairs; attaching the
//! results to the request is the job of the filter/search stages.

use clipshelf_core::{ApiError, ApiResult, Schema};

/// Reserved query key for field projection.
pub const FILTER_KEY: &str = "filter";
/// Reserved query key for the pagination offset.
pub const OFFSET_KEY: &str = "offset";
/// Reserved query key for the pagination limit.
pub const LIMIT_KEY: &str = "limit";

/// Pagination limit: either unbounded (the default) or a positive count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    /// No limit was requested.
    #[default]
    Unbounded,
    /// At most this many items.
    Count(usize),
}

impl Limit {
    /// Caps an available item count by this limit.
    #[must_use]
    pub fn cap(self, available: usize) -> usize {
        match self {
            Self::Unbounded => available,
            Self::Count(n) => n.min(available),
        }
    }
}

/// Parsed `filter`/`offset`/`limit` directives of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    projection: Vec<String>,
    offset: usize,
    limit: Limit,
}

impl FilterParams {
    /// Creates directives from already-validated parts.
    #[must_use]
    pub fn new(projection: Vec<String>, offset: usize, limit: Limit) -> Self {
        Self {
            projection,
            offset,
            limit,
        }
    }

    /// Field names to project; empty means "all fields".
    #[must_use]
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Pagination offset, defaulting to 0.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Pagination limit, defaulting to unbounded.
    #[must_use]
    pub fn limit(&self) -> Limit {
        self.limit
    }
}

/// Per-field search criteria, conjunctive.
///
/// Values are kept as the raw query strings; comparison semantics are
/// resolved against the schema's type tags at shaping time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    terms: Vec<(String, String)>,
}

impl SearchCriteria {
    /// Adds a criterion; builder-style, mainly for tests.
    #[must_use]
    pub fn with_term(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    /// Checks whether any criterion is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates the `(field, raw value)` pairs in query order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Decodes a raw query string into ordered key/value pairs.
pub fn parse_query(query: &str) -> ApiResult<Vec<(String, String)>> {
    serde_urlencoded::from_str(query).map_err(|err| ApiError::InvalidQueryString {
        detail: err.to_string(),
    })
}

/// Parses the reserved `filter`, `offset` and `limit` keys.
///
/// Unknown projection tokens fail with 400; all three directives fall
/// back to their defaults when absent. Repeated keys: last one wins.
pub fn parse_filter_params(schema: &Schema, pairs: &[(String, String)]) -> ApiResult<FilterParams> {
    let mut params = FilterParams::default();

    for (key, value) in pairs {
        match key.as_str() {
            FILTER_KEY => params.projection = parse_projection(schema, value)?,
            OFFSET_KEY => {
                params.offset = value.trim().parse().map_err(|_| ApiError::InvalidOffset)?;
            }
            LIMIT_KEY => {
                let limit: usize = value.trim().parse().map_err(|_| ApiError::InvalidLimit)?;
                if limit == 0 {
                    return Err(ApiError::InvalidLimit);
                }
                params.limit = Limit::Count(limit);
            }
            _ => {}
        }
    }

    Ok(params)
}

/// Parses every non-reserved query key as a search criterion.
pub fn parse_search_params(
    schema: &Schema,
    pairs: &[(String, String)],
) -> ApiResult<SearchCriteria> {
    let mut criteria = SearchCriteria::default();

    for (key, value) in pairs {
        if matches!(key.as_str(), FILTER_KEY | OFFSET_KEY | LIMIT_KEY) {
            continue;
        }
        if !schema.contains(key) {
            return Err(ApiError::UnknownSearchKey { key: key.clone() });
        }
        criteria.terms.push((key.clone(), value.clone()));
    }

    Ok(criteria)
}

fn parse_projection(schema: &Schema, value: &str) -> ApiResult<Vec<String>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut fields = Vec::new();
    for token in value.split(',') {
        let token = token.trim();
        if !schema.contains(token) {
            return Err(ApiError::UnknownFilterKey {
                key: token.to_string(),
            });
        }
        fields.push(token.to_string());
    }
    Ok(fields)
}
