//! Payload and identifier validation.
//!
//! Two payload validators exist, both schema-driven and side-effect
//! free (they never touch the store):
//!
//! - [`validate_complete`] normalizes a create/replace payload:
//!   internal keys are stripped unconditionally, required keys are
//!   checked, types are matched exactly, negative numbers are rejected,
//!   unknown keys are dropped silently, and optional defaults are
//!   merged. Timestamp assignment stays with the caller, which stamps a
//!   fresh one on create and preserves the existing one on replace.
//!
//! - [`validate_patch`] applies a partial update copy-on-write: the
//!   stored record is only replaced after the entire patch validated.
//!   Unknown keys are ignored (deliberately more permissive than full
//!   validation), and the schema's counter field accepts signed-delta
//!   strings applied as increments.
//!
//! [`validate_id`] checks a path identifier for format and existence;
//! it performs the single store suspension of the addressing step and
//! returns the parsed id so callers never re-parse.

use crate::error::{ApiError, ApiResult};
use crate::record::Record;
use crate::schema::{FieldRole, Schema};
use crate::store::ResourceStore;
use serde_json::Value;

/// Validates a complete create/replace payload against the schema.
///
/// Returns the normalized record with all optional defaults merged.
/// The result never contains a client-supplied internal key.
pub fn validate_complete(schema: &Schema, payload: Value) -> ApiResult<Record> {
    let mut data = into_object(payload).map_err(|err| reject(schema, err))?;

    // Clients can never set id/timestamp, valid or not.
    for field in schema.fields_with_role(FieldRole::Internal) {
        data.remove(field.name());
    }

    for field in schema.fields_with_role(FieldRole::Required) {
        if !data.contains_key(field.name()) {
            return Err(reject(
                schema,
                ApiError::MissingRequiredField {
                    field: field.name().to_string(),
                },
            ));
        }
    }

    for field in schema.fields() {
        if let Some(value) = data.get(field.name()) {
            if !field.tag().matches(value) {
                return Err(reject(
                    schema,
                    ApiError::TypeMismatch {
                        field: field.name().to_string(),
                        expected: field.tag().name(),
                    },
                ));
            }
            if value.as_f64().is_some_and(|n| n < 0.0) {
                return Err(reject(
                    schema,
                    ApiError::NegativeValue {
                        field: field.name().to_string(),
                    },
                ));
            }
        }
    }

    // Permissive extra fields: unknown keys are dropped, not errors.
    data.retain(|key, _| schema.contains(key));

    for field in schema.fields_with_role(FieldRole::Optional) {
        if !data.contains_key(field.name()) {
            if let Some(default) = field.default() {
                data.insert(field.name().to_string(), default.clone());
            }
        }
    }

    Ok(data)
}

/// Validates a partial update and returns the patched record.
///
/// The original is cloned; the store-held value must only be replaced
/// by the caller after this returns `Ok`, making the patch atomic as
/// observed through the store.
pub fn validate_patch(schema: &Schema, original: &Record, patch: Value) -> ApiResult<Record> {
    let patch = into_object(patch).map_err(|err| reject(schema, err))?;
    let mut updated = original.clone();

    for (key, value) in patch {
        let Some(field) = schema.field(&key) else {
            // Unknown patch keys are ignored, not errors.
            continue;
        };
        if field.role() == FieldRole::Internal {
            continue;
        }

        if schema.counter_field() == Some(key.as_str()) {
            let delta = parse_signed_delta(&key, &value).map_err(|err| reject(schema, err))?;
            let current = updated.get(&key).and_then(Value::as_i64).unwrap_or(0);
            updated.insert(key, Value::from(current.saturating_add(delta)));
            continue;
        }

        if !field.tag().matches(&value) {
            return Err(reject(
                schema,
                ApiError::TypeMismatch {
                    field: key,
                    expected: field.tag().name(),
                },
            ));
        }
        updated.insert(key, value);
    }

    Ok(updated)
}

/// Validates a path identifier: format, then existence in the store.
///
/// Returns the parsed id on success so the caller can fetch/mutate
/// without re-parsing. A malformed id answers 404, matching the
/// documented contract (see [`ApiError::InvalidIdFormat`]).
pub async fn validate_id(
    store: &dyn ResourceStore,
    resource: &str,
    raw: &str,
) -> ApiResult<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::MissingId);
    }

    let id: u64 = raw
        .parse()
        .map_err(|_| ApiError::InvalidIdFormat { raw: raw.into() })?;

    match store.find_by_id(resource, id).await? {
        Some(_) => Ok(id),
        None => Err(ApiError::RecordNotFound {
            resource: resource.to_string(),
            id: raw.to_string(),
        }),
    }
}

/// Parses a signed-delta string (`"+5"`, `"-2"`) for the counter field.
fn parse_signed_delta(field: &str, value: &Value) -> ApiResult<i64> {
    let err = || ApiError::InvalidDeltaFormat {
        field: field.to_string(),
    };

    let text = value.as_str().ok_or_else(err)?;
    let sign = match text.as_bytes().first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(err()),
    };
    let digits = &text[1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let magnitude: i64 = digits.parse().map_err(|_| err())?;
    Ok(sign * magnitude)
}

/// Logs a payload rejection before handing the error back.
fn reject(schema: &Schema, err: ApiError) -> ApiError {
    tracing::debug!(resource = schema.resource(), error = %err, "payload rejected");
    err
}

fn into_object(payload: Value) -> ApiResult<Record> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::MalformedBody {
            detail: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
