//! Declarative resource schemas.
//!
//! A [`Schema`] describes a resource as a flat set of field descriptors,
//! each carrying a primitive type tag and a role: client-supplied and
//! mandatory ([`FieldRole::Required`]), client-supplied with a declared
//! default ([`FieldRole::Optional`]), or server-managed and never
//! settable by clients ([`FieldRole::Internal`]).
//!
//! One schema is built per resource at startup and shared read-only by
//! the payload validator, the filter parser and the search parser, so
//! the three no longer keep their own drifting copies of the key lists.
//!
//! # Example
//!
//! ```
//! use clipshelf_core::{Schema, TypeTag};
//! use serde_json::json;
//!
//! let videos = Schema::builder("videos")
//!     .required("title", TypeTag::String)
//!     .required("src", TypeTag::String)
//!     .required("length", TypeTag::Number)
//!     .optional("description", TypeTag::String, json!(""))
//!     .optional("playcount", TypeTag::Number, json!(0))
//!     .internal("id", TypeTag::Number)
//!     .internal("timestamp", TypeTag::Number)
//!     .counter("playcount")
//!     .build();
//!
//! assert!(videos.contains("title"));
//! assert_eq!(videos.counter_field(), Some("playcount"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive type tag for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// JSON string.
    String,
    /// JSON number (integer or float).
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON array.
    Array,
}

impl TypeTag {
    /// Returns the human-readable name of this type tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }

    /// Checks whether a JSON value matches this type tag exactly.
    ///
    /// No coercion is performed: `"5"` does not match [`TypeTag::Number`].
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The role a field plays in its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Must be present in every create/replace payload.
    Required,
    /// May be omitted; the declared default is merged in.
    Optional,
    /// Server-managed (`id`, `timestamp`); client-supplied values are
    /// discarded before validation.
    Internal,
}

/// A single field of a resource schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    tag: TypeTag,
    role: FieldRole,
    default: Option<Value>,
}

impl FieldDescriptor {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type tag.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Returns the field role.
    #[must_use]
    pub fn role(&self) -> FieldRole {
        self.role
    }

    /// Returns the declared default value, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Immutable, resource-scoped schema.
///
/// Constructed once per resource at startup via [`Schema::builder`] and
/// shared by reference afterwards. Field names are disjoint across the
/// three roles; the builder enforces this.
#[derive(Debug, Clone)]
pub struct Schema {
    resource: String,
    fields: Vec<FieldDescriptor>,
    counter_field: Option<String>,
}

impl Schema {
    /// Creates a new schema builder for the named resource.
    #[must_use]
    pub fn builder(resource: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            resource: resource.into(),
            fields: Vec::new(),
            counter_field: None,
        }
    }

    /// Returns the resource name this schema describes.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Looks up a field descriptor by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks whether the name is a known field of any role.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the declared type tag of a field, if known.
    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<TypeTag> {
        self.field(name).map(FieldDescriptor::tag)
    }

    /// Returns all field descriptors in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Returns the descriptors with the given role.
    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.role == role)
    }

    /// Returns all field names (the union of the three roles).
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the designated counter field, if any.
    ///
    /// The counter field accepts signed-delta patch strings (`"+5"`,
    /// `"-2"`) that are applied as increments instead of replacements.
    #[must_use]
    pub fn counter_field(&self) -> Option<&str> {
        self.counter_field.as_deref()
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    resource: String,
    fields: Vec<FieldDescriptor>,
    counter_field: Option<String>,
}

impl SchemaBuilder {
    /// Adds a required field.
    ///
    /// # Panics
    ///
    /// Panics if the name was already declared (roles must be disjoint).
    #[must_use]
    pub fn required(self, name: &str, tag: TypeTag) -> Self {
        self.push(name, tag, FieldRole::Required, None)
    }

    /// Adds an optional field with its declared default.
    ///
    /// # Panics
    ///
    /// Panics if the name was already declared.
    #[must_use]
    pub fn optional(self, name: &str, tag: TypeTag, default: Value) -> Self {
        self.push(name, tag, FieldRole::Optional, Some(default))
    }

    /// Adds a server-managed field.
    ///
    /// # Panics
    ///
    /// Panics if the name was already declared.
    #[must_use]
    pub fn internal(self, name: &str, tag: TypeTag) -> Self {
        self.push(name, tag, FieldRole::Internal, None)
    }

    /// Designates a previously declared numeric field as the counter
    /// field for signed-delta patches.
    ///
    /// # Panics
    ///
    /// Panics if the field is unknown or not declared as a number.
    #[must_use]
    pub fn counter(mut self, name: &str) -> Self {
        let field = self
            .fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("counter field '{name}' is not declared"));
        assert!(
            field.tag == TypeTag::Number,
            "counter field '{name}' must be a number"
        );
        self.counter_field = Some(name.to_string());
        self
    }

    /// Builds the immutable schema.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            resource: self.resource,
            fields: self.fields,
            counter_field: self.counter_field,
        }
    }

    fn push(mut self, name: &str, tag: TypeTag, role: FieldRole, default: Option<Value>) -> Self {
        assert!(
            !self.fields.iter().any(|f| f.name == name),
            "field '{name}' declared twice in schema '{}'",
            self.resource
        );
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            tag,
            role,
            default,
        });
        self
    }
}
