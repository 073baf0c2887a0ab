//! Descriptor declarations and their resolved metadata.
//!
//! A descriptor type declares, once, the route it calls and where each of
//! its fields goes in the outgoing request. [`MetadataBuilder::build`]
//! validates that declaration into a [`DescriptorMetadata`], which the
//! client caches per type for the rest of the process.

use crate::{naming, Error, Result};
use http::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// A typed request: one API call's parameters plus the declaration of how
/// they map onto an HTTP request.
///
/// # Examples
///
/// ```
/// use restmap::metadata::{Descriptor, DescriptorMetadata, FieldValues, MetadataBuilder, Verb};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Category {
///     id: u32,
///     title: String,
/// }
///
/// struct GetCategory {
///     id: Option<u32>,
/// }
///
/// impl Descriptor for GetCategory {
///     type Response = Category;
///
///     fn declare() -> MetadataBuilder {
///         DescriptorMetadata::builder()
///             .route("/category/{id}")
///             .verb(Verb::Get)
///             .field("Id")
///     }
///
///     fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
///         fields.set("Id", &self.id)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Descriptor: 'static {
    /// The type the response body deserializes into.
    ///
    /// Use [`RawStatus`](crate::RawStatus) to receive only the status code.
    type Response: DeserializeOwned + 'static;

    /// Declares the route, verb and field placements for this type.
    ///
    /// Called at most once per client, the first time the type is used.
    fn declare() -> MetadataBuilder;

    /// Writes this instance's field values, keyed by declared field name.
    fn write_fields(&self, fields: &mut FieldValues) -> Result<()>;
}

/// The HTTP verbs a route may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// Returns the matching [`http::Method`].
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            other => Err(Error::ConfigurationError(format!(
                "Unrecognized verb '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// Where a field's value is written in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Substituted into a `{placeholder}` of the route template.
    Path,
    /// Appended to the query string.
    Query,
    /// Added as one key of the JSON body object.
    BodyField,
    /// Serialized as the whole request body.
    BodyValueOnly,
}

/// The route a descriptor type calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetadata {
    /// Path template, e.g. `/category/{id}`.
    pub template: String,
    pub verb: Verb,
}

/// Placement rules for one descriptor field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// The declared (upper-camel-case) field name.
    pub name: String,
    pub placement: Placement,
    /// Body key override. Used verbatim when present.
    pub alias: Option<String>,
    /// The template placeholder this field fills, for [`Placement::Path`].
    pub placeholder: Option<String>,
}

/// Validated metadata for a descriptor type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMetadata {
    pub route: RouteMetadata,
    /// Fields in declaration order.
    pub fields: Vec<FieldMetadata>,
}

impl DescriptorMetadata {
    /// Starts a declaration.
    pub fn builder() -> MetadataBuilder {
        MetadataBuilder::default()
    }

    /// Returns the metadata for a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
enum VerbDecl {
    Known(Verb),
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyDecl {
    Field,
    ValueOnly,
}

#[derive(Debug, Clone)]
struct FieldDecl {
    name: String,
    body: Option<BodyDecl>,
    alias: Option<String>,
}

/// Declaration of a descriptor type's route and fields.
///
/// Fields not flagged as body fields go to the query string, unless the
/// route template has a placeholder for them. A placeholder binds a field
/// whose declared name, or naming-converted name, equals it: both `{Id}` and
/// `{id}` bind the field `Id`.
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    template: Option<String>,
    verb: Option<VerbDecl>,
    fields: Vec<FieldDecl>,
}

impl MetadataBuilder {
    /// Sets the route template.
    pub fn route(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Sets the HTTP verb.
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verb = Some(VerbDecl::Known(verb));
        self
    }

    /// Sets the HTTP verb by name. Unrecognized names fail in [`build`](Self::build).
    pub fn verb_str(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(VerbDecl::Named(verb.into()));
        self
    }

    /// Declares a path or query field.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.push(name.into(), None, None)
    }

    /// Declares a field written as one key of the JSON body.
    pub fn body_field(self, name: impl Into<String>) -> Self {
        self.push(name.into(), Some(BodyDecl::Field), None)
    }

    /// Declares a body field written under `alias` instead of its converted name.
    pub fn body_field_as(self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.push(name.into(), Some(BodyDecl::Field), Some(alias.into()))
    }

    /// Declares the field whose value is the entire JSON body.
    pub fn body_value(self, name: impl Into<String>) -> Self {
        self.push(name.into(), Some(BodyDecl::ValueOnly), None)
    }

    fn push(mut self, name: String, body: Option<BodyDecl>, alias: Option<String>) -> Self {
        self.fields.push(FieldDecl { name, body, alias });
        self
    }

    /// Validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the route or verb is missing,
    /// the verb is unrecognized, a field is declared twice, or more than one
    /// field is declared as the body value.
    pub fn build(self) -> Result<DescriptorMetadata> {
        let template = self
            .template
            .ok_or_else(|| Error::ConfigurationError("No route declared".to_string()))?;

        let verb = match self.verb {
            Some(VerbDecl::Known(verb)) => verb,
            Some(VerbDecl::Named(name)) => name.parse().map_err(|_| {
                Error::ConfigurationError(format!(
                    "Unrecognized verb '{}' for route {}",
                    name, template
                ))
            })?,
            None => {
                return Err(Error::ConfigurationError(format!(
                    "No verb declared for route {}",
                    template
                )))
            }
        };

        let value_only = self
            .fields
            .iter()
            .filter(|f| f.body == Some(BodyDecl::ValueOnly))
            .count();
        if value_only > 1 {
            return Err(Error::ConfigurationError(format!(
                "Only one body value field may be declared for route {}, found {}",
                template, value_only
            )));
        }

        let placeholders = placeholders(&template);
        let mut fields: Vec<FieldMetadata> = Vec::with_capacity(self.fields.len());

        for decl in self.fields {
            if fields.iter().any(|f| f.name == decl.name) {
                return Err(Error::ConfigurationError(format!(
                    "Field {} declared twice for route {}",
                    decl.name, template
                )));
            }

            let converted = naming::convert(&decl.name);
            let placeholder = placeholders
                .iter()
                .find(|p| **p == decl.name || **p == converted)
                .map(|p| p.to_string());

            let placement = match (&placeholder, decl.body) {
                (Some(_), _) => Placement::Path,
                (None, Some(BodyDecl::Field)) => Placement::BodyField,
                (None, Some(BodyDecl::ValueOnly)) => Placement::BodyValueOnly,
                (None, None) => Placement::Query,
            };

            fields.push(FieldMetadata {
                name: decl.name,
                placement,
                alias: decl.alias,
                placeholder,
            });
        }

        Ok(DescriptorMetadata {
            route: RouteMetadata { template, verb },
            fields,
        })
    }
}

/// Returns the `{name}` placeholders of a route template, in order.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                found.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    found
}

/// Field values of one descriptor instance, keyed by declared name.
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
    values: Vec<(String, Value)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the value of a field.
    ///
    /// `None` serializes to `null`, which every placement treats as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `value` cannot be converted
    /// to JSON.
    pub fn set<V>(&mut self, name: impl Into<String>, value: &V) -> Result<&mut Self>
    where
        V: Serialize + ?Sized,
    {
        let value =
            serde_json::to_value(value).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
        Ok(self)
    }

    /// Returns the recorded value, or `None` if the field was never set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Fails if a value was recorded for a field the metadata doesn't declare.
    pub fn check_declared(&self, metadata: &DescriptorMetadata) -> Result<()> {
        match self
            .values
            .iter()
            .find(|(name, _)| metadata.field(name).is_none())
        {
            Some((name, _)) => Err(Error::ConfigurationError(format!(
                "Value written for undeclared field {} on route {}",
                name, metadata.route.template
            ))),
            None => Ok(()),
        }
    }
}

/// Resolved metadata per descriptor type.
///
/// Entries are inserted once and never mutated. Failed resolutions are not
/// cached, so a broken declaration fails on every use.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<DescriptorMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata for `D`, resolving its declaration on first use.
    pub fn resolve<D: Descriptor>(&self) -> Result<Arc<DescriptorMetadata>> {
        let key = TypeId::of::<D>();
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }

        let metadata = Arc::new(D::declare().build()?);
        tracing::debug!(
            descriptor = std::any::type_name::<D>(),
            route = %metadata.route.template,
            verb = %metadata.route.verb,
            fields = metadata.fields.len(),
            "Resolved descriptor metadata"
        );

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(metadata)))
    }

    /// Returns the number of resolved descriptor types.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("/category/{id}"), vec!["id"]);
        assert_eq!(
            placeholders("/games/{GameId}/clues/{Id}"),
            vec!["GameId", "Id"]
        );
        assert!(placeholders("/random").is_empty());
        assert!(placeholders("/broken/{id").is_empty());
    }

    #[test]
    fn test_placement_inference() {
        let metadata = DescriptorMetadata::builder()
            .route("/games/{GameId}/clues/{id}")
            .verb(Verb::Put)
            .field("GameId")
            .field("Id")
            .field("Offset")
            .body_field("Answer")
            .body_field_as("Question", "prompt")
            .build()
            .unwrap();

        let placements: Vec<_> = metadata.fields.iter().map(|f| f.placement).collect();
        assert_eq!(
            placements,
            vec![
                Placement::Path,
                Placement::Path,
                Placement::Query,
                Placement::BodyField,
                Placement::BodyField,
            ]
        );
        assert_eq!(
            metadata.field("Id").unwrap().placeholder.as_deref(),
            Some("id")
        );
        assert_eq!(
            metadata.field("Question").unwrap().alias.as_deref(),
            Some("prompt")
        );
    }

    #[test]
    fn test_path_wins_over_body_flag() {
        let metadata = DescriptorMetadata::builder()
            .route("/clues/{id}")
            .verb(Verb::Post)
            .body_field("Id")
            .build()
            .unwrap();
        assert_eq!(metadata.fields[0].placement, Placement::Path);
    }

    #[test]
    fn test_missing_route() {
        let result = DescriptorMetadata::builder().verb(Verb::Get).build();
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_missing_or_unknown_verb() {
        let missing = DescriptorMetadata::builder().route("/random").build();
        assert!(matches!(missing, Err(Error::ConfigurationError(_))));

        let unknown = DescriptorMetadata::builder()
            .route("/random")
            .verb_str("PATCH")
            .build();
        assert!(matches!(unknown, Err(Error::ConfigurationError(_))));

        let named = DescriptorMetadata::builder()
            .route("/random")
            .verb_str("delete")
            .build()
            .unwrap();
        assert_eq!(named.route.verb, Verb::Delete);
    }

    #[test]
    fn test_two_body_values_rejected() {
        let result = DescriptorMetadata::builder()
            .route("/clues")
            .verb(Verb::Post)
            .body_value("First")
            .body_value("Second")
            .build();

        match result {
            Err(Error::ConfigurationError(msg)) => assert!(msg.contains("body value")),
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = DescriptorMetadata::builder()
            .route("/clues")
            .verb(Verb::Get)
            .field("Value")
            .body_field("Value")
            .build();
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_field_values() {
        let mut values = FieldValues::new();
        values.set("Count", &Some(5)).unwrap();
        values.set("Offset", &None::<u32>).unwrap();
        values.set("Count", &7).unwrap();

        assert_eq!(values.get("Count"), Some(&serde_json::json!(7)));
        assert_eq!(values.get("Offset"), Some(&Value::Null));
        assert_eq!(values.get("Missing"), None);

        let metadata = DescriptorMetadata::builder()
            .route("/random")
            .verb(Verb::Get)
            .field("Count")
            .build()
            .unwrap();
        assert!(matches!(
            values.check_declared(&metadata),
            Err(Error::ConfigurationError(_))
        ));
    }

    struct GetRandom;

    impl Descriptor for GetRandom {
        type Response = Vec<u32>;

        fn declare() -> MetadataBuilder {
            DescriptorMetadata::builder()
                .route("/random")
                .verb(Verb::Get)
                .field("Count")
        }

        fn write_fields(&self, _fields: &mut FieldValues) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cache_resolves_once() {
        let cache = MetadataCache::new();
        assert!(cache.is_empty());

        let first = cache.resolve::<GetRandom>().unwrap();
        let second = cache.resolve::<GetRandom>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
