//! Schema object model
//!
//! One `Schema` per JSON Schema document or fragment, identified by URL.
//! Schemas are created by the registry, which also owns their dependency
//! nodes; this module holds the per-schema data and shape helpers.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::arena::Handle;
use crate::error::CompileError;
use crate::loader::resolve_reference;

/// Top-level keywords that relate a schema to other schemas.
///
/// At most one may appear per schema; `anyOf`/`oneOf` take part in the
/// exclusivity check but contribute no dependency edges.
pub const RELATIONSHIP_KEYWORDS: [&str; 5] = ["properties", "$ref", "allOf", "anyOf", "oneOf"];

/// Mapping of property names to compiled class names, in declaration order.
pub type PropertyMap = IndexMap<String, String>;

/// One compiled unit corresponding to a JSON Schema document or fragment.
#[derive(Debug)]
pub struct Schema {
    handle: Handle,
    /// The URL used to identify this schema via `$ref`. URLs are inherently
    /// unique, so they double as the registry key.
    url: String,
    class_name: String,
    definition: Value,
    property_map: PropertyMap,
    pub(crate) populated: bool,
    pub(crate) compiled: bool,
}

impl Schema {
    pub(crate) fn new(
        handle: Handle,
        url: impl Into<String>,
        class_name: impl Into<String>,
        definition: Value,
    ) -> Self {
        Self {
            handle,
            url: url.into(),
            class_name: class_name.into(),
            definition,
            property_map: PropertyMap::new(),
            populated: false,
            compiled: false,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The raw key/value definition this schema was created from.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    /// Property name -> class name map, filled in during dependency
    /// population and read back by the keyword pipeline.
    pub fn property_map(&self) -> &PropertyMap {
        &self.property_map
    }

    pub(crate) fn property_map_mut(&mut self) -> &mut PropertyMap {
        &mut self.property_map
    }

    pub fn compiled(&self) -> bool {
        self.compiled
    }

    /// The `definitions` block, if any.
    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        self.definition.get("definitions").and_then(Value::as_object)
    }

    /// The `properties` block, if any.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.definition.get("properties").and_then(Value::as_object)
    }

    /// Determine which relationship keyword this schema uses, if any.
    ///
    /// More than one present is a fatal schema-shape error.
    pub fn relationship_keyword(&self) -> Result<Option<&'static str>, CompileError> {
        let present: Vec<&'static str> = RELATIONSHIP_KEYWORDS
            .iter()
            .copied()
            .filter(|k| self.definition.get(*k).is_some())
            .collect();

        match present.as_slice() {
            [] => Ok(None),
            [keyword] => Ok(Some(*keyword)),
            _ => Err(CompileError::ConflictingKeywords {
                class_name: self.class_name.clone(),
                keywords: present.iter().map(|k| k.to_string()).collect(),
            }),
        }
    }

    /// Resolve a `$ref` target against this schema's own URL.
    pub fn resolve_dependency_url(&self, reference: &str) -> String {
        resolve_reference(&self.url, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::HandleArena;
    use serde_json::json;

    fn schema(definition: Value) -> Schema {
        let mut arena = HandleArena::new();
        Schema::new(arena.issue(), "schemas/test/test.json", "Test", definition)
    }

    #[test]
    fn detects_single_relationship_keyword() {
        let s = schema(json!({"type": "object", "properties": {}}));
        assert_eq!(s.relationship_keyword().unwrap(), Some("properties"));

        let s = schema(json!({"$ref": "./other.json"}));
        assert_eq!(s.relationship_keyword().unwrap(), Some("$ref"));

        let s = schema(json!({"type": "integer"}));
        assert_eq!(s.relationship_keyword().unwrap(), None);
    }

    #[test]
    fn conflicting_keywords_are_fatal() {
        let s = schema(json!({"$ref": "./other.json", "allOf": []}));
        assert!(matches!(
            s.relationship_keyword(),
            Err(CompileError::ConflictingKeywords { .. })
        ));
    }

    #[test]
    fn resolves_relative_reference_against_own_url() {
        let s = schema(json!({}));
        assert_eq!(
            s.resolve_dependency_url("./person.json"),
            "schemas/test/person.json"
        );
        assert_eq!(
            s.resolve_dependency_url("#/definitions/address"),
            "schemas/test/test.json#/definitions/address"
        );
        assert_eq!(
            s.resolve_dependency_url("https://example.com/s.json"),
            "https://example.com/s.json"
        );
    }
}
