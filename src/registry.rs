//! Schema Registry
//!
//! Owns every `Schema`, the handle arena that identifies them, and the
//! dependency graph that orders them. Creation deduplicates by URL; the
//! compile driver resolves each schema's dependency order and feeds the
//! keyword pipeline dependencies-first.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::arena::{Handle, HandleArena};
use crate::error::{CompileError, Result};
use crate::graph::DependencyGraph;
use crate::ir::CompilationContext;
use crate::keywords::KeywordCompiler;
use crate::names::capitalize;
use crate::schema::Schema;

/// Owns all schemas for one compilation, keyed by URL.
///
/// Nothing is ever removed: a schema's lifetime is the registry's lifetime,
/// and arena indices stay dense, so schema storage is a plain vector indexed
/// by handle slot.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    arena: HandleArena,
    graph: DependencyGraph,
    schemas: Vec<Schema>,
    by_url: HashMap<String, Handle>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Create and register a schema, or return the existing one for `url`.
    ///
    /// Idempotence by URL is what lets several schemas share a reference to
    /// the same document without duplicating it.
    pub fn create_schema(
        &mut self,
        url: &str,
        class_name: &str,
        definition: Value,
    ) -> Result<Handle> {
        if let Some(&handle) = self.by_url.get(url) {
            return Ok(handle);
        }

        let handle = self.arena.issue();
        self.graph.add_node(handle, url);
        debug_assert_eq!(handle.index() as usize, self.schemas.len());
        self.schemas
            .push(Schema::new(handle, url, class_name, definition));
        self.by_url.insert(url.to_string(), handle);
        tracing::debug!(url, class_name, %handle, "registered schema");
        Ok(handle)
    }

    /// Look up a schema's handle by URL.
    pub fn get_handle(&self, url: &str) -> Option<Handle> {
        self.by_url.get(url).copied()
    }

    /// Look up a schema by URL.
    pub fn get_schema(&self, url: &str) -> Option<&Schema> {
        self.by_url
            .get(url)
            .map(|handle| &self.schemas[handle.index() as usize])
    }

    /// Look up a schema by handle, validating the handle first.
    pub fn get_schema_by_handle(&self, handle: Handle) -> Result<&Schema> {
        self.arena.validate(handle)?;
        Ok(&self.schemas[handle.index() as usize])
    }

    fn schema_mut(&mut self, handle: Handle) -> &mut Schema {
        &mut self.schemas[handle.index() as usize]
    }

    /// Compile the schema at `url` into a fresh compilation context.
    pub fn compile_url(&mut self, url: &str) -> Result<CompilationContext> {
        let handle = self
            .get_handle(url)
            .ok_or_else(|| CompileError::UnresolvedReference {
                url: url.to_string(),
            })?;
        let mut context = CompilationContext::new();
        self.compile(handle, &mut context)?;
        Ok(context)
    }

    /// Compile a schema and everything it depends on, dependencies first.
    ///
    /// Each schema compiles at most once per registry; re-entry through a
    /// shared dependency is a no-op. Arena and graph errors are fatal and
    /// propagate; individual keyword failures are logged by the pipeline
    /// and recovered.
    pub fn compile(&mut self, handle: Handle, context: &mut CompilationContext) -> Result<()> {
        self.arena.validate(handle)?;
        if self.schemas[handle.index() as usize].compiled {
            return Ok(());
        }

        self.expand_definitions(handle)?;
        self.populate_dependencies(handle)?;

        let order = self.graph.resolve_order(handle)?;
        for &dependency in &order[..order.len() - 1] {
            self.compile(dependency, context)?;
        }

        KeywordCompiler::new().compile(self, handle, context)?;
        self.schema_mut(handle).compiled = true;
        Ok(())
    }

    /// Expand the `definitions` block into registered schemas.
    ///
    /// Runs before dependency population so later `$ref
    /// "#/definitions/<name>"` targets exist even when the definition is
    /// declared after its first use.
    fn expand_definitions(&mut self, handle: Handle) -> Result<()> {
        let schema = &self.schemas[handle.index() as usize];
        let Some(definitions) = schema.definitions() else {
            return Ok(());
        };

        let base_url = schema.url().to_string();
        let definitions: Vec<(String, Value)> = definitions
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for (name, definition) in definitions {
            let url = format!("{base_url}#/definitions/{name}");
            self.create_schema(&url, &capitalize(&name), definition)?;
        }
        Ok(())
    }

    /// Populate the schema's dependency node from its relationship keyword.
    ///
    /// Invoked once, lazily, the first time the schema's dependencies are
    /// needed. Every added edge is eagerly cycle-checked by the graph.
    fn populate_dependencies(&mut self, handle: Handle) -> Result<()> {
        if self.schemas[handle.index() as usize].populated {
            return Ok(());
        }

        let schema = &self.schemas[handle.index() as usize];
        let keyword = schema.relationship_keyword()?;

        match keyword {
            Some("properties") => self.populate_from_properties(handle)?,
            Some("$ref") => self.populate_from_ref(handle)?,
            Some("allOf") => self.populate_from_all_of(handle)?,
            // anyOf/oneOf join the exclusivity check but add no edges.
            Some(_) | None => {}
        }

        self.schema_mut(handle).populated = true;
        Ok(())
    }

    fn populate_from_properties(&mut self, handle: Handle) -> Result<()> {
        let schema = &self.schemas[handle.index() as usize];
        let base_url = schema.url().to_string();
        let properties: Vec<(String, Value)> = schema
            .properties()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for (property_name, property) in properties {
            let (dependency, class_name) = if let Some(reference) =
                property.get("$ref").and_then(Value::as_str)
            {
                let dependency_url = self.schemas[handle.index() as usize]
                    .resolve_dependency_url(reference);
                let dependency = self.get_handle(&dependency_url).ok_or_else(|| {
                    CompileError::UnresolvedReference {
                        url: dependency_url.clone(),
                    }
                })?;
                let class_name = self.schemas[dependency.index() as usize]
                    .class_name()
                    .to_string();
                (dependency, class_name)
            } else {
                // Anonymous schema for the inline property definition.
                let class_name = format!("{}Class", capitalize(&property_name));
                let url = format!("{base_url}#/properties/{class_name}");
                let dependency = self.create_schema(&url, &class_name, property.clone())?;
                (dependency, class_name)
            };

            self.graph.add_edge(handle, dependency)?;

            // The "properties" object is the only place that names class
            // members, so record property -> class name here for the keyword
            // pipeline. A property that declares allOf maps to the combined
            // "<class>_allOf" class rather than the bare wrapper, since the
            // combined class is what should be exposed.
            let mapped = if property.get("allOf").is_some() {
                format!("{class_name}_allOf")
            } else {
                class_name
            };
            self.schema_mut(handle)
                .property_map_mut()
                .insert(property_name, mapped);
        }
        Ok(())
    }

    fn populate_from_ref(&mut self, handle: Handle) -> Result<()> {
        let schema = &self.schemas[handle.index() as usize];
        let reference = schema
            .definition()
            .get("$ref")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let dependency_url = schema.resolve_dependency_url(&reference);

        let dependency =
            self.get_handle(&dependency_url)
                .ok_or_else(|| CompileError::UnresolvedReference {
                    url: dependency_url.clone(),
                })?;
        self.graph.add_edge(handle, dependency)?;
        Ok(())
    }

    fn populate_from_all_of(&mut self, handle: Handle) -> Result<()> {
        let schema = &self.schemas[handle.index() as usize];
        let class_name = schema.class_name().to_string();
        let base_url = schema.url().to_string();
        let members: Vec<Value> = schema
            .definition()
            .get("allOf")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // Union of every member's properties, in member order.
        let mut combined_properties = Map::new();
        for member in members {
            if let Some(reference) = member.get("$ref").and_then(Value::as_str) {
                let dependency_url = self.schemas[handle.index() as usize]
                    .resolve_dependency_url(reference);
                let dependency = self.get_handle(&dependency_url).ok_or_else(|| {
                    CompileError::UnresolvedReference {
                        url: dependency_url.clone(),
                    }
                })?;
                if let Some(properties) = self.schemas[dependency.index() as usize].properties() {
                    combined_properties.extend(
                        properties
                            .iter()
                            .map(|(name, value)| (name.clone(), value.clone())),
                    );
                }
            } else if let Some(properties) = member.get("properties").and_then(Value::as_object) {
                combined_properties
                    .extend(properties.iter().map(|(name, value)| (name.clone(), value.clone())));
            } else {
                return Err(CompileError::MalformedAllOf {
                    class_name: class_name.clone(),
                });
            }
        }

        let combined = Value::Object(Map::from_iter([
            ("type".to_string(), Value::String("object".to_string())),
            ("properties".to_string(), Value::Object(combined_properties)),
        ]));

        // Registered under a fragment of the owner's URL: the registry is
        // URL-unique, so the combined schema needs its own key while the
        // exposed class name stays "<class>_allOf".
        let combined_name = format!("{class_name}_allOf");
        let combined_url = format!("{base_url}#/allOf");
        let dependency = self.create_schema(&combined_url, &combined_name, combined)?;
        self.graph.add_edge(handle, dependency)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use serde_json::json;

    #[test]
    fn create_schema_deduplicates_by_url() {
        let mut registry = SchemaRegistry::new();
        let first = registry
            .create_schema("schemas/a.json", "A", json!({"type": "string"}))
            .unwrap();
        let second = registry
            .create_schema("schemas/a.json", "Other", json!({"type": "integer"}))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.schema_count(), 1);
        assert_eq!(registry.get_schema("schemas/a.json").unwrap().class_name(), "A");
    }

    #[test]
    fn get_schema_by_handle_validates() {
        let mut registry = SchemaRegistry::new();
        let handle = registry
            .create_schema("schemas/a.json", "A", json!({"type": "string"}))
            .unwrap();
        assert_eq!(registry.get_schema_by_handle(handle).unwrap().url(), "schemas/a.json");
        assert!(registry.get_schema_by_handle(Handle::INVALID).is_err());
    }

    #[test]
    fn properties_register_anonymous_schemas_and_map_names() {
        let mut registry = SchemaRegistry::new();
        let handle = registry
            .create_schema(
                "schemas/v1/person.json",
                "Person",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "age": {"type": "integer"}
                    }
                }),
            )
            .unwrap();
        registry.populate_dependencies(handle).unwrap();

        let person = registry.get_schema("schemas/v1/person.json").unwrap();
        assert_eq!(person.property_map().get("name").unwrap(), "NameClass");
        assert_eq!(person.property_map().get("age").unwrap(), "AgeClass");
        assert!(registry
            .get_schema("schemas/v1/person.json#/properties/NameClass")
            .is_some());
    }

    #[test]
    fn ref_property_requires_registered_target() {
        let mut registry = SchemaRegistry::new();
        let handle = registry
            .create_schema(
                "schemas/book.json",
                "Book",
                json!({
                    "type": "object",
                    "properties": {
                        "author": {"$ref": "./person.json"}
                    }
                }),
            )
            .unwrap();
        let err = registry.populate_dependencies(handle).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedReference { url } if url == "schemas/person.json"));
    }

    #[test]
    fn mutual_reference_is_a_circular_dependency() {
        let mut registry = SchemaRegistry::new();
        let a = registry
            .create_schema("schemas/a.json", "A", json!({"$ref": "./b.json"}))
            .unwrap();
        let b = registry
            .create_schema("schemas/b.json", "B", json!({"$ref": "./a.json"}))
            .unwrap();

        registry.populate_dependencies(a).unwrap();
        let err = registry.populate_dependencies(b).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Graph(GraphError::CircularDependency { .. })
        ));
    }

    #[test]
    fn self_reference_is_a_circular_dependency() {
        let mut registry = SchemaRegistry::new();
        let handle = registry
            .create_schema("schemas/a.json", "A", json!({"$ref": "./a.json"}))
            .unwrap();
        let err = registry.populate_dependencies(handle).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Graph(GraphError::CircularDependency { .. })
        ));
    }

    #[test]
    fn all_of_synthesizes_combined_schema() {
        let mut registry = SchemaRegistry::new();
        registry
            .create_schema(
                "schemas/named.json",
                "Named",
                json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                }),
            )
            .unwrap();
        let handle = registry
            .create_schema(
                "schemas/pet.json",
                "Pet",
                json!({
                    "allOf": [
                        {"$ref": "./named.json"},
                        {"properties": {"species": {"type": "string"}}}
                    ]
                }),
            )
            .unwrap();
        registry.populate_dependencies(handle).unwrap();

        let combined = registry.get_schema("schemas/pet.json#/allOf").unwrap();
        assert_eq!(combined.class_name(), "Pet_allOf");
        let properties = combined.properties().unwrap();
        let names: Vec<&String> = properties.keys().collect();
        assert_eq!(names, vec!["name", "species"]);
    }

    #[test]
    fn definitions_expand_before_population() {
        let mut registry = SchemaRegistry::new();
        let handle = registry
            .create_schema(
                "schemas/person.json",
                "Person",
                json!({
                    "definitions": {
                        "address": {
                            "type": "object",
                            "properties": {"city": {"type": "string"}}
                        }
                    },
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "address": {"$ref": "#/definitions/address"}
                    }
                }),
            )
            .unwrap();
        registry.expand_definitions(handle).unwrap();
        registry.populate_dependencies(handle).unwrap();

        let address = registry
            .get_schema("schemas/person.json#/definitions/address")
            .unwrap();
        assert_eq!(address.class_name(), "Address");

        let person = registry.get_schema("schemas/person.json").unwrap();
        assert_eq!(person.property_map().get("address").unwrap(), "Address");
    }
}
