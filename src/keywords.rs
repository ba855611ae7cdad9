//! Keyword Compilation Pipeline
//!
//! Visits a schema's keywords in a fixed order, accumulating a
//! `ClassContext`, then registers the resulting `Representation`. Order
//! matters: `Properties` needs the class type set by `Type`, and `Required`
//! promotes parameters added by the earlier passes.
//!
//! A keyword that fails does not abort the pipeline: the failure is logged
//! and the remaining keywords still run, so an otherwise valid schema with
//! one exotic keyword still compiles everything else.

use serde_json::Value;

use crate::arena::Handle;
use crate::error::Result;
use crate::ir::{ClassContext, CompilationContext, DataMember, Parameter};
use crate::names::capitalize;
use crate::registry::SchemaRegistry;
use crate::schema::Schema;

/// One JSON Schema keyword's compilation rule.
trait Keyword {
    fn key(&self) -> &'static str;

    /// Apply the keyword's data to the class context.
    ///
    /// Only called when the key is present in the schema definition. An
    /// error message reports the failure; it never aborts the pipeline.
    fn compile(
        &self,
        schema: &Schema,
        registry: &SchemaRegistry,
        data: &Value,
        context: &mut ClassContext,
    ) -> std::result::Result<(), String>;
}

// =============================================================================
// Type
// =============================================================================

/// `type`: records the class type and, for scalars and arrays, the single
/// `value` member.
struct TypeKeyword;

impl Keyword for TypeKeyword {
    fn key(&self) -> &'static str {
        "type"
    }

    fn compile(
        &self,
        schema: &Schema,
        _registry: &SchemaRegistry,
        data: &Value,
        context: &mut ClassContext,
    ) -> std::result::Result<(), String> {
        let Some(class_type) = data.as_str() else {
            return Err("'type' must be a string".to_string());
        };
        context.class_type = Some(class_type.to_string());

        // Objects get their members from `properties`; null has none.
        if class_type == "object" || class_type == "null" {
            return Ok(());
        }

        let is_array = class_type == "array";
        let element_type = if is_array {
            schema
                .definition()
                .get("items")
                .filter(|items| items.is_object())
                .and_then(|items| items.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| "invalid array type".to_string())?
        } else {
            class_type
        };

        let class_name = capitalize(element_type);

        // Arrays extend the generic wrapper; the element class rides on the
        // parameter for the parser's benefit.
        if is_array {
            context.base_classes.push("Array".to_string());
        } else {
            context.base_classes.push(class_name.clone());
        }

        let member = if is_array {
            DataMember::array("value", &class_name)
        } else {
            DataMember::new("value", &class_name)
        };
        let parameter = Parameter::new("value", &class_name, &member);
        context.add_data_member(member);
        context.add_constructor_parameter(parameter);
        Ok(())
    }
}

// =============================================================================
// Properties
// =============================================================================

/// `properties`: one data member and constructor parameter per property.
struct PropertiesKeyword;

impl Keyword for PropertiesKeyword {
    fn key(&self) -> &'static str {
        "properties"
    }

    fn compile(
        &self,
        schema: &Schema,
        registry: &SchemaRegistry,
        data: &Value,
        context: &mut ClassContext,
    ) -> std::result::Result<(), String> {
        match context.class_type.as_deref() {
            None => {
                return Err(
                    "schemas defining properties must be of type 'object'; no type found"
                        .to_string(),
                )
            }
            Some("object") => {}
            Some(other) => {
                return Err(format!(
                    "schemas defining properties must be of type 'object'; found type '{other}'"
                ))
            }
        }

        let Some(properties) = data.as_object() else {
            return Err("'properties' must be an object".to_string());
        };

        for (property_name, property) in properties {
            let class_name = if let Some(reference) =
                property.get("$ref").and_then(Value::as_str)
            {
                let dependency_url = schema.resolve_dependency_url(reference);
                let dependency = registry.get_schema(&dependency_url).ok_or_else(|| {
                    format!("no schema registered for reference {dependency_url}")
                })?;
                debug_assert!(dependency.compiled());
                dependency.class_name().to_string()
            } else if property.get("type").is_some() || property.get("allOf").is_some() {
                schema
                    .property_map()
                    .get(property_name)
                    .cloned()
                    .ok_or_else(|| {
                        format!("property '{property_name}' is missing from the property map")
                    })?
            } else {
                continue;
            };

            let member = DataMember::new(property_name, &class_name);
            let parameter = Parameter::new(property_name, &class_name, &member);
            context.add_data_member(member);
            context.add_constructor_parameter(parameter);
        }
        Ok(())
    }
}

// =============================================================================
// AllOf
// =============================================================================

/// `allOf`: pass-through. The combined class was already synthesized during
/// dependency population; the keyword only records presence.
struct AllOfKeyword;

impl Keyword for AllOfKeyword {
    fn key(&self) -> &'static str {
        "allOf"
    }

    fn compile(
        &self,
        _schema: &Schema,
        _registry: &SchemaRegistry,
        _data: &Value,
        _context: &mut ClassContext,
    ) -> std::result::Result<(), String> {
        Ok(())
    }
}

// =============================================================================
// Required
// =============================================================================

/// `required`: promotes the named constructor parameters to required.
///
/// Names that match no declared parameter are ignored.
struct RequiredKeyword;

impl Keyword for RequiredKeyword {
    fn key(&self) -> &'static str {
        "required"
    }

    fn compile(
        &self,
        _schema: &Schema,
        _registry: &SchemaRegistry,
        data: &Value,
        context: &mut ClassContext,
    ) -> std::result::Result<(), String> {
        let Some(names) = data.as_array() else {
            return Err("'required' must be an array of property names".to_string());
        };
        let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();

        for parameter in context.constructor_parameters_mut() {
            if names.contains(&parameter.name.as_str()) {
                parameter.required = true;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Runs the keyword handlers against one schema and registers the result.
#[derive(Default)]
pub struct KeywordCompiler;

impl KeywordCompiler {
    pub fn new() -> Self {
        Self
    }

    fn keywords() -> [&'static dyn Keyword; 4] {
        [&TypeKeyword, &PropertiesKeyword, &AllOfKeyword, &RequiredKeyword]
    }

    /// Compile one schema's keywords into a `Representation` and register it
    /// under the schema's class name.
    pub fn compile(
        &self,
        registry: &SchemaRegistry,
        handle: Handle,
        compilation_context: &mut CompilationContext,
    ) -> Result<()> {
        let schema = registry.get_schema_by_handle(handle)?;
        let mut context = ClassContext::new(schema.class_name());

        for keyword in Self::keywords() {
            let Some(data) = schema.definition().get(keyword.key()) else {
                continue;
            };
            if let Err(message) = keyword.compile(schema, registry, data, &mut context) {
                tracing::warn!(
                    class_name = schema.class_name(),
                    keyword = keyword.key(),
                    message,
                    "keyword failed to compile; skipping"
                );
            }
        }

        let class_name = context.class_name().to_string();
        compilation_context.register_representation(class_name, context.into_representation());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Representation;
    use serde_json::json;

    fn compile(definition: Value) -> CompilationContext {
        let mut registry = SchemaRegistry::new();
        registry
            .create_schema("schemas/test/test.json", "Test", definition)
            .unwrap();
        registry.compile_url("schemas/test/test.json").unwrap()
    }

    fn scalar_representation(base: &str) -> Representation {
        let member = DataMember::new("value", base);
        let parameter = Parameter::new("value", base, &member);
        Representation {
            class_name: "Test".into(),
            base_classes: vec![base.into()],
            parameters: vec![parameter],
            data_members: vec![member],
        }
    }

    #[test]
    fn root_type_boolean() {
        let context = compile(json!({"type": "boolean"}));
        assert_eq!(
            context.get_representation("Test").unwrap(),
            &scalar_representation("Boolean")
        );
    }

    #[test]
    fn root_type_integer() {
        let context = compile(json!({"type": "integer"}));
        assert_eq!(
            context.get_representation("Test").unwrap(),
            &scalar_representation("Integer")
        );
    }

    #[test]
    fn root_type_number() {
        let context = compile(json!({"type": "number"}));
        assert_eq!(
            context.get_representation("Test").unwrap(),
            &scalar_representation("Number")
        );
    }

    #[test]
    fn root_type_string() {
        let context = compile(json!({"type": "string"}));
        assert_eq!(
            context.get_representation("Test").unwrap(),
            &scalar_representation("String")
        );
    }

    #[test]
    fn root_type_null_contributes_nothing() {
        let context = compile(json!({"type": "null"}));
        let representation = context.get_representation("Test").unwrap();
        assert!(representation.base_classes.is_empty());
        assert!(representation.parameters.is_empty());
        assert!(representation.data_members.is_empty());
    }

    #[test]
    fn root_type_object_contributes_nothing() {
        let context = compile(json!({"type": "object"}));
        let representation = context.get_representation("Test").unwrap();
        assert!(representation.base_classes.is_empty());
        assert!(representation.parameters.is_empty());
    }

    #[test]
    fn root_type_array_wraps_element_class() {
        let context = compile(json!({"type": "array", "items": {"type": "integer"}}));
        let representation = context.get_representation("Test").unwrap();
        assert_eq!(representation.base_classes, vec!["Array"]);
        assert_eq!(representation.parameters.len(), 1);
        let parameter = &representation.parameters[0];
        assert_eq!(parameter.name, "value");
        assert_eq!(parameter.class_name, "Integer");
        assert!(parameter.is_array);
        assert!(representation.data_members[0].is_array);
    }

    #[test]
    fn array_without_items_object_skips_type_keyword() {
        let context = compile(json!({"type": "array", "items": ["bad"]}));
        let representation = context.get_representation("Test").unwrap();
        // The keyword failed and was skipped; nothing was contributed.
        assert!(representation.parameters.is_empty());
    }

    #[test]
    fn properties_create_a_representation_per_property() {
        let mut registry = SchemaRegistry::new();
        registry
            .create_schema(
                "schemas/v1/person.json",
                "Person",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "age": {"type": "string"},
                        "gender": {"type": "string"}
                    }
                }),
            )
            .unwrap();
        let context = registry.compile_url("schemas/v1/person.json").unwrap();

        assert_eq!(context.len(), 4);
        assert!(context.get_representation("Person").is_some());
        assert!(context.get_representation("NameClass").is_some());
        assert!(context.get_representation("AgeClass").is_some());
        assert!(context.get_representation("GenderClass").is_some());

        let person = context.get_representation("Person").unwrap();
        assert_eq!(person.parameters.len(), 3);
        assert_eq!(person.data_members.len(), 3);
        let names: Vec<&str> = person.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "gender"]);
    }

    #[test]
    fn ref_property_uses_target_class_name() {
        let mut registry = SchemaRegistry::new();
        registry
            .create_schema(
                "schemas/test/person.json",
                "Person",
                json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                }),
            )
            .unwrap();
        registry
            .create_schema(
                "schemas/test/book.json",
                "Book",
                json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "author": {"$ref": "./person.json"}
                    }
                }),
            )
            .unwrap();
        let context = registry.compile_url("schemas/test/book.json").unwrap();

        let book = context.get_representation("Book").unwrap();
        let author = book.parameters.iter().find(|p| p.name == "author").unwrap();
        assert_eq!(author.class_name, "Person");
        assert_eq!(author.data_member, "author");
    }

    #[test]
    fn properties_without_object_type_are_skipped() {
        let context = compile(json!({
            "type": "string",
            "properties": {"name": {"type": "string"}}
        }));
        let representation = context.get_representation("Test").unwrap();
        // Type contributed the scalar value; Properties was skipped.
        assert_eq!(representation.parameters.len(), 1);
        assert_eq!(representation.parameters[0].name, "value");
    }

    #[test]
    fn required_promotes_matching_parameters() {
        let context = compile(json!({
            "type": "object",
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "string"}
            },
            "required": ["a"]
        }));
        let representation = context.get_representation("Test").unwrap();
        let a = representation.parameters.iter().find(|p| p.name == "a").unwrap();
        let b = representation.parameters.iter().find(|p| p.name == "b").unwrap();
        assert!(a.required);
        assert!(!b.required);
    }

    #[test]
    fn required_ignores_unknown_names() {
        let context = compile(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a", "phantom"]
        }));
        let representation = context.get_representation("Test").unwrap();
        assert_eq!(representation.parameters.len(), 1);
        assert!(representation.parameters[0].required);
    }

    #[test]
    fn unsupported_keywords_are_ignored() {
        let context = compile(json!({"type": "string", "maxLength": 12}));
        assert_eq!(
            context.get_representation("Test").unwrap(),
            &scalar_representation("String")
        );
    }
}
