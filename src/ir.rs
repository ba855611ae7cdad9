//! Intermediate Representation
//!
//! The compiled description of one target type: data members, constructor
//! parameters, base classes. Representations are pure data; the model
//! interpreter and external emitters both consume them without touching the
//! raw schemas again.

use indexmap::IndexMap;
use serde::Serialize;

// =============================================================================
// Data Member
// =============================================================================

/// A stored field of a compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataMember {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "array")]
    pub is_array: bool,
}

impl DataMember {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            is_array: true,
            ..Self::new(name, class_name)
        }
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// A constructor argument of a compiled class.
///
/// `data_member` names the member the argument is stored in. `required`
/// defaults to false and is only ever promoted to true (by the `required`
/// keyword), never demoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(rename = "dataMember")]
    pub data_member: String,
    #[serde(skip)]
    pub required: bool,
    #[serde(skip)]
    pub is_array: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>, data_member: &DataMember) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            data_member: data_member.name.clone(),
            required: false,
            is_array: data_member.is_array,
        }
    }
}

// =============================================================================
// Class Context
// =============================================================================

/// Transient accumulator used while compiling one schema's keywords.
#[derive(Debug, Default)]
pub struct ClassContext {
    class_name: String,
    /// The class meta type as declared by the schema's `type` keyword.
    pub class_type: Option<String>,
    pub base_classes: Vec<String>,
    constructor_parameters: Vec<Parameter>,
    data_members: Vec<DataMember>,
}

impl ClassContext {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn constructor_parameters(&self) -> &[Parameter] {
        &self.constructor_parameters
    }

    pub fn constructor_parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.constructor_parameters
    }

    pub fn data_members(&self) -> &[DataMember] {
        &self.data_members
    }

    pub fn add_constructor_parameter(&mut self, parameter: Parameter) {
        self.constructor_parameters.push(parameter);
    }

    pub fn add_data_member(&mut self, member: DataMember) {
        self.data_members.push(member);
    }

    /// Freeze the accumulated context into an immutable representation.
    pub fn into_representation(self) -> Representation {
        Representation {
            class_name: self.class_name,
            base_classes: self.base_classes,
            parameters: self.constructor_parameters,
            data_members: self.data_members,
        }
    }
}

// =============================================================================
// Representation
// =============================================================================

/// Immutable compiled output for one schema.
///
/// Parameters and data members are index-aligned with declaration order in
/// the source schema. Serializes to the emitter wire shape:
/// `{className, baseClasses, parameters, dataMembers}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Representation {
    pub class_name: String,
    pub base_classes: Vec<String>,
    pub parameters: Vec<Parameter>,
    pub data_members: Vec<DataMember>,
}

// =============================================================================
// Compilation Context
// =============================================================================

/// Registry of all representations produced in one compilation pass.
///
/// Insertion-ordered, so emitters see dependencies before dependents.
/// Registering a class name twice overwrites; the dependency-ordered compile
/// loop already deduplicates schemas, so a second registration is a caller
/// choice, not an error.
#[derive(Debug, Default)]
pub struct CompilationContext {
    representations: IndexMap<String, Representation>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_representation(&mut self, name: impl Into<String>, representation: Representation) {
        self.representations.insert(name.into(), representation);
    }

    pub fn get_representation(&self, name: &str) -> Option<&Representation> {
        self.representations.get(name)
    }

    pub fn representations(&self) -> impl Iterator<Item = &Representation> {
        self.representations.values()
    }

    pub fn len(&self) -> usize {
        self.representations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Representation {
        let member = DataMember::new("value", "Integer");
        let parameter = Parameter::new("value", "Integer", &member);
        Representation {
            class_name: "Test".into(),
            base_classes: vec!["Integer".into()],
            parameters: vec![parameter],
            data_members: vec![member],
        }
    }

    #[test]
    fn representation_equality_is_structural() {
        assert_eq!(sample(), sample());

        let mut other = sample();
        other.parameters[0].name = "count".into();
        assert_ne!(sample(), other);
    }

    #[test]
    fn representation_serializes_to_emitter_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "className": "Test",
                "baseClasses": ["Integer"],
                "parameters": [
                    {"name": "value", "class": "Integer", "dataMember": "value"}
                ],
                "dataMembers": [
                    {"name": "value", "class": "Integer", "array": false}
                ],
            })
        );
    }

    #[test]
    fn context_preserves_insertion_order_and_overwrites() {
        let mut context = CompilationContext::new();
        let mut a = sample();
        a.class_name = "A".into();
        let mut b = sample();
        b.class_name = "B".into();

        context.register_representation("A", a.clone());
        context.register_representation("B", b);
        context.register_representation("A", a);

        let names: Vec<&str> = context.representations().map(|r| r.class_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
