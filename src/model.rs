//! Model Synthesis
//!
//! Turns compiled `Representation`s into constructible, validated model
//! types. Rather than generating source, the synthesizer interprets the
//! representations directly: a `ModelSet` holds every compiled class plus
//! the builtin wrapper classes, and constructs validated `ModelValue`s from
//! positional or named arguments.

use indexmap::IndexMap;

use crate::error::ModelError;
use crate::ir::{CompilationContext, Parameter};
use crate::parser;

// =============================================================================
// Model Value
// =============================================================================

/// Runtime value of a synthesized model type.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    Bool(bool),
    Int(i64),
    Number(f64),
    Str(String),
    Null,
    Array(Vec<ModelValue>),
    Instance(Instance),
}

/// A constructed instance of a compiled class.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class_name: String,
    fields: IndexMap<String, ModelValue>,
}

impl Instance {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn field(&self, name: &str) -> Option<&ModelValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &ModelValue)> {
        self.fields.iter()
    }
}

impl ModelValue {
    /// The runtime class of this value.
    pub fn class_name(&self) -> &str {
        match self {
            ModelValue::Bool(_) => "Boolean",
            ModelValue::Int(_) => "Integer",
            ModelValue::Number(_) => "Number",
            ModelValue::Str(_) => "String",
            ModelValue::Null => "Null",
            ModelValue::Array(_) => "Array",
            ModelValue::Instance(instance) => instance.class_name(),
        }
    }

    /// Field access on instances.
    pub fn field(&self, name: &str) -> Option<&ModelValue> {
        match self {
            ModelValue::Instance(instance) => instance.field(name),
            _ => None,
        }
    }

    fn value_field(&self) -> Option<&ModelValue> {
        self.field("value")
    }

    /// Unwrap to a bool, seeing through a wrapping instance's `value` field.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ModelValue::Bool(b) => Some(*b),
            ModelValue::Instance(_) => self.value_field()?.as_bool(),
            _ => None,
        }
    }

    /// Unwrap to an integer, seeing through a wrapping instance.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ModelValue::Int(i) => Some(*i),
            ModelValue::Instance(_) => self.value_field()?.as_i64(),
            _ => None,
        }
    }

    /// Unwrap to a float, seeing through a wrapping instance.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ModelValue::Number(n) => Some(*n),
            ModelValue::Int(i) => Some(*i as f64),
            ModelValue::Instance(_) => self.value_field()?.as_f64(),
            _ => None,
        }
    }

    /// Unwrap to a string, seeing through a wrapping instance.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelValue::Str(s) => Some(s),
            ModelValue::Instance(_) => self.value_field()?.as_str(),
            _ => None,
        }
    }

    /// Unwrap to an element slice, seeing through a wrapping instance.
    pub fn as_slice(&self) -> Option<&[ModelValue]> {
        match self {
            ModelValue::Array(items) => Some(items),
            ModelValue::Instance(_) => self.value_field()?.as_slice(),
            _ => None,
        }
    }
}

// =============================================================================
// Arguments
// =============================================================================

/// Constructor arguments, positional and/or named.
#[derive(Debug, Default)]
pub struct Arguments {
    positional: Vec<ModelValue>,
    named: Vec<(String, ModelValue)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, value: ModelValue) -> Self {
        self.positional.push(value);
        self
    }

    pub fn named(mut self, name: impl Into<String>, value: ModelValue) -> Self {
        self.named.push((name.into(), value));
        self
    }

    fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    fn take(&mut self, index: usize, name: &str) -> Option<ModelValue> {
        if index < self.positional.len() {
            return Some(std::mem::replace(&mut self.positional[index], ModelValue::Null));
        }
        self.named
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| self.named.swap_remove(i).1)
    }
}

// =============================================================================
// Model Type
// =============================================================================

/// Builtin wrapper classes seeded into every model set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Boolean,
    Integer,
    Number,
    String,
    Null,
    Object,
    Array,
}

/// One constructible type: a compiled representation or a builtin wrapper.
#[derive(Debug)]
struct ModelType {
    base_classes: Vec<String>,
    parameters: Vec<Parameter>,
    builtin: Option<Builtin>,
}

impl ModelType {
    fn builtin(kind: Builtin) -> Self {
        Self {
            base_classes: Vec::new(),
            parameters: Vec::new(),
            builtin: Some(kind),
        }
    }
}

// =============================================================================
// Model Set
// =============================================================================

/// Every synthesized type from one compilation, plus the builtins.
#[derive(Debug)]
pub struct ModelSet {
    types: IndexMap<String, ModelType>,
}

const BUILTINS: [(&str, Builtin); 7] = [
    ("Boolean", Builtin::Boolean),
    ("Integer", Builtin::Integer),
    ("Number", Builtin::Number),
    ("String", Builtin::String),
    ("Null", Builtin::Null),
    ("Object", Builtin::Object),
    ("Array", Builtin::Array),
];

impl ModelSet {
    /// Synthesize model types for every representation in the context.
    pub fn from_context(context: &CompilationContext) -> Self {
        let mut types = IndexMap::new();
        for (name, kind) in BUILTINS {
            types.insert(name.to_string(), ModelType::builtin(kind));
        }
        for representation in context.representations() {
            types.insert(
                representation.class_name.clone(),
                ModelType {
                    base_classes: representation.base_classes.clone(),
                    parameters: representation.parameters.clone(),
                    builtin: None,
                },
            );
        }
        Self { types }
    }

    /// The constructor parameters of a class, in declaration order.
    pub fn parameters(&self, class_name: &str) -> Result<&[Parameter], ModelError> {
        self.types
            .get(class_name)
            .map(|ty| ty.parameters.as_slice())
            .ok_or_else(|| ModelError::UnknownClass(class_name.to_string()))
    }

    /// Whether `class_name` is, or descends from, one of the scalar wrapper
    /// classes (Boolean/Integer/Number/String/Null).
    pub fn is_scalar_class(&self, class_name: &str) -> bool {
        const SCALARS: [&str; 5] = ["Boolean", "Integer", "Number", "String", "Null"];
        SCALARS
            .iter()
            .any(|s| class_name == *s || self.descends_from(class_name, s))
    }

    /// Whether `class_name` is, or descends from, the Array wrapper.
    pub fn is_array_class(&self, class_name: &str) -> bool {
        class_name == "Array" || self.descends_from(class_name, "Array")
    }

    /// Parse a raw JSON document into an instance of `class_name`.
    pub fn parse(&self, class_name: &str, raw_json: &str) -> Result<ModelValue, ModelError> {
        parser::parse(self, class_name, raw_json)
    }

    /// Walk the base class chains of `class_name`.
    fn descends_from(&self, class_name: &str, ancestor: &str) -> bool {
        let mut stack: Vec<&str> = vec![class_name];
        while let Some(current) = stack.pop() {
            let Some(ty) = self.types.get(current) else {
                continue;
            };
            for base in &ty.base_classes {
                if base == ancestor {
                    return true;
                }
                stack.push(base);
            }
        }
        false
    }

    fn is_subclass(&self, class_name: &str, ancestor: &str) -> bool {
        class_name == ancestor || self.descends_from(class_name, ancestor)
    }

    /// Construct an instance of `class_name` from the given arguments.
    ///
    /// Arguments bind to the declared parameters in declaration order, by
    /// position or by name. A missing required parameter is an error; a
    /// missing optional parameter receives the class's default.
    pub fn construct(
        &self,
        class_name: &str,
        mut args: Arguments,
    ) -> Result<ModelValue, ModelError> {
        let ty = self
            .types
            .get(class_name)
            .ok_or_else(|| ModelError::UnknownClass(class_name.to_string()))?;

        if let Some(builtin) = ty.builtin {
            return self.construct_builtin(class_name, builtin, args);
        }

        let parameters = &ty.parameters;
        if args.positional.len() > parameters.len() {
            return Err(ModelError::TooManyArguments {
                class_name: class_name.to_string(),
                expected: parameters.len(),
                actual: args.len(),
            });
        }

        let mut fields = IndexMap::new();
        for (index, parameter) in parameters.iter().enumerate() {
            let value = match args.take(index, &parameter.name) {
                Some(value) => value,
                None if parameter.required => {
                    return Err(ModelError::MissingRequiredArgument {
                        class_name: class_name.to_string(),
                        name: parameter.name.clone(),
                    })
                }
                None => self.default_value(parameter)?,
            };
            let validated = self.validate_field(
                &parameter.name,
                &parameter.class_name,
                parameter.is_array,
                value,
            )?;
            fields.insert(parameter.data_member.clone(), validated);
        }

        Ok(ModelValue::Instance(Instance {
            class_name: class_name.to_string(),
            fields,
        }))
    }

    /// The default for a missing optional parameter: empty value for
    /// scalars, empty sequence for arrays, default-constructed instance for
    /// reference classes.
    fn default_value(&self, parameter: &Parameter) -> Result<ModelValue, ModelError> {
        if parameter.is_array {
            return Ok(ModelValue::Array(Vec::new()));
        }
        match parameter.class_name.as_str() {
            "Boolean" => Ok(ModelValue::Bool(false)),
            "Integer" => Ok(ModelValue::Int(0)),
            "Number" => Ok(ModelValue::Number(0.0)),
            "String" => Ok(ModelValue::Str(String::new())),
            "Null" => Ok(ModelValue::Null),
            other => self.construct(other, Arguments::new()),
        }
    }

    /// Validate a value against a field's declared class, coercing strict
    /// sub/supertypes to the declared class.
    ///
    /// Array fields validate each element against the element class.
    fn validate_field(
        &self,
        field: &str,
        declared: &str,
        is_array: bool,
        value: ModelValue,
    ) -> Result<ModelValue, ModelError> {
        if is_array {
            let ModelValue::Array(items) = value else {
                return Err(ModelError::InvalidFieldType {
                    field: field.to_string(),
                    expected: "Array".to_string(),
                    actual: value.class_name().to_string(),
                });
            };
            let validated: Result<Vec<ModelValue>, ModelError> = items
                .into_iter()
                .map(|item| self.validate_field(field, declared, false, item))
                .collect();
            return Ok(ModelValue::Array(validated?));
        }

        let actual = value.class_name().to_string();
        if actual == declared {
            return Ok(value);
        }

        // Booleans are accepted for any Boolean-hierarchy field even though
        // the native bool differs from the declared wrapper class.
        if matches!(value, ModelValue::Bool(_)) && self.is_subclass(declared, "Boolean") {
            return self.coerce(field, declared, value);
        }

        // Integers promote to Number fields; JSON does not keep the
        // distinction for round numbers.
        if matches!(value, ModelValue::Int(_)) && self.is_subclass(declared, "Number") {
            return self.coerce(field, declared, value);
        }

        if self.is_subclass(&actual, declared) || self.is_subclass(declared, &actual) {
            return self.coerce(field, declared, value);
        }

        Err(ModelError::InvalidFieldType {
            field: field.to_string(),
            expected: declared.to_string(),
            actual,
        })
    }

    /// Cast a sub/supertype value to the declared class by constructing the
    /// declared class from it.
    fn coerce(
        &self,
        field: &str,
        declared: &str,
        value: ModelValue,
    ) -> Result<ModelValue, ModelError> {
        let ty = self
            .types
            .get(declared)
            .ok_or_else(|| ModelError::UnknownClass(declared.to_string()))?;

        match ty.builtin {
            Some(builtin) => self.scalar_from(field, declared, builtin, value),
            None => self.construct(declared, Arguments::new().positional(value)),
        }
    }

    fn construct_builtin(
        &self,
        class_name: &str,
        builtin: Builtin,
        mut args: Arguments,
    ) -> Result<ModelValue, ModelError> {
        if args.len() > 1 {
            return Err(ModelError::TooManyArguments {
                class_name: class_name.to_string(),
                expected: 1,
                actual: args.len(),
            });
        }
        let value = args.take(0, "value");

        match (builtin, value) {
            (Builtin::Null, _) => Ok(ModelValue::Null),
            (Builtin::Object, _) => Ok(ModelValue::Instance(Instance {
                class_name: "Object".to_string(),
                fields: IndexMap::new(),
            })),
            (Builtin::Boolean, None) => Ok(ModelValue::Bool(false)),
            (Builtin::Integer, None) => Ok(ModelValue::Int(0)),
            (Builtin::Number, None) => Ok(ModelValue::Number(0.0)),
            (Builtin::String, None) => Ok(ModelValue::Str(String::new())),
            (Builtin::Array, None) => Ok(ModelValue::Array(Vec::new())),
            (_, Some(value)) => self.scalar_from("value", class_name, builtin, value),
        }
    }

    /// Extract a builtin value from `value`, unwrapping instances of
    /// subtypes of the builtin.
    fn scalar_from(
        &self,
        field: &str,
        declared: &str,
        builtin: Builtin,
        value: ModelValue,
    ) -> Result<ModelValue, ModelError> {
        let mismatch = |value: &ModelValue| ModelError::InvalidFieldType {
            field: field.to_string(),
            expected: declared.to_string(),
            actual: value.class_name().to_string(),
        };

        match builtin {
            Builtin::Boolean => match value {
                ModelValue::Bool(_) => Ok(value),
                ModelValue::Instance(_) if self.is_subclass(value.class_name(), "Boolean") => {
                    value.as_bool().map(ModelValue::Bool).ok_or_else(|| mismatch(&value))
                }
                _ => Err(mismatch(&value)),
            },
            Builtin::Integer => match value {
                ModelValue::Int(_) => Ok(value),
                ModelValue::Instance(_) if self.is_subclass(value.class_name(), "Integer") => {
                    value.as_i64().map(ModelValue::Int).ok_or_else(|| mismatch(&value))
                }
                _ => Err(mismatch(&value)),
            },
            Builtin::Number => match value {
                ModelValue::Number(_) => Ok(value),
                ModelValue::Int(i) => Ok(ModelValue::Number(i as f64)),
                ModelValue::Instance(_) if self.is_subclass(value.class_name(), "Number") => {
                    value.as_f64().map(ModelValue::Number).ok_or_else(|| mismatch(&value))
                }
                _ => Err(mismatch(&value)),
            },
            Builtin::String => match value {
                ModelValue::Str(_) => Ok(value),
                ModelValue::Instance(_) if self.is_subclass(value.class_name(), "String") => value
                    .as_str()
                    .map(|s| ModelValue::Str(s.to_string()))
                    .ok_or_else(|| mismatch(&value)),
                _ => Err(mismatch(&value)),
            },
            Builtin::Null => Ok(ModelValue::Null),
            Builtin::Array => match value {
                ModelValue::Array(_) => Ok(value),
                _ => Err(mismatch(&value)),
            },
            Builtin::Object => Err(mismatch(&value)),
        }
    }
}
