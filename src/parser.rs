//! Instance Parsing
//!
//! Decodes raw JSON into validated model values. The parser walks a class's
//! constructor parameters in declaration order, recursing per parameter
//! class; recursion terminates because the dependency graph already rejected
//! every cycle, so no parameter's class can transitively require the
//! enclosing class.

use serde_json::Value;

use crate::error::ModelError;
use crate::model::{Arguments, ModelSet, ModelValue};

/// Parse raw JSON text into an instance of `class_name`.
pub fn parse(model: &ModelSet, class_name: &str, raw_json: &str) -> Result<ModelValue, ModelError> {
    let value: Value = serde_json::from_str(raw_json)?;
    parse_value(model, class_name, &value)
}

/// Parse a decoded JSON value into an instance of `class_name`.
pub fn parse_value(
    model: &ModelSet,
    class_name: &str,
    value: &Value,
) -> Result<ModelValue, ModelError> {
    // Scalar wrapper classes (and their subclasses) build directly from the
    // decoded scalar.
    if model.is_scalar_class(class_name) {
        let scalar = scalar_from_json(value);
        return model.construct(class_name, Arguments::new().positional(scalar));
    }

    // Array wrapper classes take the whole JSON array, parsed per element
    // against the declared element class.
    if model.is_array_class(class_name) {
        let parameters = model.parameters(class_name)?;
        let Some(items) = value.as_array() else {
            return Err(ModelError::InvalidFieldType {
                field: "value".to_string(),
                expected: "Array".to_string(),
                actual: json_type_name(value).to_string(),
            });
        };
        let element_class = parameters
            .first()
            .map(|p| p.class_name.as_str())
            .unwrap_or("Object");
        let elements: Result<Vec<ModelValue>, ModelError> = items
            .iter()
            .map(|item| parse_value(model, element_class, item))
            .collect();
        return model.construct(
            class_name,
            Arguments::new().positional(ModelValue::Array(elements?)),
        );
    }

    let parameters = model.parameters(class_name)?.to_vec();
    if !parameters.is_empty() && !value.is_object() {
        return Err(ModelError::InvalidFieldType {
            field: class_name.to_string(),
            expected: "object".to_string(),
            actual: json_type_name(value).to_string(),
        });
    }
    let mut args = Arguments::new();

    for parameter in &parameters {
        let raw = value.get(&parameter.name);

        let parsed = match raw {
            Some(raw) if parameter.is_array => {
                let Some(items) = raw.as_array() else {
                    return Err(ModelError::InvalidFieldType {
                        field: parameter.name.clone(),
                        expected: "Array".to_string(),
                        actual: json_type_name(raw).to_string(),
                    });
                };
                let elements: Result<Vec<ModelValue>, ModelError> = items
                    .iter()
                    .map(|item| parse_value(model, &parameter.class_name, item))
                    .collect();
                ModelValue::Array(elements?)
            }
            Some(raw) => parse_value(model, &parameter.class_name, raw)?,
            None if parameter.required => {
                return Err(ModelError::MissingRequiredField {
                    class_name: class_name.to_string(),
                    name: parameter.name.clone(),
                })
            }
            None if parameter.is_array => ModelValue::Array(Vec::new()),
            None => model.construct(&parameter.class_name, Arguments::new())?,
        };

        args = args.named(parameter.name.clone(), parsed);
    }

    model.construct(class_name, args)
}

fn scalar_from_json(value: &Value) -> ModelValue {
    match value {
        Value::Bool(b) => ModelValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ModelValue::Int(i)
            } else {
                ModelValue::Number(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => ModelValue::Str(s.clone()),
        Value::Null => ModelValue::Null,
        // Non-scalar JSON against a scalar class; construction reports the
        // mismatch with the declared class name.
        Value::Array(_) => ModelValue::Array(Vec::new()),
        Value::Object(_) => ModelValue::Null,
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
