//! Parameter Schemas
//!
//! Structural checks for the JSON Schema (draft-7 keyword shapes) that
//! describes a tool's arguments, and a value-level check of model-supplied
//! arguments against such a schema.
//!
//! Only keyword *shapes* are enforced at registration time: a `properties`
//! entry must be a sub-schema, `required` must list strings, and so on.
//! Unknown keywords are ignored, as draft-7 allows.

use serde_json::{Map, Value};
use thiserror::Error;

const TYPE_NAMES: &[&str] = &[
    "null", "boolean", "object", "array", "number", "string", "integer",
];

/// Schema violation at a JSON-pointer-like path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct SchemaError {
    pub path: String,
    pub reason: String,
}

impl SchemaError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

type Check = Result<(), SchemaError>;

/// Schema of a tool that takes no arguments
pub fn no_parameters() -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(Map::new()));
    Value::Object(schema)
}

/// Validate that `schema` is a well-formed parameter schema
pub fn validate_schema(schema: &Value) -> Check {
    match schema {
        Value::Object(map) => check_object_schema(map, ""),
        other => Err(SchemaError::new(
            "",
            format!("schema must be an object, got {}", type_name(other)),
        )),
    }
}

fn check_subschema(schema: &Value, path: &str) -> Check {
    match schema {
        Value::Bool(_) => Ok(()),
        Value::Object(map) => check_object_schema(map, path),
        other => Err(SchemaError::new(
            path,
            format!("expected a schema object, got {}", type_name(other)),
        )),
    }
}

fn check_object_schema(map: &Map<String, Value>, path: &str) -> Check {
    for (keyword, value) in map {
        let here = format!("{path}/{keyword}");
        match keyword.as_str() {
            "type" => check_type_keyword(value, &here)?,
            "properties" | "patternProperties" | "definitions" | "$defs" => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| SchemaError::new(&here, "expected an object of schemas"))?;
                for (name, sub) in entries {
                    check_subschema(sub, &format!("{here}/{name}"))?;
                }
            }
            "additionalProperties" | "additionalItems" | "contains" | "propertyNames" | "not"
            | "if" | "then" | "else" => check_subschema(value, &here)?,
            "items" => match value {
                Value::Array(items) => {
                    for (i, sub) in items.iter().enumerate() {
                        check_subschema(sub, &format!("{here}/{i}"))?;
                    }
                }
                other => check_subschema(other, &here)?,
            },
            "allOf" | "anyOf" | "oneOf" => {
                let items = value
                    .as_array()
                    .filter(|items| !items.is_empty())
                    .ok_or_else(|| SchemaError::new(&here, "expected a non-empty array of schemas"))?;
                for (i, sub) in items.iter().enumerate() {
                    check_subschema(sub, &format!("{here}/{i}"))?;
                }
            }
            "required" => check_unique_strings(value, &here)?,
            "enum" => {
                if !value.is_array() {
                    return Err(SchemaError::new(&here, "expected an array"));
                }
            }
            "minLength" | "maxLength" | "minItems" | "maxItems" | "minProperties"
            | "maxProperties" => {
                if value.as_u64().is_none() {
                    return Err(SchemaError::new(&here, "expected a non-negative integer"));
                }
            }
            "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" => {
                if !value.is_number() {
                    return Err(SchemaError::new(&here, "expected a number"));
                }
            }
            "multipleOf" => match value.as_f64() {
                Some(n) if n > 0.0 => {}
                _ => return Err(SchemaError::new(&here, "expected a number greater than 0")),
            },
            "pattern" | "format" | "title" | "description" | "$id" | "$ref" | "$schema" => {
                if !value.is_string() {
                    return Err(SchemaError::new(&here, "expected a string"));
                }
            }
            "uniqueItems" => {
                if !value.is_boolean() {
                    return Err(SchemaError::new(&here, "expected a boolean"));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_type_keyword(value: &Value, path: &str) -> Check {
    match value {
        Value::String(name) => check_type_name(name, path),
        Value::Array(names) if !names.is_empty() => {
            check_unique_strings(value, path)?;
            names
                .iter()
                .filter_map(Value::as_str)
                .try_for_each(|name| check_type_name(name, path))
        }
        _ => Err(SchemaError::new(
            path,
            "expected a type name or a non-empty array of type names",
        )),
    }
}

fn check_type_name(name: &str, path: &str) -> Check {
    if TYPE_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(SchemaError::new(path, format!("unknown type '{name}'")))
    }
}

fn check_unique_strings(value: &Value, path: &str) -> Check {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::new(path, "expected an array of strings"))?;
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        let s = item
            .as_str()
            .ok_or_else(|| SchemaError::new(path, "expected an array of strings"))?;
        if seen.contains(&s) {
            return Err(SchemaError::new(path, format!("duplicate entry '{s}'")));
        }
        seen.push(s);
    }
    Ok(())
}

/// Check `args` against the parts of `schema` that matter for tool arguments:
/// `type`, `required`, `properties`, `items`, `enum` and
/// `additionalProperties: false`.
///
/// The schema is assumed to have passed [`validate_schema`].
pub fn validate_arguments(schema: &Value, args: &Value) -> Check {
    check_value(schema, args, "")
}

fn check_value(schema: &Value, value: &Value, path: &str) -> Check {
    let map = match schema {
        Value::Bool(true) => return Ok(()),
        Value::Bool(false) => return Err(SchemaError::new(path, "no value is allowed here")),
        Value::Object(map) => map,
        _ => return Ok(()),
    };

    if let Some(expected) = map.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(t, value)) {
            return Err(SchemaError::new(
                path,
                format!("expected {}, got {}", allowed.join(" or "), type_name(value)),
            ));
        }
    }

    if let Some(Value::Array(options)) = map.get("enum") {
        if !options.contains(value) {
            return Err(SchemaError::new(path, "value is not one of the allowed options"));
        }
    }

    if let Value::Object(fields) = value {
        if let Some(Value::Array(required)) = map.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(name) {
                    return Err(SchemaError::new(
                        path,
                        format!("missing required property '{name}'"),
                    ));
                }
            }
        }

        let properties = map.get("properties").and_then(Value::as_object);
        for (name, field) in fields {
            let here = format!("{path}/{name}");
            match properties.and_then(|p| p.get(name)) {
                Some(sub) => check_value(sub, field, &here)?,
                None => {
                    if let Some(extra) = map.get("additionalProperties") {
                        check_value(extra, field, &here)?;
                    }
                }
            }
        }
    }

    if let (Value::Array(items), Some(item_schema @ Value::Object(_))) = (value, map.get("items")) {
        for (i, item) in items.iter().enumerate() {
            check_value(item_schema, item, &format!("{path}/{i}"))?;
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64() || is_integral_float(value),
        _ => true,
    }
}

fn is_integral_float(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n.fract() == 0.0)
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn code_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string"}
            },
            "required": ["code"]
        })
    }

    #[test]
    fn accepts_well_formed_schemas() {
        assert!(validate_schema(&code_schema()).is_ok());
        assert!(validate_schema(&json!({})).is_ok());
        assert!(validate_schema(&no_parameters()).is_ok());
        assert!(validate_arguments(&no_parameters(), &json!({})).is_ok());
        assert!(
            validate_schema(&json!({
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                    "limit": {"type": ["integer", "null"], "minimum": 0},
                    "mode": {"enum": ["fast", "slow"]},
                    "any": true
                },
                "additionalProperties": false
            }))
            .is_ok()
        );
    }

    #[test]
    fn scalar_property_is_rejected() {
        let err = validate_schema(&json!({
            "type": "object",
            "properties": {"code": ""}
        }))
        .unwrap_err();

        assert_eq!(err.path, "/properties/code");
    }

    #[test]
    fn rejects_malformed_keywords() {
        assert!(validate_schema(&json!("object")).is_err());
        assert!(validate_schema(&json!({"type": "text"})).is_err());
        assert!(validate_schema(&json!({"type": []})).is_err());
        assert!(validate_schema(&json!({"required": ["a", "a"]})).is_err());
        assert!(validate_schema(&json!({"required": "a"})).is_err());
        assert!(validate_schema(&json!({"anyOf": []})).is_err());
        assert!(validate_schema(&json!({"items": [{"type": "string"}, 3]})).is_err());
        assert!(validate_schema(&json!({"minLength": -1})).is_err());
        assert!(validate_schema(&json!({"multipleOf": 0})).is_err());
    }

    #[test]
    fn arguments_matching_schema_pass() {
        assert!(validate_arguments(&code_schema(), &json!({"code": "abc"})).is_ok());
        assert!(validate_arguments(&json!({}), &json!({"anything": [1, 2]})).is_ok());
    }

    #[test]
    fn arguments_violating_schema_fail() {
        let missing = validate_arguments(&code_schema(), &json!({})).unwrap_err();
        assert!(missing.reason.contains("code"));

        let wrong_type = validate_arguments(&code_schema(), &json!({"code": 42})).unwrap_err();
        assert_eq!(wrong_type.path, "/code");

        let closed = json!({"type": "object", "additionalProperties": false});
        assert!(validate_arguments(&closed, &json!({"extra": 1})).is_err());

        let choice = json!({"properties": {"mode": {"enum": ["fast", "slow"]}}});
        assert!(validate_arguments(&choice, &json!({"mode": "medium"})).is_err());
    }

    #[test]
    fn integer_accepts_whole_floats() {
        let schema = json!({"type": "integer"});
        assert!(validate_arguments(&schema, &json!(3.0)).is_ok());
        assert!(validate_arguments(&schema, &json!(3.5)).is_err());
    }
}
