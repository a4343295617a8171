//! Schema-driven type coercion.
//!
//! Query strings, headers, path parameters and form bodies arrive as strings.
//! Before validation each value is converted toward the type its schema
//! declares, and missing properties with a `default` are filled in. Values
//! that cannot be converted are left untouched so validation reports them.

use serde_json::{Map, Number, Value};

fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn already_allowed(value: &Value, types: &[&str]) -> bool {
    types.iter().any(|t| match (*t, value) {
        ("string", Value::String(_))
        | ("boolean", Value::Bool(_))
        | ("null", Value::Null)
        | ("object", Value::Object(_))
        | ("array", Value::Array(_))
        | ("number", Value::Number(_)) => true,
        ("integer", Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    })
}

fn from_string(s: &str, target: &str) -> Option<Value> {
    let s = s.trim();
    match target {
        "integer" => s.parse::<i64>().ok().map(Value::from),
        "number" => {
            if let Ok(i) = s.parse::<i64>() {
                return Some(Value::from(i));
            }
            s.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
        }
        "boolean" => match s {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        "null" if s.is_empty() => Some(Value::Null),
        _ => None,
    }
}

/// Converts `value` toward the types declared by `schema`.
#[must_use]
pub fn coerce(value: Value, schema: &Value) -> Value {
    let Some(schema) = schema.as_object() else {
        return value;
    };
    let types = declared_types(schema);

    let value = if types.is_empty() || already_allowed(&value, &types) {
        value
    } else {
        convert(value, &types)
    };

    match value {
        Value::Object(object) => Value::Object(coerce_object(object, schema)),
        Value::Array(items) => match schema.get("items") {
            Some(item_schema) if item_schema.is_object() => Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce(item, item_schema))
                    .collect(),
            ),
            _ => Value::Array(items),
        },
        other => other,
    }
}

fn convert(value: Value, types: &[&str]) -> Value {
    if let Value::String(s) = &value {
        for target in types {
            if let Some(converted) = from_string(s, target) {
                return converted;
            }
        }
    }
    if types.contains(&"array") {
        return Value::Array(vec![value]);
    }
    if types.contains(&"string") {
        match &value {
            Value::Number(n) => return Value::String(n.to_string()),
            Value::Bool(b) => return Value::String(b.to_string()),
            _ => {}
        }
    }
    value
}

fn coerce_object(mut object: Map<String, Value>, schema: &Map<String, Value>) -> Map<String, Value> {
    let Some(Value::Object(properties)) = schema.get("properties") else {
        return object;
    };

    for (name, property) in properties {
        match object.get_mut(name) {
            Some(slot) => {
                let value = slot.take();
                *slot = coerce(value, property);
            }
            None => {
                if let Some(default) = property.get("default") {
                    object.insert(name.clone(), default.clone());
                }
            }
        }
    }
    object
}
