// src/types/schema.rs
//! Output schemas requested from the language model

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// A named JSON schema sent alongside a model call.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Records the model is asked to produce.
pub trait StructuredOutput: DeserializeOwned {
    fn output_schema() -> OutputSchema;
}

pub fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn string_list_property(description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": { "type": "string" }
    })
}

pub fn object_list_property(description: &str, item: Value) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": item
    })
}

/// Build an object schema from `(field, property)` pairs, keeping field order.
pub fn object_schema(description: Option<&str>, fields: Vec<(&str, Value)>) -> Value {
    let mut properties = Map::new();
    for (name, property) in fields {
        properties.insert(name.to_string(), property);
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    if let Some(description) = description {
        schema.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    Value::Object(schema)
}
