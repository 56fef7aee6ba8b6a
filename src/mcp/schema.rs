//! Parameter schemas and the validator that guards every handler.
//!
//! A schema is an ordered field table (name -> semantic type, required flag,
//! description). Validation is the only way to obtain [`ValidatedParams`],
//! so a handler can never see unchecked arguments.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Semantic type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether a JSON value has this semantic type. `null` never matches.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Name of the JSON type of `value`, for error messages.
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

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
}

/// Ordered parameter table for a command. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<ParamField>,
}

impl ParamSchema {
    /// Schema with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.field(name, ty, true, description)
    }

    pub fn optional(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.field(name, ty, false, description)
    }

    fn field(mut self, name: &str, ty: ParamType, required: bool, description: &str) -> Self {
        self.fields.push(ParamField {
            name: name.to_string(),
            ty,
            required,
            description: description.to_string(),
        });
        self
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check the table itself: field names must be non-empty and unique.
    pub fn check_well_formed(&self) -> Result<(), String> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(format!("parameter #{} has an empty name", i));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("parameter `{}` is declared twice", field.name));
            }
        }
        Ok(())
    }

    /// Validate raw arguments against the table.
    ///
    /// `null` is treated as an empty argument object (MCP clients may omit
    /// `arguments` entirely). All problems are reported, joined by `; `.
    pub fn validate(&self, args: &Value) -> Result<ValidatedParams, String> {
        let map = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(format!(
                    "params must be an object, got {}",
                    json_type_name(other)
                ))
            }
        };

        let mut problems = Vec::new();

        for field in &self.fields {
            match map.get(&field.name) {
                None if field.required => {
                    problems.push(format!("missing required field `{}`", field.name));
                }
                None => {}
                Some(value) if !field.ty.matches(value) => {
                    problems.push(format!(
                        "field `{}` must be {}, got {}",
                        field.name,
                        field.ty.as_str(),
                        json_type_name(value)
                    ));
                }
                Some(_) => {}
            }
        }

        for key in map.keys() {
            if !self.fields.iter().any(|f| &f.name == key) {
                problems.push(format!("unknown field `{}`", key));
            }
        }

        if problems.is_empty() {
            Ok(ValidatedParams(map))
        } else {
            Err(problems.join("; "))
        }
    }

    /// JSON Schema rendering used as the MCP `inputSchema`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                json!({
                    "type": field.ty.as_str(),
                    "description": field.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Arguments that passed [`ParamSchema::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParams(Map<String, Value>);

impl ValidatedParams {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Flatten into query-string pairs. Strings are sent verbatim, every other
    /// value as its JSON text.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect()
    }
}
