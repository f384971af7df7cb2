use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::shared::types::ParameterValues;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<InputSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct InputSchema {
    /// Absent when the schema declares no `properties` object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PropertySchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogRejection {
    #[error("catalog is not a sequence")]
    NotASequence,
    #[error("catalog entry {index} is not a record")]
    EntryNotRecord { index: usize },
    #[error("catalog entry {index} has no string `name`")]
    MissingName { index: usize },
}

/// Outcome of checking an untrusted discovery payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCheck {
    Valid(Vec<ToolDescriptor>),
    Rejected(CatalogRejection),
}

/// Accepts only a sequence whose every element is a record with a string `name`.
/// A single bad entry rejects the whole catalog.
pub fn validate_catalog(value: &Value) -> CatalogCheck {
    let Some(entries) = value.as_array() else {
        return CatalogCheck::Rejected(CatalogRejection::NotASequence);
    };
    let mut tools = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(record) = entry.as_object() else {
            return CatalogCheck::Rejected(CatalogRejection::EntryNotRecord { index });
        };
        match ToolDescriptor::from_record(record) {
            Some(tool) => tools.push(tool),
            None => return CatalogCheck::Rejected(CatalogRejection::MissingName { index }),
        }
    }
    CatalogCheck::Valid(tools)
}

impl ToolDescriptor {
    fn from_record(record: &Map<String, Value>) -> Option<Self> {
        let name = record.get("name")?.as_str()?.to_string();
        let description = record
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let input_schema = record
            .get("inputSchema")
            .and_then(Value::as_object)
            .map(InputSchema::from_record);
        Some(Self {
            name,
            description,
            input_schema,
        })
    }

    pub fn property_keys(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .iter()
            .filter_map(|schema| schema.properties.as_ref())
            .flat_map(|props| props.keys().map(String::as_str))
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.input_schema
            .as_ref()
            .is_some_and(|schema| schema.required.iter().any(|r| r == key))
    }
}

impl InputSchema {
    fn from_record(record: &Map<String, Value>) -> Self {
        let properties = record.get("properties").and_then(Value::as_object).map(|props| {
            props
                .iter()
                .map(|(key, prop)| {
                    let description = prop
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    (key.clone(), PropertySchema { description })
                })
                .collect()
        });
        let required = record
            .get("required")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            properties,
            required,
        }
    }
}

/// Every schema property mapped to `""`, in schema order.
pub fn parameter_template(tool: &ToolDescriptor) -> ParameterValues {
    tool.property_keys()
        .map(|key| (key.to_string(), String::new()))
        .collect()
}

/// One row of the parameter form for the selected tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterField {
    pub key: String,
    pub description: Option<String>,
    pub required: bool,
    pub value: String,
}

pub fn parameter_fields(tool: &ToolDescriptor, values: &ParameterValues) -> Vec<ParameterField> {
    let Some(props) = tool
        .input_schema
        .as_ref()
        .and_then(|schema| schema.properties.as_ref())
    else {
        return Vec::new();
    };
    props
        .iter()
        .map(|(key, prop)| ParameterField {
            key: key.clone(),
            description: prop.description.clone(),
            required: tool.is_required(key),
            value: values.get(key).cloned().unwrap_or_default(),
        })
        .collect()
}
