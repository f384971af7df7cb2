use serde::Serialize;
use serde_json::Value;

use crate::shared::errors::CallFailure;

pub const NO_TOOL_SELECTED: &str = "No tool selected";

/// Display text for a settled invocation, tagged with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "text", rename_all = "snake_case")]
pub enum DisplayText {
    /// Decoded as JSON and re-serialized with 2-space indentation.
    Structured(String),
    /// Shown exactly as received.
    Verbatim(String),
}

impl DisplayText {
    pub fn as_str(&self) -> &str {
        match self {
            DisplayText::Structured(text) | DisplayText::Verbatim(text) => text,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            DisplayText::Structured(text) | DisplayText::Verbatim(text) => text,
        }
    }
}

/// Renders `content[0].text` of a call result, pretty-printed when it is JSON.
///
/// A response without that text is shown as the whole response, pretty-printed.
pub fn normalize_result(response: &Value) -> DisplayText {
    let Some(text) = first_text(response) else {
        return match serde_json::to_string_pretty(response) {
            Ok(pretty) => DisplayText::Structured(pretty),
            Err(_) => DisplayText::Verbatim(response.to_string()),
        };
    };
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|decoded| serde_json::to_string_pretty(&integral_floats_as_ints(decoded)).ok())
        .map(DisplayText::Structured)
        .unwrap_or_else(|| DisplayText::Verbatim(text.to_string()))
}

pub fn render_failure(failure: &CallFailure) -> DisplayText {
    failure
        .detail
        .as_ref()
        .and_then(|detail| serde_json::to_string_pretty(detail).ok())
        .map(DisplayText::Structured)
        .unwrap_or_else(|| DisplayText::Verbatim(failure.message.clone()))
}

/// Largest magnitude below which every integral f64 is exact as an i64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// `1.0` and `1e2` print as `1` and `100`.
fn integral_floats_as_ints(value: Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(float)
                if number.is_f64() && float.fract() == 0.0 && float.abs() < MAX_EXACT_INT =>
            {
                Value::from(float as i64)
            }
            _ => Value::Number(number),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(integral_floats_as_ints).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, integral_floats_as_ints(item)))
                .collect(),
        ),
        other => other,
    }
}

fn first_text(response: &Value) -> Option<&str> {
    response
        .get("content")?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
}
