use chrono::NaiveDate;
use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

/// Reference to a named Jira object embedded in issue fields (status, issue type, project, parent).
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntity {
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub name: Option<String>,
}

/// Accepts strings, numbers and booleans as text; blank strings and nulls become `None`.
/// Structured values (e.g. rich-text documents) are kept as their JSON encoding.
pub(crate) fn deserialize_string_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|val| match val {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => None,
        other => serde_json::to_string(&other).ok(),
    }))
}

/// Parses a Jira calendar date (`YYYY-MM-DD`). Anything else yields `None`.
pub fn parse_jira_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
