use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::entity::{deserialize_string_field, parse_jira_date, NamedEntity};
use super::user::UserPayload;
use super::version::VersionPayload;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IssuePayload {
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<NamedEntity>,
    #[serde(default)]
    pub issuetype: Option<NamedEntity>,
    #[serde(default)]
    pub project: Option<NamedEntity>,
    #[serde(default)]
    pub parent: Option<NamedEntity>,
    #[serde(default)]
    pub assignee: Option<UserPayload>,
    #[serde(default)]
    pub fix_versions: Vec<VersionPayload>,
    #[serde(default)]
    pub duedate: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Custom fields and anything else not modelled above.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl IssuePayload {
    pub fn issue_type_name(&self) -> Option<&str> {
        self.fields
            .issuetype
            .as_ref()
            .and_then(|kind| kind.name.as_deref())
    }

    pub fn status_name(&self) -> Option<&str> {
        self.fields
            .status
            .as_ref()
            .and_then(|status| status.name.as_deref())
    }

    /// Project key from the `project` field, falling back to the key prefix.
    pub fn project_key(&self) -> String {
        self.fields
            .project
            .as_ref()
            .and_then(|project| project.key.clone())
            .unwrap_or_else(|| {
                self.key
                    .rsplit_once('-')
                    .map(|(prefix, _)| prefix.to_string())
                    .unwrap_or_else(|| self.key.clone())
            })
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.fields
            .parent
            .as_ref()
            .and_then(|parent| parent.key.as_deref())
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.fields.duedate.as_deref().and_then(parse_jira_date)
    }

    /// Reads a date-valued custom field such as the site's start date field.
    pub fn date_field(&self, field: &str) -> Option<NaiveDate> {
        self.fields
            .extra
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_jira_date)
    }
}
