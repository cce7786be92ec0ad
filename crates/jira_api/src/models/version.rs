use chrono::NaiveDate;
use serde::Deserialize;

use super::entity::{deserialize_string_field, parse_jira_date};

/// Project version ("fix version") as returned by the project versions endpoint and inside issue fields.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionPayload {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_string_field")]
    pub description: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub archived: bool,
}

impl VersionPayload {
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date.as_deref().and_then(parse_jira_date)
    }

    /// Released and archived versions are closed for new work.
    pub fn is_unreleased(&self) -> bool {
        !self.released && !self.archived
    }
}
