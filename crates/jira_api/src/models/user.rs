//! User models returned by Jira identity and issue endpoints.

use serde::Deserialize;

fn default_active() -> bool {
    true
}

/// Represents a Jira account as embedded in issue fields or returned by `myself`. Email is often hidden by privacy settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub account_id: String,
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub time_zone: Option<String>,
}
