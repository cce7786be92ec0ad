use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JiraError, Result};

pub const DEFAULT_API_VERSION: &str = "2";
pub const DEFAULT_USER_AGENT: &str = "jira-manager";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Jira Cloud's stock "Start date" field.
pub const DEFAULT_START_DATE_FIELD: &str = "customfield_10015";

/// Which issue search endpoint to page through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchApi {
    /// `GET search`, paged by `startAt` until `total`.
    #[default]
    Offset,
    /// `GET search/jql`, paged by `nextPageToken` until `isLast`. Required on newer Jira Cloud sites.
    Token,
}

#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub api_version: String,
    pub username: String,
    pub api_token: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub page_size: u32,
    pub start_date_field: String,
    pub search_api: SearchApi,
}

impl JiraConfig {
    /// Creates a config for the given site, rejecting blank connection parameters.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().to_string();
        let username = username.into().trim().to_string();
        let api_token = api_token.into().trim().to_string();

        let missing: Vec<&str> = [
            ("host", base_url.is_empty()),
            ("username", username.is_empty()),
            ("api token", api_token.is_empty()),
        ]
        .iter()
        .filter(|(_, blank)| *blank)
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(JiraError::Configuration(format!(
                "missing Jira {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            username,
            api_token,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            start_date_field: DEFAULT_START_DATE_FIELD.to_string(),
            search_api: SearchApi::default(),
        })
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 1000);
        self
    }

    pub fn with_start_date_field(mut self, field: impl Into<String>) -> Self {
        self.start_date_field = field.into();
        self
    }

    pub fn with_search_api(mut self, search_api: SearchApi) -> Self {
        self.search_api = search_api;
        self
    }

    /// Site URL without a trailing slash, used for browse links.
    pub fn server_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn api_root(&self) -> String {
        format!(
            "{}/rest/api/{}/",
            self.server_url(),
            self.api_version.trim_matches('/')
        )
    }

    /// Human-facing link to an issue.
    pub fn browse_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{}", self.server_url(), issue_key)
    }
}
