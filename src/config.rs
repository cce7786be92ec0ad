//! Settings model and file-backed manager.
//!
//! Settings are loaded once at startup and passed down explicitly. The file
//! supplies everything; `JIRA_HOST`, `JIRA_USERNAME` and `JIRA_API_TOKEN`
//! override the connection values, and the keyring is the last resort for the
//! token.

use jira_api::config::DEFAULT_START_DATE_FIELD;
use jira_api::{JiraConfig, SearchApi};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::manifest::ProjectDirectory;
use crate::policy::EligibilityPolicy;

pub const ENV_HOST: &str = "JIRA_HOST";
pub const ENV_USERNAME: &str = "JIRA_USERNAME";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";

const REDACTED: &str = "********";

fn default_start_date_field() -> String {
    DEFAULT_START_DATE_FIELD.to_string()
}

/// Connection parameters for the Jira site.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct JiraSettings {
    pub host: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
}

/// Represents the persisted tool settings: Jira connection, managed projects, per-project timezone and manager lookups, and the eligibility policy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub jira: JiraSettings,
    pub projects: Vec<String>,
    pub project_timezones: BTreeMap<String, String>,
    pub project_managers: BTreeMap<String, String>,
    pub policy: EligibilityPolicy,
    #[serde(default = "default_start_date_field")]
    pub start_date_field: String,
    pub search_api: SearchApi,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jira: JiraSettings::default(),
            projects: Vec::new(),
            project_timezones: BTreeMap::new(),
            project_managers: BTreeMap::new(),
            policy: EligibilityPolicy::default(),
            start_date_field: default_start_date_field(),
            search_api: SearchApi::default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

impl Settings {
    /// Overrides connection values with whatever `lookup` finds for the `JIRA_*` variables.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = non_blank(lookup(ENV_HOST)) {
            self.jira.host = Some(host);
        }
        if let Some(username) = non_blank(lookup(ENV_USERNAME)) {
            self.jira.username = Some(username);
        }
        if let Some(token) = non_blank(lookup(ENV_API_TOKEN)) {
            self.jira.api_token = Some(token);
        }
        self
    }

    pub fn project_directory(&self) -> ProjectDirectory {
        ProjectDirectory {
            timezones: self.project_timezones.clone(),
            managers: self.project_managers.clone(),
        }
    }

    /// Builds a validated client config. `stored_token` is used only when no token is configured.
    pub fn tracker_config(&self, stored_token: Option<String>) -> Result<JiraConfig> {
        let host = non_blank(self.jira.host.clone());
        let username = non_blank(self.jira.username.clone());
        let token = non_blank(self.jira.api_token.clone()).or_else(|| non_blank(stored_token));

        match (host, username, token) {
            (Some(host), Some(username), Some(token)) => {
                let config = JiraConfig::new(host, username, token)?
                    .with_start_date_field(self.start_date_field.clone())
                    .with_search_api(self.search_api);
                Ok(config)
            }
            (host, username, token) => {
                let missing: Vec<&str> = [
                    (ENV_HOST, host.is_none()),
                    (ENV_USERNAME, username.is_none()),
                    (ENV_API_TOKEN, token.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
                Err(AppError::Configuration(format!(
                    "Missing Jira configuration: {}. Set them in the settings file, the environment, or store a token with `token set`",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.jira.api_token.is_some() {
            copy.jira.api_token = Some(REDACTED.to_string());
        }
        copy
    }
}

/// Loads and saves [`Settings`] as JSON, by default in the platform config directory.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager bound to the platform-specific config path.
    pub fn new() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("io", "jira-manager", "jira-manager")
            .ok_or_else(|| {
                AppError::Configuration("Could not determine config directory".to_string())
            })?;
        Ok(Self {
            path: dirs.config_dir().join("config.json"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|err| {
            AppError::Configuration(format!(
                "Invalid settings file {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    /// Persists settings, creating parent directories when needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
