//! Typed Jira REST API client used by the release automation tooling.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::JiraClient;
pub use config::{JiraConfig, SearchApi};
pub use error::{JiraError, Result};
pub use reqwest::StatusCode;

pub use models::{
    parse_jira_date, IssueFields, IssuePayload, NamedEntity, SearchResponse, UserPayload,
    VersionPayload,
};
