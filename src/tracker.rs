//! Issue tracker collaborator used by the executor, renderer and CLI.
//!
//! [`IssueTracker`] is the seam between the decision code and the network;
//! [`JiraTracker`] implements it over [`JiraClient`].

use std::collections::HashSet;

use async_trait::async_trait;
use jira_api::{JiraClient, JiraError, Result as JiraResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::bridge::{convert_issue_as, convert_issues, convert_unreleased};
use crate::model::{Issue, IssueKind, Release};

static PLAIN_JQL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("invalid jql value regex"));

/// Words JQL refuses as bare values; matched case-insensitively.
static JQL_RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "abort", "access", "add", "after", "alias", "all", "alter", "an", "and", "any",
        "as", "asc", "audit", "avg", "before", "begin", "between", "boolean", "break", "by",
        "byte", "catch", "cf", "changed", "char", "character", "check", "checkpoint", "collate",
        "collation", "column", "commit", "connect", "continue", "count", "create", "current",
        "date", "decimal", "declare", "decrement", "default", "defaults", "define", "delete",
        "delimiter", "desc", "difference", "distinct", "divide", "do", "double", "drop", "else",
        "empty", "encoding", "end", "equals", "escape", "exclusive", "exec", "execute", "exists",
        "explain", "false", "fetch", "file", "field", "first", "float", "for", "from",
        "function", "go", "goto", "grant", "greater", "group", "having", "identified", "if",
        "immediate", "in", "increment", "index", "initial", "inner", "inout", "input", "insert",
        "int", "integer", "intersect", "intersection", "into", "is", "isempty", "isnull",
        "join", "last", "left", "less", "like", "limit", "lock", "long", "max", "min", "minus",
        "mode", "modify", "modulo", "more", "multiply", "next", "noaudit", "not", "notin",
        "nowait", "null", "number", "object", "of", "on", "option", "or", "order", "outer",
        "output", "power", "previous", "prior", "privileges", "public", "raise", "raw",
        "remainder", "rename", "resource", "return", "returns", "revoke", "right", "row",
        "rowid", "rownum", "rows", "select", "session", "set", "share", "size", "sqrt", "start",
        "strict", "string", "subtract", "sum", "synonym", "table", "then", "to", "trans",
        "transaction", "trigger", "true", "uid", "union", "unique", "update", "user",
        "validate", "values", "view", "was", "when", "whenever", "where", "while", "with",
    ]
    .into_iter()
    .collect()
});

#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Site URL without a trailing slash.
    fn server_url(&self) -> &str;

    /// Human-facing link to an issue.
    fn browse_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{}", self.server_url(), issue_key)
    }

    async fn fetch_epics_by_label(&self, project_key: &str, label: &str) -> JiraResult<Vec<Issue>>;

    async fn fetch_stories_by_epic(&self, epic_key: &str) -> JiraResult<Vec<Issue>>;

    /// Versions not yet released or archived.
    async fn fetch_unreleased_releases(&self, project_key: &str) -> JiraResult<Vec<Release>>;

    async fn fetch_issues_for_release(&self, release: &Release) -> JiraResult<Vec<Issue>>;

    async fn fetch_epic(&self, epic_key: &str) -> JiraResult<Issue>;

    /// Replaces any existing fix versions on the issue with exactly `release`.
    async fn assign_release(&self, issue_key: &str, release: &Release) -> JiraResult<()>;

    async fn add_comment(&self, issue_key: &str, text: &str) -> JiraResult<()>;

    /// Idempotent: adding a label the issue already has is a no-op.
    async fn add_label(&self, issue_key: &str, label: &str) -> JiraResult<()>;
}

/// Quotes a JQL value unless it is a bare identifier that is not a reserved word.
pub fn jql_value(value: &str) -> String {
    let reserved = JQL_RESERVED_WORDS.contains(value.to_ascii_lowercase().as_str());
    if !reserved && PLAIN_JQL_VALUE.is_match(value) {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

pub fn epics_by_label_jql(project_key: &str, label: &str) -> String {
    format!(
        "project = {} AND issuetype = Epic AND labels = {}",
        jql_value(project_key),
        jql_value(label)
    )
}

pub fn stories_by_epic_jql(epic_key: &str) -> String {
    format!("parent = {} AND issuetype = Story", jql_value(epic_key))
}

pub fn issues_for_release_jql(release: &Release) -> String {
    format!("fixVersion = {}", jql_value(&release.id))
}

pub struct JiraTracker {
    client: JiraClient,
}

impl JiraTracker {
    pub fn new(client: JiraClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &JiraClient {
        &self.client
    }

    fn start_date_field(&self) -> &str {
        &self.client.config().start_date_field
    }

    async fn search_as(&self, jql: &str, kind: IssueKind) -> JiraResult<Vec<Issue>> {
        debug!("Searching {} issues: {}", kind.as_str(), jql);
        let issues = self.client.search_issues(jql).await?;
        Ok(issues
            .into_iter()
            .map(|issue| convert_issue_as(issue, kind, self.start_date_field()))
            .collect())
    }
}

#[async_trait]
impl IssueTracker for JiraTracker {
    fn server_url(&self) -> &str {
        self.client.server_url()
    }

    fn browse_url(&self, issue_key: &str) -> String {
        self.client.config().browse_url(issue_key)
    }

    async fn fetch_epics_by_label(&self, project_key: &str, label: &str) -> JiraResult<Vec<Issue>> {
        self.search_as(&epics_by_label_jql(project_key, label), IssueKind::Epic)
            .await
    }

    async fn fetch_stories_by_epic(&self, epic_key: &str) -> JiraResult<Vec<Issue>> {
        self.search_as(&stories_by_epic_jql(epic_key), IssueKind::Story)
            .await
    }

    async fn fetch_unreleased_releases(&self, project_key: &str) -> JiraResult<Vec<Release>> {
        let versions = self.client.get_project_versions(project_key).await?;
        let total = versions.len();
        let releases = convert_unreleased(versions);
        debug!(
            "Project {} has {} unreleased of {} versions",
            project_key,
            releases.len(),
            total
        );
        Ok(releases)
    }

    async fn fetch_issues_for_release(&self, release: &Release) -> JiraResult<Vec<Issue>> {
        let jql = issues_for_release_jql(release);
        debug!("Searching issues for release {}: {}", release.name, jql);
        let issues = self.client.search_issues(&jql).await?;
        Ok(convert_issues(issues, self.start_date_field()))
    }

    async fn fetch_epic(&self, epic_key: &str) -> JiraResult<Issue> {
        let issue = self.client.get_issue(epic_key).await?;
        let kind = issue
            .issue_type_name()
            .map(IssueKind::from_type_name)
            .unwrap_or(IssueKind::Story);
        if kind != IssueKind::Epic {
            return Err(JiraError::Other(format!("{} is not an epic", epic_key)));
        }
        Ok(convert_issue_as(issue, IssueKind::Epic, self.start_date_field()))
    }

    async fn assign_release(&self, issue_key: &str, release: &Release) -> JiraResult<()> {
        self.client
            .set_fix_versions(issue_key, &[release.id.as_str()])
            .await
    }

    async fn add_comment(&self, issue_key: &str, text: &str) -> JiraResult<()> {
        self.client.add_comment(issue_key, text).await
    }

    async fn add_label(&self, issue_key: &str, label: &str) -> JiraResult<()> {
        self.client.add_label(issue_key, label).await
    }
}
