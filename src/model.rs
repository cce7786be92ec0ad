//! Domain records for users, releases and issues.
//!
//! These are built fresh from each tracker fetch and never cached. Epics and
//! stories share one shape; [`IssueKind`] is the only thing that changes how
//! the engine treats them.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ISSUE_KEY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9_]*)-(\d+)$").expect("invalid issue key regex"));

/// A tracker account. Identity is `account_id`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub account_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub active: bool,
    pub time_zone: Option<String>,
}

impl User {
    pub fn new(account_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            email: None,
            display_name: display_name.into(),
            active: true,
            time_zone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A project version ("fix version"). Releases without a date are unscheduled
/// and never recommended.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl Release {
    pub fn new(id: impl Into<String>, name: impl Into<String>, release_date: Option<NaiveDate>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            release_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Epic,
    Story,
}

impl IssueKind {
    /// Maps a tracker issue type name. Anything that is not an epic is handled as a story.
    pub fn from_type_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("epic") {
            IssueKind::Epic
        } else {
            IssueKind::Story
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Epic => "Epic",
            IssueKind::Story => "Story",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub project_key: String,
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
    pub status: String,
    pub assignee: Option<User>,
    pub fix_versions: Vec<Release>,
    pub due_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub labels: Vec<String>,
    pub parent_key: Option<String>,
}

impl Issue {
    /// Creates an issue in the tracker's default "To Do" state with no dates or versions.
    pub fn new(kind: IssueKind, key: impl Into<String>, summary: impl Into<String>) -> Self {
        let key = key.into();
        let project_key = project_key_of(&key).unwrap_or_default().to_string();
        Self {
            kind,
            project_key,
            key,
            summary: summary.into(),
            description: None,
            status: "To Do".to_string(),
            assignee: None,
            fix_versions: Vec::new(),
            due_date: None,
            start_date: None,
            labels: Vec::new(),
            parent_key: None,
        }
    }

    pub fn epic(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(IssueKind::Epic, key, summary)
    }

    pub fn story(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(IssueKind::Story, key, summary)
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_assignee(mut self, assignee: User) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_fix_version(mut self, release: Release) -> Self {
        self.fix_versions.push(release);
        self
    }

    pub fn is_epic(&self) -> bool {
        self.kind == IssueKind::Epic
    }

    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee.as_ref().map(|user| user.display_name.as_str())
    }
}

/// Returns the project part of a `<PROJECT>-<number>` key.
pub fn project_key_of(issue_key: &str) -> Option<&str> {
    ISSUE_KEY_REGEX
        .captures(issue_key)
        .and_then(|captures| captures.get(1))
        .map(|project| project.as_str())
}

pub fn is_issue_key(value: &str) -> bool {
    ISSUE_KEY_REGEX.is_match(value)
}
