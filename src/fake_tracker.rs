//! In-memory [`IssueTracker`] for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use jira_api::{JiraError, Result as JiraResult, StatusCode};

use crate::model::{Issue, Release};
use crate::tracker::IssueTracker;

pub const FAKE_SERVER_URL: &str = "https://acme.atlassian.net";

#[derive(Default)]
pub struct FakeTracker {
    pub releases: HashMap<String, Vec<Release>>,
    pub release_issues: HashMap<String, Vec<Issue>>,
    pub epics: Vec<Issue>,
    pub stories: HashMap<String, Vec<Issue>>,
    pub failing_keys: HashSet<String>,
    pub failing_projects: HashSet<String>,
    pub assignments: Mutex<Vec<(String, String)>>,
    pub comments: Mutex<Vec<(String, String)>>,
    pub labels: Mutex<Vec<(String, String)>>,
    pub release_fetches: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub fn with_releases(mut self, project_key: &str, releases: Vec<Release>) -> Self {
        self.releases.insert(project_key.to_string(), releases);
        self
    }

    pub fn with_release_issues(mut self, release_id: &str, issues: Vec<Issue>) -> Self {
        self.release_issues.insert(release_id.to_string(), issues);
        self
    }

    pub fn with_epic(mut self, epic: Issue, stories: Vec<Issue>) -> Self {
        self.stories.insert(epic.key.clone(), stories);
        self.epics.push(epic);
        self
    }

    pub fn failing_on(mut self, issue_key: &str) -> Self {
        self.failing_keys.insert(issue_key.to_string());
        self
    }

    pub fn failing_project(mut self, project_key: &str) -> Self {
        self.failing_projects.insert(project_key.to_string());
        self
    }

    pub fn assignments(&self) -> Vec<(String, String)> {
        self.assignments.lock().expect("assignments lock").clone()
    }

    pub fn labels(&self) -> Vec<(String, String)> {
        self.labels.lock().expect("labels lock").clone()
    }

    pub fn release_fetches(&self) -> Vec<String> {
        self.release_fetches.lock().expect("fetches lock").clone()
    }

    fn check(&self, issue_key: &str) -> JiraResult<()> {
        if self.failing_keys.contains(issue_key) {
            Err(JiraError::http(
                StatusCode::BAD_REQUEST,
                format!("Issue {issue_key} cannot be edited"),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    fn server_url(&self) -> &str {
        FAKE_SERVER_URL
    }

    async fn fetch_epics_by_label(&self, project_key: &str, label: &str) -> JiraResult<Vec<Issue>> {
        Ok(self
            .epics
            .iter()
            .filter(|epic| epic.project_key == project_key && epic.labels.iter().any(|l| l == label))
            .cloned()
            .collect())
    }

    async fn fetch_stories_by_epic(&self, epic_key: &str) -> JiraResult<Vec<Issue>> {
        Ok(self.stories.get(epic_key).cloned().unwrap_or_default())
    }

    async fn fetch_unreleased_releases(&self, project_key: &str) -> JiraResult<Vec<Release>> {
        self.release_fetches
            .lock()
            .expect("fetches lock")
            .push(project_key.to_string());
        if self.failing_projects.contains(project_key) {
            return Err(JiraError::Network(format!("cannot reach {project_key}")));
        }
        Ok(self.releases.get(project_key).cloned().unwrap_or_default())
    }

    async fn fetch_issues_for_release(&self, release: &Release) -> JiraResult<Vec<Issue>> {
        Ok(self
            .release_issues
            .get(&release.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_epic(&self, epic_key: &str) -> JiraResult<Issue> {
        self.epics
            .iter()
            .find(|epic| epic.key == epic_key)
            .cloned()
            .ok_or_else(|| JiraError::http(StatusCode::NOT_FOUND, "Issue does not exist"))
    }

    async fn assign_release(&self, issue_key: &str, release: &Release) -> JiraResult<()> {
        self.check(issue_key)?;
        self.assignments
            .lock()
            .expect("assignments lock")
            .push((issue_key.to_string(), release.id.clone()));
        Ok(())
    }

    async fn add_comment(&self, issue_key: &str, text: &str) -> JiraResult<()> {
        self.check(issue_key)?;
        self.comments
            .lock()
            .expect("comments lock")
            .push((issue_key.to_string(), text.to_string()));
        Ok(())
    }

    async fn add_label(&self, issue_key: &str, label: &str) -> JiraResult<()> {
        self.check(issue_key)?;
        let mut labels = self.labels.lock().expect("labels lock");
        let entry = (issue_key.to_string(), label.to_string());
        if !labels.contains(&entry) {
            labels.push(entry);
        }
        Ok(())
    }
}
