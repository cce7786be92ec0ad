//! Release manifest: a CSV hand-off listing every issue in each project's next release.

use std::collections::BTreeMap;
use std::io;

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::engine::compare_releases;
use crate::error::{AppError, Result};
use crate::model::{Issue, Release};
use crate::tracker::IssueTracker;

pub const UNASSIGNED_PLACEHOLDER: &str = "<unassigned>";

pub const MANIFEST_HEADER: [&str; 9] = [
    "Project Timezone",
    "Assignee Name",
    "Assignee Email",
    "Issue Key",
    "Issue Summary",
    "Issue URL",
    "Fix Version",
    "Release Date",
    "Manager Email",
];

/// Per-project metadata the tracker does not hold.
#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    pub timezones: BTreeMap<String, String>,
    pub managers: BTreeMap<String, String>,
}

impl ProjectDirectory {
    pub fn timezone(&self, project_key: &str) -> &str {
        self.timezones.get(project_key).map(String::as_str).unwrap_or("")
    }

    pub fn manager(&self, project_key: &str) -> &str {
        self.managers.get(project_key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub project_timezone: String,
    pub assignee_name: String,
    pub assignee_email: String,
    pub issue_key: String,
    pub issue_summary: String,
    pub issue_url: String,
    pub fix_version: String,
    pub release_date: String,
    pub manager_email: String,
}

/// The soonest release dated strictly after `today`.
pub fn select_next_release(releases: &[Release], today: NaiveDate) -> Option<&Release> {
    releases
        .iter()
        .filter(|release| matches!(release.release_date, Some(date) if date > today))
        .min_by(|left, right| compare_releases(left, right))
}

/// Assigned issues first by case-insensitive assignee name, unassigned last, ties by key.
pub fn sort_for_manifest(issues: &mut [Issue]) {
    issues.sort_by_cached_key(|issue| {
        (
            issue.assignee.is_none(),
            issue
                .assignee_name()
                .map(str::to_lowercase)
                .unwrap_or_default(),
            issue.key.clone(),
        )
    });
}

pub struct ReleaseRenderer<'a> {
    tracker: &'a dyn IssueTracker,
    directory: &'a ProjectDirectory,
}

impl<'a> ReleaseRenderer<'a> {
    pub fn new(tracker: &'a dyn IssueTracker, directory: &'a ProjectDirectory) -> Self {
        Self { tracker, directory }
    }

    /// Renders the manifest for `project_keys` in the given order.
    pub async fn render_release_manifest(
        &self,
        project_keys: &[String],
        today: NaiveDate,
    ) -> Result<String> {
        let mut rows = Vec::new();
        for project_key in project_keys {
            rows.extend(self.manifest_rows_for_project(project_key, today).await?);
        }
        write_csv(&rows)
    }

    /// Rows for one project; empty when it has no release scheduled after `today`.
    pub async fn manifest_rows_for_project(
        &self,
        project_key: &str,
        today: NaiveDate,
    ) -> Result<Vec<ManifestRow>> {
        let releases = self.tracker.fetch_unreleased_releases(project_key).await?;
        let Some(next_release) = select_next_release(&releases, today) else {
            info!("Skipping {}: no unreleased version after {}", project_key, today);
            return Ok(Vec::new());
        };

        let mut issues = self.tracker.fetch_issues_for_release(next_release).await?;
        sort_for_manifest(&mut issues);
        info!(
            "Project {}: {} issues in {}",
            project_key,
            issues.len(),
            next_release.name
        );

        let timezone = self.directory.timezone(project_key);
        let manager = self.directory.manager(project_key);
        let release_date = next_release
            .release_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        Ok(issues
            .into_iter()
            .map(|issue| {
                let (assignee_name, assignee_email) = match issue.assignee {
                    Some(user) => (user.display_name, user.email.unwrap_or_default()),
                    None => (UNASSIGNED_PLACEHOLDER.to_string(), String::new()),
                };
                ManifestRow {
                    project_timezone: timezone.to_string(),
                    assignee_name,
                    assignee_email,
                    issue_url: self.tracker.browse_url(&issue.key),
                    issue_key: issue.key,
                    issue_summary: issue.summary,
                    fix_version: next_release.name.clone(),
                    release_date: release_date.clone(),
                    manager_email: manager.to_string(),
                }
            })
            .collect())
    }
}

/// Serializes rows under the fixed header. Fields are quoted only when needed.
pub fn write_csv(rows: &[ManifestRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(MANIFEST_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| AppError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}
