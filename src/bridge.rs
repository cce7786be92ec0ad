//! Conversion helpers from Jira wire payloads into domain records.
//!
//! Everything the engine and renderer see passes through here, so missing or
//! malformed upstream fields are normalized once.

use jira_api::{IssuePayload, UserPayload, VersionPayload};

use crate::model::{Issue, IssueKind, Release, User};

const DEFAULT_STATUS: &str = "To Do";

pub fn convert_user(user: UserPayload) -> User {
    User {
        account_id: user.account_id,
        email: user.email_address.filter(|email| !email.trim().is_empty()),
        display_name: user.display_name,
        active: user.active,
        time_zone: user.time_zone,
    }
}

pub fn convert_release(version: VersionPayload) -> Release {
    let release_date = version.release_date();
    Release {
        id: version.id,
        name: version.name,
        description: version.description,
        release_date,
    }
}

/// Keeps only versions that are neither released nor archived.
pub fn convert_unreleased(versions: Vec<VersionPayload>) -> Vec<Release> {
    versions
        .into_iter()
        .filter(VersionPayload::is_unreleased)
        .map(convert_release)
        .collect()
}

/// Converts an issue; its kind comes from the issue type name.
pub fn convert_issue(issue: IssuePayload, start_date_field: &str) -> Issue {
    let kind = issue
        .issue_type_name()
        .map(IssueKind::from_type_name)
        .unwrap_or(IssueKind::Story);
    convert_issue_as(issue, kind, start_date_field)
}

/// Converts an issue whose kind is already known from the query that found it.
pub fn convert_issue_as(issue: IssuePayload, kind: IssueKind, start_date_field: &str) -> Issue {
    let project_key = issue.project_key();
    let status = issue
        .status_name()
        .unwrap_or(DEFAULT_STATUS)
        .to_string();
    let parent_key = issue.parent_key().map(str::to_string);
    let due_date = issue.due_date();
    let start_date = issue.date_field(start_date_field);

    let fields = issue.fields;
    Issue {
        kind,
        project_key,
        key: issue.key,
        summary: fields.summary.unwrap_or_default(),
        description: fields.description,
        status,
        assignee: fields.assignee.map(convert_user),
        fix_versions: fields.fix_versions.into_iter().map(convert_release).collect(),
        due_date,
        start_date,
        labels: fields.labels,
        parent_key,
    }
}

pub fn convert_issues(issues: Vec<IssuePayload>, start_date_field: &str) -> Vec<Issue> {
    issues
        .into_iter()
        .map(|issue| convert_issue(issue, start_date_field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{convert_issue, convert_issue_as, convert_unreleased};
    use crate::model::{IssueKind, Release, User};
    use chrono::NaiveDate;
    use jira_api::{IssuePayload, VersionPayload};
    use serde_json::json;

    const START_FIELD: &str = "customfield_10015";

    fn epic_payload() -> IssuePayload {
        serde_json::from_value(json!({
            "key": "PROJ-123",
            "fields": {
                "summary": "Test Epic",
                "description": "Epic description",
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Epic"},
                "assignee": {
                    "accountId": "user123",
                    "emailAddress": "john.doe@example.com",
                    "displayName": "John Doe",
                    "active": true
                },
                "fixVersions": [{
                    "id": "10000",
                    "name": "v1.0",
                    "description": "First Release",
                    "releaseDate": "2024-12-31"
                }],
                "duedate": "2024-12-31",
                "customfield_10015": "2024-09-01"
            }
        }))
        .expect("decode issue")
    }

    #[test]
    fn epic_fields_are_converted() {
        let epic = convert_issue(epic_payload(), START_FIELD);

        assert_eq!(epic.kind, IssueKind::Epic);
        assert_eq!(epic.project_key, "PROJ");
        assert_eq!(epic.key, "PROJ-123");
        assert_eq!(epic.summary, "Test Epic");
        assert_eq!(epic.description.as_deref(), Some("Epic description"));
        assert_eq!(epic.status, "In Progress");
        assert_eq!(
            epic.assignee,
            Some(User::new("user123", "John Doe").with_email("john.doe@example.com"))
        );
        assert_eq!(
            epic.fix_versions,
            vec![Release {
                id: "10000".into(),
                name: "v1.0".into(),
                description: Some("First Release".into()),
                release_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            }]
        );
        assert_eq!(epic.due_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(epic.start_date, NaiveDate::from_ymd_opt(2024, 9, 1));
    }

    #[test]
    fn sparse_story_gets_defaults() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "WEB-7",
            "fields": {"summary": null, "parent": {"key": "WEB-1"}}
        }))
        .expect("decode issue");

        let story = convert_issue(payload, START_FIELD);
        assert_eq!(story.kind, IssueKind::Story);
        assert_eq!(story.summary, "");
        assert_eq!(story.status, "To Do");
        assert_eq!(story.parent_key.as_deref(), Some("WEB-1"));
        assert!(story.assignee.is_none());
        assert!(story.fix_versions.is_empty());
        assert_eq!(story.due_date, None);
    }

    #[test]
    fn explicit_kind_overrides_issue_type() {
        let story = convert_issue_as(epic_payload(), IssueKind::Story, START_FIELD);
        assert_eq!(story.kind, IssueKind::Story);
    }

    #[test]
    fn blank_email_is_dropped() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "WEB-8",
            "fields": {"assignee": {"accountId": "a1", "displayName": "Ana", "emailAddress": ""}}
        }))
        .expect("decode issue");

        let story = convert_issue(payload, START_FIELD);
        assert_eq!(story.assignee.and_then(|user| user.email), None);
    }

    #[test]
    fn released_and_archived_versions_are_filtered() {
        let versions: Vec<VersionPayload> = serde_json::from_value(json!([
            {"id": "1", "name": "v1.0", "released": true, "releaseDate": "2024-01-01"},
            {"id": "2", "name": "v0.9", "archived": true},
            {"id": "3", "name": "v2.0", "releaseDate": "2099-06-30"}
        ]))
        .expect("decode versions");

        let releases = convert_unreleased(versions);
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].name, "v2.0");
        assert_eq!(releases[0].release_date, NaiveDate::from_ymd_opt(2099, 6, 30));
    }
}
