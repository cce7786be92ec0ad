//! Epic-level planning: gathers an epic and its stories, asks the engine for
//! one action per issue and optionally applies the result.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::{Action, ActionType, FixVersionManager};
use crate::error::Result;
use crate::executor::{ActionExecutor, ActionResponse};
use crate::model::{Issue, IssueKind};
use crate::policy::{Eligibility, EligibilityPolicy};
use crate::tracker::IssueTracker;

/// One planned issue together with the reasoning behind its action.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub issue_key: String,
    pub kind: IssueKind,
    pub summary: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub eligibility: Eligibility,
    pub action: Action,
}

impl PlanEntry {
    fn evaluate(manager: &FixVersionManager, issue: &Issue) -> Self {
        Self {
            issue_key: issue.key.clone(),
            kind: issue.kind,
            summary: issue.summary.clone(),
            status: issue.status.clone(),
            due_date: issue.due_date,
            eligibility: manager.is_issue_eligible(issue),
            action: manager.get_recommended_action(issue),
        }
    }

    /// Single-line human summary, e.g. `PROJ-7 [Story] ASSIGN_TO_VERSION v2.0`.
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} [{}] {}",
            self.issue_key,
            self.kind.as_str(),
            self.action.action_type.as_str()
        );
        if let Some(release) = &self.action.fix_version {
            line.push(' ');
            line.push_str(&release.name);
        }
        if let Some(reason) = &self.action.reason {
            line.push_str(&format!(" ({reason})"));
        }
        line
    }
}

/// Plans every epic followed by its stories. Releases are fetched once per epic project.
pub async fn plan_epics(
    tracker: &dyn IssueTracker,
    epics: Vec<Issue>,
    policy: &EligibilityPolicy,
) -> Result<Vec<PlanEntry>> {
    let mut managers: HashMap<String, FixVersionManager> = HashMap::new();
    let mut entries = Vec::new();

    for epic in epics {
        let stories = tracker.fetch_stories_by_epic(&epic.key).await?;
        debug!("{} has {} stories", epic.key, stories.len());

        let manager = match managers.entry(epic.project_key.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let releases = tracker.fetch_unreleased_releases(slot.key()).await?;
                slot.insert(FixVersionManager::with_policy(releases, policy.clone()))
            }
        };

        entries.push(PlanEntry::evaluate(manager, &epic));
        entries.extend(
            stories
                .iter()
                .map(|story| PlanEntry::evaluate(manager, story)),
        );
    }

    Ok(entries)
}

/// Applies every planned action in order. With `mark_label`, issues assigned
/// successfully are also labelled; a labelling failure marks the response failed.
pub async fn apply_plan(
    tracker: &dyn IssueTracker,
    entries: &[PlanEntry],
    mark_label: Option<&str>,
) -> Vec<ActionResponse> {
    let executor = ActionExecutor::new(tracker);
    let mut responses = Vec::with_capacity(entries.len());

    for entry in entries {
        let mut response = executor.apply_action(&entry.action).await;
        let assigned = response.success && entry.action.action_type == ActionType::AssignToVersion;

        if let (true, Some(label)) = (assigned, mark_label) {
            match tracker.add_label(&entry.issue_key, label).await {
                Ok(()) => info!("Labelled {} with {}", entry.issue_key, label),
                Err(err) => {
                    warn!("Failed to label {}: {}", entry.issue_key, err);
                    response = ActionResponse::failed(
                        entry.action.clone(),
                        format!("assigned, but adding label {label} failed: {err}"),
                    );
                }
            }
        }
        responses.push(response);
    }

    responses
}

#[cfg(test)]
mod tests {
    use super::{apply_plan, plan_epics};
    use crate::engine::ActionType;
    use crate::fake_tracker::FakeTracker;
    use crate::model::{Issue, IssueKind, Release};
    use crate::policy::EligibilityPolicy;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn releases() -> Vec<Release> {
        vec![
            Release::new("10001", "v2.0", Some(date(2024, 6, 30))),
            Release::new("10002", "v3.0", Some(date(2024, 9, 30))),
        ]
    }

    fn tracker() -> FakeTracker {
        let mut epic = Issue::epic("PROJ-1", "Checkout revamp").with_due_date(date(2024, 6, 1));
        epic.labels = vec!["q2".into()];
        let stories = vec![
            Issue::story("PROJ-2", "Build cart")
                .with_status("In Progress")
                .with_due_date(date(2024, 7, 15)),
            Issue::story("PROJ-3", "Spike: payments")
                .with_status("In Progress")
                .with_due_date(date(2024, 6, 10)),
            Issue::story("PROJ-4", "Write docs"),
        ];
        FakeTracker::default()
            .with_releases("PROJ", releases())
            .with_epic(epic, stories)
    }

    #[tokio::test]
    async fn epic_comes_first_then_its_stories() {
        let tracker = tracker();
        let epics = vec![tracker.epics[0].clone()];

        let plan = plan_epics(&tracker, epics, &EligibilityPolicy::default())
            .await
            .expect("plan");

        let summary: Vec<(&str, ActionType)> = plan
            .iter()
            .map(|entry| (entry.issue_key.as_str(), entry.action.action_type))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("PROJ-1", ActionType::AssignToVersion),
                ("PROJ-2", ActionType::AssignToVersion),
                ("PROJ-3", ActionType::Ineligible),
                ("PROJ-4", ActionType::NoAction),
            ]
        );
        assert_eq!(plan[1].describe(), "PROJ-2 [Story] ASSIGN_TO_VERSION v3.0");
        assert_eq!(plan[3].describe(), "PROJ-4 [Story] NO_ACTION (No due date)");
        assert!(plan[0].eligibility.eligible);
        assert_eq!(plan[0].kind, IssueKind::Epic);
        let json = serde_json::to_value(&plan[1]).expect("serialize entry");
        assert_eq!(json["kind"], "story");
        assert_eq!(json["action"]["action_type"], "ASSIGN_TO_VERSION");
        assert_eq!(tracker.release_fetches(), vec!["PROJ"]);
    }

    #[tokio::test]
    async fn apply_labels_only_successful_assignments() {
        let tracker = tracker().failing_on("PROJ-2");
        let epics = vec![tracker.epics[0].clone()];
        let plan = plan_epics(&tracker, epics, &EligibilityPolicy::default())
            .await
            .expect("plan");

        let responses = apply_plan(&tracker, &plan, Some("release-planned")).await;

        let outcomes: Vec<bool> = responses.iter().map(|response| response.success).collect();
        assert_eq!(outcomes, vec![true, false, true, true]);
        assert_eq!(
            tracker.assignments(),
            vec![("PROJ-1".to_string(), "10001".to_string())]
        );
        assert_eq!(
            tracker.labels(),
            vec![("PROJ-1".to_string(), "release-planned".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_releases_for_project_propagate_as_error() {
        let tracker = tracker().failing_project("PROJ");
        let epics = vec![tracker.epics[0].clone()];

        let result = plan_epics(&tracker, epics, &EligibilityPolicy::default()).await;

        assert!(result.is_err());
    }
}
