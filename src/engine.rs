//! Fix-version recommendation engine.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{Issue, Release};
use crate::policy::{Eligibility, EligibilityPolicy};

pub const REASON_HAS_FIX_VERSION: &str = "Issue already has a fix version";
pub const REASON_NO_DUE_DATE: &str = "No due date";
pub const REASON_NO_LATER_RELEASE: &str = "Due date later than all fix versions";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    NoAction,
    AssignToVersion,
    Comment,
    Ineligible,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::NoAction => "NO_ACTION",
            ActionType::AssignToVersion => "ASSIGN_TO_VERSION",
            ActionType::Comment => "COMMENT",
            ActionType::Ineligible => "INELIGIBLE",
        }
    }
}

/// What should happen to one issue. The issue is referenced by key only.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub action_type: ActionType,
    pub fix_version: Option<Release>,
    pub comment: Option<String>,
    pub issue_key: String,
    pub reason: Option<String>,
}

impl Action {
    pub fn no_action(issue: &Issue, reason: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::NoAction,
            fix_version: None,
            comment: None,
            issue_key: issue.key.clone(),
            reason: Some(reason.into()),
        }
    }

    pub fn assign(issue: &Issue, release: Release) -> Self {
        Self {
            action_type: ActionType::AssignToVersion,
            fix_version: Some(release),
            comment: None,
            issue_key: issue.key.clone(),
            reason: None,
        }
    }

    pub fn ineligible(issue: &Issue, candidate: Release, reason: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::Ineligible,
            fix_version: Some(candidate),
            comment: None,
            issue_key: issue.key.clone(),
            reason: Some(reason.into()),
        }
    }
}

/// Orders releases by date, then by id. Numeric ids compare numerically.
pub(crate) fn compare_releases(left: &Release, right: &Release) -> Ordering {
    left.release_date
        .cmp(&right.release_date)
        .then_with(|| compare_ids(&left.id, &right.id))
}

fn compare_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

/// Earliest scheduled release dated strictly after the issue's due date.
pub fn recommend_next_release_candidate<'a>(
    releases: &'a [Release],
    issue: &Issue,
) -> Option<&'a Release> {
    let due_date = issue.due_date?;
    releases
        .iter()
        .filter(|release| matches!(release.release_date, Some(date) if date > due_date))
        .min_by(|left, right| compare_releases(left, right))
}

/// Recommends fix versions for issues against one project's unreleased releases.
#[derive(Debug, Clone)]
pub struct FixVersionManager {
    releases: Vec<Release>,
    policy: EligibilityPolicy,
}

impl FixVersionManager {
    pub fn new(releases: Vec<Release>) -> Self {
        Self::with_policy(releases, EligibilityPolicy::default())
    }

    pub fn with_policy(releases: Vec<Release>, policy: EligibilityPolicy) -> Self {
        Self { releases, policy }
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn recommend_next_release_candidate(&self, issue: &Issue) -> Option<&Release> {
        recommend_next_release_candidate(&self.releases, issue)
    }

    pub fn is_issue_eligible(&self, issue: &Issue) -> Eligibility {
        self.policy.check(issue)
    }

    /// Decides the single action for `issue`. Rules are evaluated in order and the first match wins.
    pub fn get_recommended_action(&self, issue: &Issue) -> Action {
        if !issue.fix_versions.is_empty() {
            return Action::no_action(issue, REASON_HAS_FIX_VERSION);
        }

        if issue.due_date.is_none() {
            return Action::no_action(issue, REASON_NO_DUE_DATE);
        }

        let Some(candidate) = self.recommend_next_release_candidate(issue) else {
            return Action::no_action(issue, REASON_NO_LATER_RELEASE);
        };

        let eligibility = self.is_issue_eligible(issue);
        if !eligibility.eligible {
            let reason = eligibility.reason.unwrap_or_default();
            return Action::ineligible(issue, candidate.clone(), reason);
        }

        Action::assign(issue, candidate.clone())
    }
}
