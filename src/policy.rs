//! Eligibility policy: which stories may have a release assigned automatically.
//!
//! The status and keyword lists are data loaded from the settings file so they
//! can be tuned without a rebuild.

use serde::{Deserialize, Serialize};

use crate::model::Issue;

pub const EPIC_REASON: &str = "Issue is an Epic";

fn default_ineligible_statuses() -> Vec<String> {
    ["Won't Fix", "Duplicate", "Wontfix"]
        .iter()
        .map(|status| status.to_string())
        .collect()
}

fn default_ineligible_keywords() -> Vec<String> {
    [
        "spike",
        "investigation",
        "research",
        "design",
        "1-pager",
        "one pager",
    ]
    .iter()
    .map(|keyword| keyword.to_string())
    .collect()
}

/// Outcome of an eligibility check. `reason` may be set on an eligible result
/// as an informational note (epics).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: Option<String>,
}

impl Eligibility {
    pub fn eligible() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    pub fn eligible_because(reason: impl Into<String>) -> Self {
        Self {
            eligible: true,
            reason: Some(reason.into()),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EligibilityPolicy {
    pub ineligible_statuses: Vec<String>,
    pub ineligible_keywords: Vec<String>,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            ineligible_statuses: default_ineligible_statuses(),
            ineligible_keywords: default_ineligible_keywords(),
        }
    }
}

impl EligibilityPolicy {
    /// Epics are always eligible. Stories are rejected by status first, then by
    /// summary keyword; both comparisons ignore case.
    pub fn check(&self, issue: &Issue) -> Eligibility {
        if issue.is_epic() {
            return Eligibility::eligible_because(EPIC_REASON);
        }

        let status = issue.status.to_lowercase();
        if self
            .ineligible_statuses
            .iter()
            .any(|candidate| candidate.to_lowercase() == status)
        {
            return Eligibility::rejected(format!("Status is {}", issue.status));
        }

        let summary = issue.summary.to_lowercase();
        if self
            .ineligible_keywords
            .iter()
            .map(|keyword| keyword.to_lowercase())
            .any(|keyword| !keyword.is_empty() && summary.contains(&keyword))
        {
            return Eligibility::rejected(format!(
                "Summary contains ineligible keyword: {}",
                issue.summary
            ));
        }

        Eligibility::eligible()
    }
}
