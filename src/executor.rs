//! Applies recommended actions against the tracker.
//!
//! This is where tracker failures turn into data: `apply_action` never returns
//! an error, so a batch keeps going past a single failed update.

use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::{Action, ActionType};
use crate::tracker::IssueTracker;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub action: Action,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ActionResponse {
    pub fn succeeded(action: Action) -> Self {
        Self {
            action,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(action: Action, message: impl Into<String>) -> Self {
        Self {
            action,
            success: false,
            error_message: Some(message.into()),
        }
    }
}

pub struct ActionExecutor<'a> {
    tracker: &'a dyn IssueTracker,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(tracker: &'a dyn IssueTracker) -> Self {
        Self { tracker }
    }

    /// Only `AssignToVersion` touches the tracker; every other type succeeds as a no-op.
    pub async fn apply_action(&self, action: &Action) -> ActionResponse {
        if action.action_type != ActionType::AssignToVersion {
            debug!(
                "Nothing to apply for {} ({})",
                action.issue_key,
                action.action_type.as_str()
            );
            return ActionResponse::succeeded(action.clone());
        }

        let Some(release) = action.fix_version.as_ref() else {
            warn!("Assignment for {} has no fix version", action.issue_key);
            return ActionResponse::failed(action.clone(), "Action has no fix version");
        };

        match self.tracker.assign_release(&action.issue_key, release).await {
            Ok(()) => {
                info!("Assigned {} to {}", action.issue_key, release.name);
                ActionResponse::succeeded(action.clone())
            }
            Err(err) => {
                warn!(
                    "Failed to assign {} to {}: {}",
                    action.issue_key, release.name, err
                );
                ActionResponse::failed(action.clone(), err.to_string())
            }
        }
    }

    /// Applies actions in order, continuing past failures.
    pub async fn apply_all(&self, actions: &[Action]) -> Vec<ActionResponse> {
        let mut responses = Vec::with_capacity(actions.len());
        for action in actions {
            responses.push(self.apply_action(action).await);
        }
        responses
    }
}
