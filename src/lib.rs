//! Release automation for Jira projects.
//!
//! Recommends and applies fix versions for epics and stories based on due
//! dates and an eligibility policy, and renders per-release manifests as CSV.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod model;
pub mod planner;
pub mod policy;
pub mod secrets;
pub mod tracker;

#[cfg(test)]
mod fake_tracker;

pub use engine::{recommend_next_release_candidate, Action, ActionType, FixVersionManager};
pub use error::{AppError, Result};
pub use executor::{ActionExecutor, ActionResponse};
pub use manifest::ReleaseRenderer;
pub use model::{Issue, IssueKind, Release, User};
pub use policy::{Eligibility, EligibilityPolicy};
pub use tracker::{IssueTracker, JiraTracker};
