mod entity;
mod issue;
mod search;
mod user;
mod version;

pub use entity::{parse_jira_date, NamedEntity};
pub use issue::{IssueFields, IssuePayload};
pub use search::SearchResponse;
pub use user::UserPayload;
pub use version::VersionPayload;
