use serde::Deserialize;

use super::issue::IssuePayload;

/// One page of a JQL search. Offset pages carry `startAt`/`total`; token pages
/// carry `nextPageToken`/`isLast`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<IssuePayload>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub is_last: Option<bool>,
}

impl SearchResponse {
    /// Offset of the next page, or `None` when this page was the last one.
    pub fn next_start(&self) -> Option<u32> {
        let fetched = self.start_at + self.issues.len() as u32;
        if self.issues.is_empty() || fetched >= self.total {
            None
        } else {
            Some(fetched)
        }
    }

    /// Token for the next page, or `None` when this page was the last one.
    pub fn next_token(&self) -> Option<&str> {
        if self.issues.is_empty() || self.is_last == Some(true) {
            None
        } else {
            self.next_page_token.as_deref()
        }
    }
}
