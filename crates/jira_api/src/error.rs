//! Error model used by Jira API client operations.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Represents the failures a Jira API interaction can produce: HTTP errors with status and the message Jira returned, rejected credentials, timeouts, network issues, payload decoding problems and invalid client configuration.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("http {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl JiraError {
    /// Constructs an HTTP error variant.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        JiraError::Http {
            status,
            message: message.into(),
        }
    }

    /// Builds an HTTP error from a raw response body, preferring the messages
    /// Jira puts in `errorMessages` and `errors` over the raw text.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });
        JiraError::http(status, message)
    }

    /// Returns the HTTP status when the error came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            JiraError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for JiraError {
    /// Converts reqwest errors into semantic JiraError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JiraError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            JiraError::http(status, err.to_string())
        } else if err.is_connect() {
            JiraError::Network(err.to_string())
        } else if err.is_decode() {
            JiraError::Serialization(err.to_string())
        } else {
            JiraError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JiraError {
    fn from(err: serde_json::Error) -> Self {
        JiraError::Serialization(err.to_string())
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let mut messages: Vec<String> = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // field errors come back as an object keyed by field id
    if let Some(fields) = value.get("errors").and_then(Value::as_object) {
        for (field, message) in fields {
            if let Some(text) = message.as_str() {
                messages.push(format!("{field}: {text}"));
            }
        }
    }

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::JiraError;
    use reqwest::StatusCode;

    #[test]
    fn response_body_messages_are_joined() {
        let body = r#"{"errorMessages":["Issue does not exist"],"errors":{"fixVersions":"Version id '7' is not valid"}}"#;
        let err = JiraError::from_response_body(StatusCode::BAD_REQUEST, body);

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "http 400 Bad Request: Issue does not exist; fixVersions: Version id '7' is not valid"
        );
    }

    #[test]
    fn plain_text_body_is_kept_verbatim() {
        let err = JiraError::from_response_body(StatusCode::BAD_GATEWAY, "upstream unavailable\n");
        assert_eq!(err.to_string(), "http 502 Bad Gateway: upstream unavailable");
    }

    #[test]
    fn empty_body_falls_back_to_reason_phrase() {
        let err = JiraError::from_response_body(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "http 404 Not Found: Not Found");
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(JiraError::Configuration("missing host".into()).status(), None);
    }
}
