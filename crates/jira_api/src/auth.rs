//! Credential encoding for Jira Cloud basic authentication.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// Builds the `Authorization` header value for an account email and API token.
pub fn basic_auth_value(username: &str, api_token: &str) -> String {
    let encoded = BASE64_STANDARD.encode(format!("{}:{}", username, api_token));
    format!("Basic {}", encoded)
}
