//! API token storage in the OS keyring.
//!
//! Only consulted when neither the environment nor the settings file carries
//! a token.

use keyring::{Entry, Error as KeyringError};
use log::debug;

use crate::error::{AppError, Result};

const KEYRING_SERVICE: &str = "jira-manager";

/// Jira API tokens kept in the OS keyring, one entry per Jira username.
#[derive(Debug, Clone)]
pub struct TokenStore {
    service: String,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }
}

impl TokenStore {
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn save_token(&self, username: &str, token: &str) -> Result<()> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AppError::Keyring("API token must not be empty".into()));
        }
        self.entry(username)?
            .set_password(trimmed)
            .map_err(|err| AppError::Keyring(format!("Failed to store token in keyring: {err}")))
    }

    /// Returns `None` when nothing is stored for `username`.
    pub fn load_token(&self, username: &str) -> Result<Option<String>> {
        match self.entry(username)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(KeyringError::NoEntry) => {
                debug!("No keyring token stored for {username}");
                Ok(None)
            }
            Err(err) => Err(AppError::Keyring(format!(
                "Failed to read token from keyring: {err}"
            ))),
        }
    }

    pub fn clear_token(&self, username: &str) -> Result<()> {
        match self.entry(username)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(err) => Err(AppError::Keyring(format!(
                "Failed to delete token from keyring: {err}"
            ))),
        }
    }

    fn entry(&self, username: &str) -> Result<Entry> {
        let account = username.trim();
        if account.is_empty() {
            return Err(AppError::Configuration(
                "A Jira username is required to access the keyring".into(),
            ));
        }
        Entry::new(&self.service, account)
            .map_err(|err| AppError::Keyring(format!("Failed to open keyring entry: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::TokenStore;
    use crate::error::AppError;

    #[test]
    fn empty_token_is_rejected_before_touching_keyring() {
        let err = TokenStore::default()
            .save_token("bot@acme.io", "   ")
            .unwrap_err();
        assert!(matches!(err, AppError::Keyring(message) if message.contains("must not be empty")));
    }

    #[test]
    fn blank_username_is_a_configuration_error() {
        let err = TokenStore::with_service("jira-manager-tests")
            .load_token(" ")
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
