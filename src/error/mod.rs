//! Error types for Curator.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all Curator operations.
#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(AuthError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CuratorError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the user must finish authorizing in the browser before retrying.
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Self::Authentication(auth) if auth.requires_user_action())
    }
}

impl From<reqwest::Error> for CuratorError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<toml::de::Error> for CuratorError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CuratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_helper_builds_variant() {
        let err = CuratorError::api(404, "no device");
        assert_eq!(err.to_string(), "API error (status 404): no device");
    }

    #[test]
    fn only_missing_credentials_require_user_action() {
        assert!(!CuratorError::api(401, "expired").requires_user_action());
        assert!(CuratorError::Authentication(AuthError::NotAuthenticated).requires_user_action());
        assert!(!CuratorError::Configuration("missing".into()).requires_user_action());
    }
}
