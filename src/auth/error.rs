use thiserror::Error;

use crate::error::CuratorError;

/// Failures produced by the session core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No refresh token or authorization code is stored. The authorize URL
    /// has been opened and the user must finish consent before retrying.
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the user has to complete the browser authorization flow.
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// Whether a caller may reasonably try again later without user input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidResponse(_) | Self::Network(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<AuthError> for CuratorError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Network(message) => CuratorError::Network(message),
            other => CuratorError::Authentication(other),
        }
    }
}
