use thiserror::Error;

/// A failure reported by the Cluster Admin API.
///
/// The message is whatever the cluster client produced; it is shown to the
/// user as-is, so nothing in this crate rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ApiError {
    fn from(message: String) -> Self {
        ApiError { message }
    }
}

impl From<&str> for ApiError {
    fn from(message: &str) -> Self {
        ApiError::new(message)
    }
}
