use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::admin::errors::ApiError;

/// The category an [`AdminError`] belongs to, for rendering user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    Persistence,
    Operation,
}

/// Central error enum for the admin core.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Malformed or incomplete profile / filter input. Raised before any I/O.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Opening or verifying a session failed.
    #[error("cannot connect using profile '{profile_id}': {reason}")]
    Connection { profile_id: String, reason: String },

    /// Reading or writing the profile file failed.
    #[error("profile store {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The Admin API rejected a resource operation.
    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },

    /// Another connect or disconnect is still running.
    #[error("a connect or disconnect is already in progress")]
    Busy,

    #[error("not connected to a cluster")]
    NotConnected,
}

impl AdminError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AdminError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(profile_id: impl Into<String>, cause: &ApiError) -> Self {
        AdminError::Connection {
            profile_id: profile_id.into(),
            reason: cause.message().to_string(),
        }
    }

    pub fn operation(operation: &'static str, cause: ApiError) -> Self {
        AdminError::Operation {
            operation,
            message: cause.message().to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AdminError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Validation { .. } => ErrorKind::Validation,
            AdminError::Connection { .. } | AdminError::Busy => ErrorKind::Connection,
            AdminError::Persistence { .. } => ErrorKind::Persistence,
            AdminError::Operation { .. } | AdminError::NotConnected => ErrorKind::Operation,
        }
    }
}
