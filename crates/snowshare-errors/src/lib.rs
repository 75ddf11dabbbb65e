//! Error taxonomy for snowshare
//!
//! Fatal errors are modeled as `ProvisionError`; benign remote conflicts
//! ("already exists" style responses) are a classification, not an error,
//! and are absorbed by the reconciler before they can surface.

use thiserror::Error;

/// Result type alias using ProvisionError
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Fatal error taxonomy for a provisioning run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProvisionError {
    /// Missing or invalid configuration field; raised before any remote call
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Could not establish an administrative session
    #[error("Failed to connect to '{target}': {reason}")]
    Connection { target: String, reason: String },

    /// A remote statement failed for a non-benign reason
    #[error("Statement failed in step '{step}': {message}")]
    Statement { step: String, message: String },

    /// Mail delivery failed; callers log this and continue
    #[error("Notification delivery failed: {reason}")]
    Notification { reason: String },
}

impl ProvisionError {
    /// Create a Config error
    pub fn config(reason: impl Into<String>) -> Self {
        ProvisionError::Config {
            reason: reason.into(),
        }
    }

    /// Create a Connection error with the target identity embedded
    pub fn connection(target: impl Into<String>, reason: impl Into<String>) -> Self {
        ProvisionError::Connection {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a Statement error carrying the step name
    pub fn statement(step: impl Into<String>, message: impl Into<String>) -> Self {
        ProvisionError::Statement {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Re-label a Statement error with the logical step that issued it
    ///
    /// The transport only knows the statement text; phases use this to
    /// attach the pipeline step name. Other variants pass through.
    pub fn with_step(self, step: impl Into<String>) -> Self {
        match self {
            ProvisionError::Statement { message, .. } => ProvisionError::Statement {
                step: step.into(),
                message,
            },
            other => other,
        }
    }

    /// The remote error message, when this is a Statement error
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ProvisionError::Statement { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Benign conflict conditions recognized in remote error messages
///
/// This is the closed set of conditions the reconciler converts into
/// idempotent no-ops. Snowflake reports them only in message text, so the
/// matching is on message fragments, centralized here:
///
/// - `AlreadyExists`: message contains "already exists" (CREATE of an
///   object that is already present)
/// - `AlreadyAttached`: message contains "cannot be added to this share"
///   (ALTER SHARE ADD ACCOUNTS for an account already on the share)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyExists,
    AlreadyAttached,
}

/// Classify a remote error message as a benign conflict, if it is one
pub fn classify_conflict(message: &str) -> Option<ConflictKind> {
    if message.contains("already exists") {
        Some(ConflictKind::AlreadyExists)
    } else if message.contains("cannot be added to this share") {
        Some(ConflictKind::AlreadyAttached)
    } else {
        None
    }
}
