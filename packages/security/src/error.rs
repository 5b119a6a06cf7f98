// ABOUTME: Error types for token validation and permission checks
// ABOUTME: Denials carry the permission and user; service faults stay distinct from denials

use thiserror::Error;

/// Identity token errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Missing identity token")]
    Missing,

    #[error("Identity token has expired")]
    Expired,

    #[error("Invalid identity token: {0}")]
    Invalid(String),
}

/// Permission check errors
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("missing required permission [{permission}] for user [{user}]")]
    Denied { permission: String, user: String },

    #[error("Permission service error: {0}")]
    Service(String),

    #[error("Permission client configuration error: {0}")]
    Configuration(String),
}

pub type PermissionResult<T> = Result<T, PermissionError>;
