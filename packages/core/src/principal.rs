// ABOUTME: Identity of the caller on whose behalf an operation runs
// ABOUTME: Threaded explicitly through boundary, permission and audit calls

use std::fmt;

/// Identifier recorded when no authenticated caller is known.
pub const ANONYMOUS_USER_ID: &str = "anonymous";

/// The authenticated caller of a request.
///
/// Carries the user identifier used for audit stamping and diagnostics, and
/// the raw identity token so downstream services can be called on the
/// caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    token: Option<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: None,
        }
    }

    /// Principal used when a call is not backed by an authenticated identity.
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_USER_ID)
    }

    /// Attach the bearer token that authenticated this principal
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// User identifier, never empty: blank names resolve to [`ANONYMOUS_USER_ID`].
    pub fn name(&self) -> &str {
        if self.name.trim().is_empty() {
            ANONYMOUS_USER_ID
        } else {
            &self.name
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.name() == ANONYMOUS_USER_ID
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
