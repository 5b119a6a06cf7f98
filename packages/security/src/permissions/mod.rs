// ABOUTME: Granted permission lookup and verification
// ABOUTME: The verifier asks a permission source for the caller's grants on every check

pub mod client;
pub mod verifier;

pub use client::{GrantedPermissionsClient, GRANTED_PERMISSIONS_PATH};
pub use verifier::{PermissionSource, StaticPermissions, UserPermissionVerifier};

use serde::{Deserialize, Serialize};

/// A single permission granted to the current user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantedPermission {
    pub permission: String,
}

impl GrantedPermission {
    pub fn new(permission: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
        }
    }
}
