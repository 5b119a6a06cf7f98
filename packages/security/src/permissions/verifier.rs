// ABOUTME: Checks the current user's granted permissions before boundary operations run
// ABOUTME: Grants are fetched anew for every check; nothing is cached

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use cloudtrain_core::Principal;

use super::GrantedPermission;
use crate::error::{PermissionError, PermissionResult};

/// Where the verifier reads a principal's grants from
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn granted_permissions(
        &self,
        principal: &Principal,
    ) -> PermissionResult<Vec<GrantedPermission>>;
}

/// A fixed grant list handed to every principal
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    permissions: Vec<GrantedPermission>,
}

impl StaticPermissions {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(GrantedPermission::new).collect(),
        }
    }
}

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn granted_permissions(
        &self,
        _principal: &Principal,
    ) -> PermissionResult<Vec<GrantedPermission>> {
        Ok(self.permissions.clone())
    }
}

#[derive(Clone)]
pub struct UserPermissionVerifier {
    source: Arc<dyn PermissionSource>,
}

impl UserPermissionVerifier {
    pub fn new(source: Arc<dyn PermissionSource>) -> Self {
        Self { source }
    }

    pub async fn has_permission(
        &self,
        principal: &Principal,
        permission: &str,
    ) -> PermissionResult<bool> {
        let granted = self.source.granted_permissions(principal).await?;
        Ok(granted.iter().any(|p| p.permission == permission))
    }

    /// Fail with [`PermissionError::Denied`] unless the principal holds `permission`
    pub async fn require_permission(
        &self,
        principal: &Principal,
        permission: &str,
    ) -> PermissionResult<()> {
        if self.has_permission(principal, permission).await? {
            debug!("{} holds permission {}", principal.name(), permission);
            Ok(())
        } else {
            warn!(
                "Denied permission {} for user {}",
                permission,
                principal.name()
            );
            Err(PermissionError::Denied {
                permission: permission.to_string(),
                user: principal.name().to_string(),
            })
        }
    }
}
