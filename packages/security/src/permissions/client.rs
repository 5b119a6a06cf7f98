// ABOUTME: HTTP client for the external granted permissions service
// ABOUTME: Propagates the caller's bearer token and returns the caller's grant list

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use cloudtrain_core::Principal;

use super::verifier::PermissionSource;
use super::GrantedPermission;
use crate::error::{PermissionError, PermissionResult};

pub const GRANTED_PERMISSIONS_PATH: &str = "api/v1/grantedPermissions";

#[derive(Clone)]
pub struct GrantedPermissionsClient {
    http_client: Client,
    base_url: String,
}

impl GrantedPermissionsClient {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> PermissionResult<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| PermissionError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, GRANTED_PERMISSIONS_PATH)
    }

    /// Fetch every permission granted to the given principal
    pub async fn get_granted_permissions(
        &self,
        principal: &Principal,
    ) -> PermissionResult<Vec<GrantedPermission>> {
        let url = self.url();
        debug!("Fetching granted permissions for {}", principal.name());

        let mut request = self.http_client.get(&url);
        if let Some(token) = principal.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PermissionError::Service(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<GrantedPermission>>()
                .await
                .map_err(|e| PermissionError::Service(format!("invalid response: {}", e))),
            status => {
                warn!(
                    "Granted permissions service returned {} for {}",
                    status,
                    principal.name()
                );
                Err(PermissionError::Service(format!(
                    "{} returned {}",
                    url, status
                )))
            }
        }
    }
}

#[async_trait]
impl PermissionSource for GrantedPermissionsClient {
    async fn granted_permissions(
        &self,
        principal: &Principal,
    ) -> PermissionResult<Vec<GrantedPermission>> {
        self.get_granted_permissions(principal).await
    }
}
