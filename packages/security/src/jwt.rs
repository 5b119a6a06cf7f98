// ABOUTME: Identity token validation for incoming requests
// ABOUTME: Verifies HS256 bearer tokens and turns their claims into a Principal

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cloudtrain_core::Principal;

use crate::error::TokenError;

/// Claims read from an identity token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
}

impl IdentityClaims {
    pub fn new(subject: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            exp: (now + expires_in).timestamp(),
            iat: Some(now.timestamp()),
            iss: None,
            preferred_username: None,
        }
    }

    pub fn with_preferred_username(mut self, username: impl Into<String>) -> Self {
        self.preferred_username = Some(username.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// The user name shown in audit fields and error messages
    pub fn user_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.sub.as_str())
    }

    /// Sign these claims with an HS256 secret
    pub fn sign(&self, secret: &[u8]) -> Result<String, TokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

/// Validates bearer tokens signed with a shared HS256 secret
pub struct IdentityTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityTokenValidator {
    pub fn new(secret: &[u8], issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn decode(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Validate a raw token and build the acting principal, keeping the token
    /// for propagation to downstream services
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        let claims = self.decode(token)?;
        debug!("Validated identity token for {}", claims.user_name());
        Ok(Principal::new(claims.user_name()).with_token(token))
    }
}
