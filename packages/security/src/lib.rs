// ABOUTME: Authentication and authorization for CloudTrain
// ABOUTME: Validates identity tokens and checks granted permissions against an external service

pub mod error;
pub mod jwt;
pub mod permissions;

pub use error::{PermissionError, PermissionResult, TokenError};
pub use jwt::{IdentityClaims, IdentityTokenValidator};
pub use permissions::{
    GrantedPermission, GrantedPermissionsClient, PermissionSource, StaticPermissions,
    UserPermissionVerifier, GRANTED_PERMISSIONS_PATH,
};
