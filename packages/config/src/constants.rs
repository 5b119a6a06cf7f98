// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across CloudTrain

// Server Configuration
pub const CLOUDTRAIN_API_PORT: &str = "CLOUDTRAIN_API_PORT";
pub const CLOUDTRAIN_API_HOST: &str = "CLOUDTRAIN_API_HOST";
pub const PORT: &str = "PORT"; // Legacy

// CORS Configuration
pub const CLOUDTRAIN_CORS_ORIGIN: &str = "CLOUDTRAIN_CORS_ORIGIN";

// Database Configuration
pub const CLOUDTRAIN_DATABASE_URL: &str = "CLOUDTRAIN_DATABASE_URL";
pub const CLOUDTRAIN_DB_MAX_CONNECTIONS: &str = "CLOUDTRAIN_DB_MAX_CONNECTIONS";

// Granted Permissions Service
pub const CLOUDTRAIN_GRANTED_PERMISSIONS_URL: &str = "CLOUDTRAIN_GRANTED_PERMISSIONS_URL";
pub const CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS: &str = "CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS";
pub const CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS: &str = "CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS";

// Identity Tokens
pub const CLOUDTRAIN_JWT_SECRET: &str = "CLOUDTRAIN_JWT_SECRET";
pub const CLOUDTRAIN_JWT_ISSUER: &str = "CLOUDTRAIN_JWT_ISSUER";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
