// ABOUTME: Server configuration loaded from the environment
// ABOUTME: Parses ports, database, permission service and token settings into typed values

use std::env;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

use cloudtrain_config::{
    CLOUDTRAIN_API_HOST, CLOUDTRAIN_API_PORT, CLOUDTRAIN_CORS_ORIGIN, CLOUDTRAIN_DATABASE_URL,
    CLOUDTRAIN_DB_MAX_CONNECTIONS, CLOUDTRAIN_GRANTED_PERMISSIONS_URL,
    CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS, CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS,
    CLOUDTRAIN_JWT_ISSUER, CLOUDTRAIN_JWT_SECRET, PORT,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: IpAddr,
    pub cors_origin: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub granted_permissions_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub http_request_timeout: Duration,
    pub http_connect_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port_str = non_empty(CLOUDTRAIN_API_PORT)
            .or_else(|| non_empty(PORT))
            .unwrap_or_else(|| "8080".to_string());
        let port = port_str.trim().parse::<u16>()?;

        // Validate port is in valid range
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host_str = non_empty(CLOUDTRAIN_API_HOST).unwrap_or_else(|| "127.0.0.1".to_string());
        let host = host_str
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let cors_origin =
            non_empty(CLOUDTRAIN_CORS_ORIGIN).unwrap_or_else(|| "http://localhost:4200".to_string());

        let database_url =
            non_empty(CLOUDTRAIN_DATABASE_URL).unwrap_or_else(|| "sqlite:cloudtrain.db".to_string());

        let db_max_connections = parse_number(
            CLOUDTRAIN_DB_MAX_CONNECTIONS,
            non_empty(CLOUDTRAIN_DB_MAX_CONNECTIONS),
            10,
        )?;

        let http_request_timeout = Duration::from_secs(parse_number(
            CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS,
            non_empty(CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS),
            30,
        )?);
        let http_connect_timeout = Duration::from_secs(parse_number(
            CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS,
            non_empty(CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS),
            10,
        )?);

        Ok(Config {
            port,
            host,
            cors_origin,
            database_url,
            db_max_connections,
            granted_permissions_url: non_empty(CLOUDTRAIN_GRANTED_PERMISSIONS_URL),
            jwt_secret: non_empty(CLOUDTRAIN_JWT_SECRET),
            jwt_issuer: non_empty(CLOUDTRAIN_JWT_ISSUER),
            http_request_timeout,
            http_connect_timeout,
        })
    }

    pub fn granted_permissions_url(&self) -> Result<&str, ConfigError> {
        self.granted_permissions_url
            .as_deref()
            .ok_or(ConfigError::Missing(CLOUDTRAIN_GRANTED_PERMISSIONS_URL))
    }

    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        self.jwt_secret
            .as_deref()
            .ok_or(ConfigError::Missing(CLOUDTRAIN_JWT_SECRET))
    }
}

fn parse_number<N>(name: &'static str, value: Option<String>, default: N) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialOrd + Default,
{
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().parse::<N>() {
        Ok(parsed) if parsed > N::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.cors_origin, "http://localhost:4200");
        assert_eq!(config.database_url, "sqlite:cloudtrain.db");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.http_request_timeout, Duration::from_secs(30));
        assert_eq!(config.http_connect_timeout, Duration::from_secs(10));
        assert!(matches!(
            config.jwt_secret(),
            Err(ConfigError::Missing(CLOUDTRAIN_JWT_SECRET))
        ));
        assert!(matches!(
            config.granted_permissions_url(),
            Err(ConfigError::Missing(CLOUDTRAIN_GRANTED_PERMISSIONS_URL))
        ));
    }

    #[test]
    fn test_explicit_values() {
        let config = config_from(&[
            (CLOUDTRAIN_API_PORT, "9000"),
            (CLOUDTRAIN_API_HOST, "0.0.0.0"),
            (CLOUDTRAIN_DB_MAX_CONNECTIONS, "4"),
            (CLOUDTRAIN_GRANTED_PERMISSIONS_URL, "http://perms:8080"),
            (CLOUDTRAIN_JWT_SECRET, "secret"),
            (CLOUDTRAIN_JWT_ISSUER, "https://idp"),
            (CLOUDTRAIN_HTTP_REQUEST_TIMEOUT_SECS, "5"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.granted_permissions_url().unwrap(), "http://perms:8080");
        assert_eq!(config.jwt_secret().unwrap(), "secret");
        assert_eq!(config.jwt_issuer.as_deref(), Some("https://idp"));
        assert_eq!(config.http_request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_legacy_port_variable() {
        let config = config_from(&[(PORT, "4001")]).unwrap();
        assert_eq!(config.port, 4001);

        let config = config_from(&[(PORT, "4001"), (CLOUDTRAIN_API_PORT, "4002")]).unwrap();
        assert_eq!(config.port, 4002);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[(CLOUDTRAIN_API_PORT, "0")]),
            Err(ConfigError::PortOutOfRange(0))
        ));
        assert!(matches!(
            config_from(&[(CLOUDTRAIN_API_PORT, "http")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[(CLOUDTRAIN_API_HOST, "localhost:80")]),
            Err(ConfigError::InvalidHost(_))
        ));
        assert!(matches!(
            config_from(&[(CLOUDTRAIN_DB_MAX_CONNECTIONS, "0")]),
            Err(ConfigError::InvalidValue {
                name: CLOUDTRAIN_DB_MAX_CONNECTIONS,
                ..
            })
        ));
        assert!(matches!(
            config_from(&[(CLOUDTRAIN_HTTP_CONNECT_TIMEOUT_SECS, "soon")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
