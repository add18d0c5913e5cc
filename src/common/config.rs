// src/common/config.rs
//! Process configuration, read once at startup and handed to `AppState`

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 2626;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
/// Ten years
const MAX_JWT_EXPIRATION_HOURS: i64 = 87_600;
const CALLBACK_PATH: &str = "/auth/google/callback";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {value}, {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// OAuth client identity registered with Google
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// PEM files for serving HTTPS directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google: GoogleOAuthConfig,
    pub frontend_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub static_dir: PathBuf,
    /// Set when the process terminates TLS itself
    pub tls: Option<TlsConfig>,
    /// Whether cookies carry the `Secure` attribute
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let frontend_url = required("FRONTEND_URL")?.trim_end_matches('/').to_string();

        let google = GoogleOAuthConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            redirect_url: format!("{}{}", frontend_url, CALLBACK_PATH),
        };

        let jwt_secret = required("JWT_SECRET")?;

        let raw_hours = required("JWT_EXPIRATION_IN_HOURS")?;
        let jwt_expiration_hours = match raw_hours.trim().parse::<i64>() {
            Ok(h) if h > 0 && h <= MAX_JWT_EXPIRATION_HOURS => h,
            Ok(h) if h > MAX_JWT_EXPIRATION_HOURS => {
                return Err(ConfigError::Invalid {
                    key: "JWT_EXPIRATION_IN_HOURS",
                    value: raw_hours,
                    reason: "it must not exceed 87600 hours",
                })
            }
            _ => {
                return Err(ConfigError::Invalid {
                    key: "JWT_EXPIRATION_IN_HOURS",
                    value: raw_hours,
                    reason: "it must be a positive integer",
                })
            }
        };

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&get)?,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: raw,
                reason: "it must be an integer",
            })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
                reason: "it must be a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "./static".to_string()));

        let tls = match (get("TLS_CERT_FILE"), get("TLS_KEY_FILE")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_file: PathBuf::from(cert),
                key_file: PathBuf::from(key),
            }),
            (Some(_), None) => return Err(ConfigError::Missing("TLS_KEY_FILE")),
            (None, Some(_)) => return Err(ConfigError::Missing("TLS_CERT_FILE")),
            (None, None) => None,
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                key: "COOKIE_SECURE",
                value: raw,
                reason: "it must be true or false",
            })?,
            None => tls.is_some() || frontend_url.starts_with("https://"),
        };

        Ok(Self {
            google,
            frontend_url,
            jwt_secret,
            jwt_expiration_hours,
            database_url,
            db_max_connections,
            port,
            static_dir,
            tls,
            cookie_secure,
        })
    }
}

fn database_url_from_parts<F>(get: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

    let host = required("DB_HOST")?;
    let raw_port = required("DB_PORT")?;
    let port = raw_port.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
        key: "DB_PORT",
        value: raw_port.clone(),
        reason: "it must be an integer",
    })?;
    let user = required("DB_USER")?;
    let password = required("DB_PASSWORD")?;
    let name = required("DB_NAME")?;
    let ssl_mode = required("DB_SSL_MODE")?;

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}?sslmode={}",
        urlencoding::encode(&user),
        urlencoding::encode(&password),
        host,
        port,
        name,
        ssl_mode
    ))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
