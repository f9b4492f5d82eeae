use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Minimum HMAC key length for session cookies.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEV_SESSION_SECRET: &str = "servicehub-development-session-secret-not-for-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub session: SessionConfig,
    /// Seconds before the timeout layer aborts a request.
    pub request_timeout: u64,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub secret: String,
    pub ttl_hours: i64,
    pub cookie_name: String,
    pub login_page_url: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("login_page_url", &self.login_page_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let is_production = environment == "production";

        let secret = match lookup("SESSION_SECRET") {
            Some(secret) if secret.len() >= MIN_SESSION_SECRET_LEN => secret,
            Some(_) => anyhow::bail!(
                "SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            ),
            None if is_production => {
                anyhow::bail!("SESSION_SECRET environment variable is required in production")
            }
            None => DEV_SESSION_SECRET.to_string(),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 5000)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parse_or(&lookup, "MAX_CONNECTIONS", 20)?,
            session: SessionConfig {
                secret,
                ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", 168)?,
                cookie_name: lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "sid".to_string()),
                login_page_url: lookup("LOGIN_PAGE_URL").unwrap_or_else(|| "/login".to_string()),
            },
            request_timeout: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
