use crate::auth::password::HashCost;
use crate::auth::transport::is_valid_cookie_name;
use axum::http::HeaderValue;
use std::env;
use std::net::SocketAddr;

/// Minimum signing key length for HS256.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct Config {
    // Session signing key
    pub jwt_secret: String,

    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub cors_allowed_origin: Option<HeaderValue>,

    // Limits
    pub max_body_bytes: usize,

    // Session
    pub session_ttl_secs: u64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,

    // Password hashing cost
    pub password_hash_cost: HashCost,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("password_hash_cost", &self.password_hash_cost)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SECRET_BYTES),
            ));
        }

        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // No default: the operator must choose how long a session lives
        let session_ttl_secs: u64 = env::var("SESSION_TTL_SECS")
            .map_err(|_| ConfigError::MissingVar("SESSION_TTL_SECS".to_string()))?
            .parse()
            .map_err(|e| {
                ConfigError::ParseError("SESSION_TTL_SECS".to_string(), format!("{}", e))
            })?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let cors_allowed_origin = match env::var("CORS_ALLOWED_ORIGIN") {
            Ok(origin) if !origin.trim().is_empty() => Some(
                HeaderValue::from_str(origin.trim()).map_err(|e| {
                    ConfigError::InvalidValue("CORS_ALLOWED_ORIGIN".to_string(), e.to_string())
                })?,
            ),
            _ => None,
        };

        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;

        // Cookie
        let session_cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "token".to_string());
        if !is_valid_cookie_name(&session_cookie_name) {
            return Err(ConfigError::InvalidValue(
                "SESSION_COOKIE_NAME".to_string(),
                "may only contain ASCII alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }
        let cookie_secure = parse_env_or_default("COOKIE_SECURE", true)?;

        let defaults = HashCost::default();
        let password_hash_cost = HashCost {
            memory_kib: parse_env_or_default("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_env_or_default("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_env_or_default("PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };
        argon2::Params::new(
            password_hash_cost.memory_kib,
            password_hash_cost.iterations,
            password_hash_cost.parallelism,
            None,
        )
        .map_err(|e| ConfigError::InvalidValue("PASSWORD_HASH_*".to_string(), e.to_string()))?;

        Ok(Config {
            jwt_secret,
            redis_url,
            bind_addr,
            cors_allowed_origin,
            max_body_bytes,
            session_ttl_secs,
            session_cookie_name,
            cookie_secure,
            password_hash_cost,
        })
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
