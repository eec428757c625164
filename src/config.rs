use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How repeated add-to-cart calls for the same product are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartLinePolicy {
    /// Every call inserts a new cart line.
    #[default]
    Append,
    /// An existing line for the same product has its quantity increased.
    Merge,
}

impl FromStr for CartLinePolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "append" => Ok(CartLinePolicy::Append),
            "merge" => Ok(CartLinePolicy::Merge),
            other => anyhow::bail!("CART_LINE_POLICY must be 'append' or 'merge', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub checkout_lock_timeout_ms: u64,
    pub cart_line_policy: CartLinePolicy,
    pub cors_allowed_origins: AllowedOrigins,
    pub log_request_body: bool,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let checkout_lock_timeout_ms = parse_lock_timeout_ms(&or_default("CHECKOUT_LOCK_TIMEOUT_MS", "5000"))?;

        Ok(Config {
            server_port: or_default("SERVER_PORT", "3000")
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: or_default("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            jwt_secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_ttl_secs: or_default("JWT_TTL_SECS", "3600")
                .parse()
                .context("JWT_TTL_SECS must be an integer")?,
            checkout_lock_timeout_ms,
            cart_line_policy: or_default("CART_LINE_POLICY", "append").parse()?,
            cors_allowed_origins: parse_allowed_origins(&or_default("CORS_ALLOWED_ORIGINS", "*"))?,
            log_request_body: or_default("LOG_REQUEST_BODY", "false")
                .parse()
                .unwrap_or(false),
            log_json: or_default("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        })
    }

    pub fn checkout_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.checkout_lock_timeout_ms)
    }
}

/// Postgres treats `lock_timeout = 0` as "wait forever" and rejects values
/// above `i32::MAX`, so both ends are refused here.
fn parse_lock_timeout_ms(raw: &str) -> anyhow::Result<u64> {
    let ms: u64 = raw
        .trim()
        .parse()
        .context("CHECKOUT_LOCK_TIMEOUT_MS must be an integer")?;

    if ms == 0 || ms > i32::MAX as u64 {
        anyhow::bail!(
            "CHECKOUT_LOCK_TIMEOUT_MS must be between 1 and {}, got {}",
            i32::MAX,
            ms
        );
    }

    Ok(ms)
}

fn parse_allowed_origins(raw: &str) -> anyhow::Result<AllowedOrigins> {
    let value = raw.trim();
    if value == "*" {
        return Ok(AllowedOrigins::Any);
    }

    let origins = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        anyhow::bail!("CORS_ALLOWED_ORIGINS must be '*' or a comma-separated list of origins");
    }

    Ok(AllowedOrigins::List(origins))
}
