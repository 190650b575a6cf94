use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Work factors bcrypt accepts.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

// ---------------------------------------------------------------------------
// AdminSeed
// ---------------------------------------------------------------------------

/// Admin account created (or re-keyed) at startup.
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    /// Shared secret the sensor device sends as `api_key`.
    pub device_api_key: String,
    /// Present only when both `ADMIN_USERNAME` and `ADMIN_PASSWORD` are set.
    pub admin: Option<AdminSeed>,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("device_api_key", &"<redacted>")
            .field("admin", &self.admin)
            .field("session_ttl", &self.session_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let device_api_key = lookup("DEVICE_API_KEY")
            .context("missing required env var: DEVICE_API_KEY")?;
        if device_api_key.is_empty() {
            bail!("DEVICE_API_KEY must not be empty");
        }

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        let bcrypt_cost: u32 = optional("BCRYPT_COST", "12")
            .parse()
            .context("BCRYPT_COST must be an integer")?;
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        Ok(Self {
            database_url: optional("DATABASE_URL", "sqlite://aquarium.db"),
            device_api_key,
            admin,
            session_ttl: Duration::from_secs(
                optional("SESSION_TTL_SECS", "1209600")
                    .parse()
                    .context("SESSION_TTL_SECS must be a positive integer")?,
            ),
            bcrypt_cost,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}
