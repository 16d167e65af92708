//! Process configuration read from the environment.

use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub nats_url: Option<String>,
}

impl Config {
    /// Loads `.env` (if present) and reads the service settings.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let port = parse_or(&lookup, "PORT", 8083)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;
        let acquire_secs: u64 = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;
        let nats_url = lookup("NATS_URL").filter(|url| !url.trim().is_empty());
        Ok(Self {
            database_url,
            port,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
            nats_url,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
