//! Connection settings for the SQLite gateway.

use std::env;

use oxide_link::{OrmError, Result};
use serde::Deserialize;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "OXIDE_LINK_MAX_CONNECTIONS";

/// Settings used by [`SqliteGateway::connect`](crate::SqliteGateway::connect).
///
/// Missing keys fall back to [`SqliteConfig::default`], an in-memory
/// database behind a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// sqlx connection URL, e.g. `sqlite://app.db` or `sqlite::memory:`.
    pub url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

impl SqliteConfig {
    /// Creates a config for `url` with a single connection.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Builds a config from `DATABASE_URL` and `OXIDE_LINK_MAX_CONNECTIONS`,
    /// keeping defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.url = url;
        }
        if let Some(raw) = lookup(MAX_CONNECTIONS_VAR) {
            config.max_connections = raw.trim().parse().map_err(|_| {
                OrmError::configuration(format!(
                    "{MAX_CONNECTIONS_VAR} must be a positive integer, got {raw:?}"
                ))
            })?;
        }
        config.check()?;
        Ok(config)
    }

    /// Rejects settings the pool cannot work with.
    pub fn check(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(OrmError::configuration("database url is empty"));
        }
        if self.max_connections == 0 {
            return Err(OrmError::configuration(
                "max_connections must be at least 1",
            ));
        }
        Ok(())
    }
}
