//! # oxide-link-sqlite
//!
//! SQLite driver for `oxide-link`. [`SqliteGateway`] implements the blocking
//! `Gateway` contract on top of an sqlx connection pool and a private
//! current-thread tokio runtime.
//!
//! ```ignore
//! use oxide_link_sqlite::{SqliteConfig, SqliteGateway};
//!
//! let gateway = SqliteGateway::connect(&SqliteConfig::from_env()?)?;
//! gateway.execute_script("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)")?;
//! let gateway = gateway.into_shared();
//!
//! let mut alice = User::create(&gateway)?;
//! alice.set("name", "Alice")?;
//! alice.save()?;
//! ```

mod config;
mod gateway;

pub use config::{SqliteConfig, DATABASE_URL_VAR, MAX_CONNECTIONS_VAR};
pub use gateway::SqliteGateway;
