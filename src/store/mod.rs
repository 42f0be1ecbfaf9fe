//! Pluggable storage for job status records.
//!
//! A status store is any backend that can hold string values under
//! string keys with a TTL. The tracker only ever needs three operations,
//! so that is the whole capability surface. Selection happens once at
//! process start from configuration.

pub mod memory;
pub mod mongo;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret as _;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use redis::RedisStore;

/// Key-value capability required to hold status records.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Write `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Read the value under `key`. `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<S> StatusStore for std::sync::Arc<S>
where
    S: StatusStore + ?Sized,
{
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }
}

/// Which concrete store backs the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Redis,
    Mongodb,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(BackendKind::Redis),
            "mongodb" => Ok(BackendKind::Mongodb),
            "memory" => Ok(BackendKind::Memory),
            other => Err(Error::Config(format!("unsupported datastore: {other}"))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendKind::Redis => "redis",
            BackendKind::Mongodb => "mongodb",
            BackendKind::Memory => "memory",
        };
        write!(f, "{s}")
    }
}

/// Connect the configured status store. The single process-wide
/// backend selection point.
pub async fn connect(config: &Config) -> Result<Box<dyn StatusStore>> {
    let store: Box<dyn StatusStore> = match config.datastore {
        BackendKind::Redis => {
            Box::new(RedisStore::connect(config.redis_url.expose_secret()).await?)
        }
        BackendKind::Mongodb => Box::new(
            MongoStore::connect(
                config.mongo_url.expose_secret(),
                &config.mongo_database,
                &config.mongo_collection,
            )
            .await?,
        ),
        BackendKind::Memory => Box::new(MemoryStore::new()),
    };

    info!(datastore = %config.datastore, "status store connected");
    Ok(store)
}
