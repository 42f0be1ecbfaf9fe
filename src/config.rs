//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast on unsupported enum values.
//! Connection URLs wrapped in secrecy::SecretString to prevent log leaks.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};
use crate::queue::PayloadPolicy;
use crate::store::BackendKind;

#[derive(Debug)]
pub struct Config {
    /// Which backend holds job status records.
    pub datastore: BackendKind,
    pub redis_url: SecretString,
    pub mongo_url: SecretString,
    pub mongo_database: String,
    pub mongo_collection: String,
    /// Name of the shared work list.
    pub queue_name: String,
    /// Key prefix scoping status records to this tracker.
    pub namespace: String,
    /// Default TTL applied to every status record.
    pub status_ttl: Duration,
    pub payload_policy: PayloadPolicy,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// Every variable has a default; only malformed values fail.
    pub fn from_env() -> Result<Self> {
        let datastore: BackendKind = var_or("DATASTORE", "redis").parse()?;
        let payload_policy: PayloadPolicy = var_or("PAYLOAD_POLICY", "strict").parse()?;

        let ttl_secs: u64 = var_or("STATUS_TTL_SECS", "600")
            .parse()
            .map_err(|_| Error::Config("STATUS_TTL_SECS must be an integer".to_string()))?;

        Ok(Self {
            datastore,
            redis_url: SecretString::from(var_or("REDIS_URL", "redis://127.0.0.1:6379/0")),
            mongo_url: SecretString::from(var_or("MONGODB_URL", "mongodb://127.0.0.1:27017")),
            mongo_database: var_or("MONGODB_DATABASE", "conveyor"),
            mongo_collection: var_or("MONGODB_COLLECTION", "job_status"),
            queue_name: var_or("QUEUE_NAME", "work_queue"),
            namespace: var_or("STATUS_NAMESPACE", "STATUS"),
            status_ttl: Duration::from_secs(ttl_secs),
            payload_policy,
            log_level: var_or("LOG_LEVEL", "info"),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
