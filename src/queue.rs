//! Distributed work queue over a shared Redis list.
//!
//! Producers append serialized work items at the tail (RPUSH); consumers
//! atomically remove the head (BLPOP). The store's atomic pop is the only
//! coordination between workers — there is no client-side locking, and
//! strict FIFO holds per named list across all producers and consumers.
//!
//! A blocking dequeue occupies the underlying connection until it
//! returns, so a producer should hold its own `WorkQueue` handle rather
//! than sharing one with a blocked consumer.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Payload policy
// ---------------------------------------------------------------------------

/// How strictly enqueue validates work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadPolicy {
    /// Items must be JSON objects; anything else is rejected.
    #[default]
    Strict,
    /// Like Strict, but a string item is first parsed as an embedded
    /// JSON document. An unparseable string (or a non-object parse
    /// result) is rejected.
    Repair,
    /// No type check; any JSON value passes through unchanged.
    Lenient,
}

impl std::str::FromStr for PayloadPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(PayloadPolicy::Strict),
            "repair" => Ok(PayloadPolicy::Repair),
            "lenient" => Ok(PayloadPolicy::Lenient),
            other => Err(Error::Config(format!("unsupported payload policy: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A dequeued work item.
///
/// The queue never discards a successfully dequeued item over a format
/// problem — an undecodable payload only loses its structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The item deserialized back to structured form.
    Document(Value),
    /// The item as dequeued; it was not valid JSON.
    Raw(String),
}

impl Payload {
    /// The structured form, if this payload has one.
    pub fn as_document(&self) -> Option<&Value> {
        match self {
            Payload::Document(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Handle to one named work list in Redis.
#[derive(Clone)]
pub struct WorkQueue {
    conn: ConnectionManager,
    queue_name: String,
    policy: PayloadPolicy,
}

impl WorkQueue {
    /// Connect to Redis and bind to one named list.
    pub async fn connect(
        url: &str,
        queue_name: impl Into<String>,
        policy: PayloadPolicy,
    ) -> Result<Self> {
        let queue_name = queue_name.into();
        info!(queue = %queue_name, "connecting to work queue");
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            queue_name,
            policy,
        })
    }

    pub fn name(&self) -> &str {
        &self.queue_name
    }

    /// One-time advisory check that the queue key exists in the store.
    ///
    /// Scans the keyspace for the configured name and warns when absent.
    /// An absent key is normal for a queue that is empty or not yet
    /// written to, so this never fails construction or blocks anything.
    pub async fn check_queue_presence(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut found = false;

        let mut keys: redis::AsyncIter<'_, String> = conn.scan_match(&self.queue_name).await?;
        while let Some(key) = keys.next_item().await {
            if key == self.queue_name {
                found = true;
            }
        }

        if !found {
            warn!(queue = %self.queue_name, "queue key not present in store");
        }
        Ok(found)
    }

    /// Append a work item at the tail of the queue.
    ///
    /// Validation depends on the queue's [`PayloadPolicy`]; a rejected
    /// item is an [`Error::InvalidPayload`] and nothing is written.
    pub async fn enqueue_work(&self, item: &Value) -> Result<()> {
        let wire = normalize_payload(self.policy, item)?;
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(&self.queue_name, wire).await?;
        Ok(())
    }

    /// Block up to `timeout` waiting to atomically remove the head item.
    ///
    /// `Duration::ZERO` blocks indefinitely. Returns `None` when the
    /// timeout expires with nothing dequeued.
    pub async fn dequeue_work(&self, timeout: Duration) -> Result<Option<Payload>> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> = conn
            .blpop(&self.queue_name, timeout.as_secs_f64())
            .await?;

        let Some((_, raw)) = reply else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(Payload::Document(value))),
            Err(e) => {
                warn!(queue = %self.queue_name, %e, "undecodable work item, returning raw");
                Ok(Some(Payload::Raw(raw)))
            }
        }
    }
}

/// Apply the payload policy and serialize an item for the wire.
fn normalize_payload(policy: PayloadPolicy, item: &Value) -> Result<String> {
    match policy {
        PayloadPolicy::Strict => {
            if item.is_object() {
                Ok(item.to_string())
            } else {
                Err(Error::InvalidPayload(
                    "work item must be a JSON object".to_string(),
                ))
            }
        }
        PayloadPolicy::Repair => {
            if item.is_object() {
                return Ok(item.to_string());
            }
            let Value::String(s) = item else {
                return Err(Error::InvalidPayload(
                    "work item must be a JSON object".to_string(),
                ));
            };
            match serde_json::from_str::<Value>(s) {
                Ok(parsed) if parsed.is_object() => Ok(parsed.to_string()),
                _ => Err(Error::InvalidPayload(
                    "string item does not contain a JSON document".to_string(),
                )),
            }
        }
        PayloadPolicy::Lenient => Ok(item.to_string()),
    }
}
