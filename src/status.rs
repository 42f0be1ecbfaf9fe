//! Job status tracking.
//!
//! A status record is an ephemeral, TTL-bound note about one request:
//! created QUEUED, updated zero or more times while work is in flight,
//! finished with exactly one terminal status, and consumed (deleted) by
//! the poll that observes the terminal status. Records live in any
//! [`StatusStore`] under `"{namespace}::{request_id}"` keys, so multiple
//! trackers can share one backend without collision.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::Result;
use crate::store::StatusStore;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a tracked job.
///
/// Open set: `Success` and `Fail` are terminal, `Queued` is the initial
/// status, and any other string a caller records is an in-progress marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Queued,
    Success,
    Fail,
    /// Caller-defined in-progress value (e.g. "RUNNING", "UPLOADING").
    InProgress(String),
}

impl Status {
    /// Terminal statuses are consumed by the poll that observes them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Fail)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "QUEUED" => Status::Queued,
            "SUCCESS" => Status::Success,
            "FAIL" => Status::Fail,
            _ => Status::InProgress(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::from(s.to_string())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Queued => write!(f, "QUEUED"),
            Status::Success => write!(f, "SUCCESS"),
            Status::Fail => write!(f, "FAIL"),
            Status::InProgress(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Status Record
// ---------------------------------------------------------------------------

/// One job's tracked state, serialized as JSON in the status store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub request_id: String,
    pub status: Status,
    /// Human-readable note, set only by updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Tracks job status records in a pluggable store.
///
/// Owns every record under its namespace. No locking — concurrent
/// updates for the same id race last-write-wins.
pub struct JobTracker {
    store: Box<dyn StatusStore>,
    namespace: String,
    ttl: Duration,
}

impl JobTracker {
    pub fn new(store: Box<dyn StatusStore>, namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            ttl,
        }
    }

    /// Register a new job as QUEUED and return its request id.
    ///
    /// Generates a random UUID when the caller does not supply an id.
    pub async fn add_job(&self, request_id: Option<&str>) -> Result<String> {
        let request_id = match request_id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let record = StatusRecord {
            request_id: request_id.clone(),
            status: Status::Queued,
            message: None,
            updated_at: Utc::now(),
        };
        self.write(&record).await?;

        Ok(request_id)
    }

    /// Read a job's status record. `None` if missing or expired.
    ///
    /// A record that fails to deserialize is deleted and reported
    /// absent, so one garbled write cannot wedge a request id for the
    /// rest of its TTL.
    pub async fn get_status(&self, request_id: &str) -> Result<Option<StatusRecord>> {
        let key = self.key(request_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                error!(request_id, %e, "corrupt status record, deleting");
                self.store.delete(&key).await?;
                Ok(None)
            }
        }
    }

    /// Update a job's status (and message, when given), refreshing the TTL.
    ///
    /// A missing record makes this a silent no-op — an update never
    /// resurrects a job that already expired or was consumed.
    pub async fn update_status(
        &self,
        request_id: &str,
        status: Status,
        message: Option<&str>,
    ) -> Result<()> {
        let Some(mut record) = self.get_status(request_id).await? else {
            debug!(request_id, "update for unknown job ignored");
            return Ok(());
        };

        record.status = status;
        if let Some(message) = message {
            record.message = Some(message.to_string());
        }
        record.updated_at = Utc::now();

        self.write(&record).await
    }

    /// Read a job's status; a terminal status consumes the record.
    ///
    /// Poll-until-terminal is a consume-once protocol: the poll that
    /// sees SUCCESS or FAIL deletes the record, and the next poll for
    /// the same id reads absent.
    pub async fn poll_status(&self, request_id: &str) -> Result<Option<StatusRecord>> {
        let Some(record) = self.get_status(request_id).await? else {
            return Ok(None);
        };

        if record.status.is_terminal() {
            self.store.delete(&self.key(request_id)).await?;
        }

        Ok(Some(record))
    }

    async fn write(&self, record: &StatusRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.store
            .set(&self.key(&record.request_id), &raw, self.ttl)
            .await
    }

    fn key(&self, request_id: &str) -> String {
        format!("{}::{}", self.namespace, request_id)
    }
}
