//! # conveyor
//!
//! Distributed work queue and job status tracking over a shared store.
//!
//! Producers enqueue JSON work items onto a named Redis list and mint a
//! tracked request id; workers block on the list and dispatch items to
//! caller-supplied logic; producers poll the status tracker until a
//! terminal status appears or the record's TTL expires. Status records
//! live in a pluggable key-value store (Redis, MongoDB, or in-process).

pub mod config;
pub mod error;
pub mod queue;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use queue::{Payload, PayloadPolicy, WorkQueue};
pub use status::{JobTracker, Status, StatusRecord};
pub use worker::Worker;
