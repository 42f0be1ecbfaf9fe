//! Worker harness: block on the queue, dispatch to caller logic.
//!
//! One harness is one logical worker. Horizontal scaling is running more
//! harnesses against the same queue — the store's atomic pop is the only
//! coordination they need.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};

use crate::error::Result;
use crate::queue::{Payload, WorkQueue};

/// A long-running dequeue-and-dispatch loop.
///
/// Errors from the caller's handler are caught, logged, and never stop
/// the loop; an error from the dequeue itself (store unreachable) does.
#[derive(Clone)]
pub struct Worker {
    queue: WorkQueue,
    shutdown: Arc<Notify>,
}

impl Worker {
    pub fn new(queue: WorkQueue) -> Self {
        Self {
            queue,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the run loop to stop after its current item.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run until shutdown or a dequeue failure.
    ///
    /// Each dequeued item is passed to `handler` exactly once. The
    /// handler's return value is only logged — failure isolation lives
    /// at this one boundary, not inside the queue or the handler.
    pub async fn run<F, Fut, E>(&self, mut handler: F) -> Result<()>
    where
        F: FnMut(Payload) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>>,
        E: std::fmt::Display,
    {
        info!(queue = %self.queue.name(), "worker started");

        loop {
            let payload = tokio::select! {
                _ = self.shutdown.notified() => {
                    info!(queue = %self.queue.name(), "worker shutting down");
                    return Ok(());
                }
                dequeued = self.queue.dequeue_work(std::time::Duration::ZERO) => {
                    match dequeued? {
                        Some(payload) => payload,
                        // Indefinite block returned empty — re-arm
                        None => continue,
                    }
                }
            };

            if let Err(e) = handler(payload).await {
                error!(queue = %self.queue.name(), %e, "work item processing failed");
            }
        }
    }
}
