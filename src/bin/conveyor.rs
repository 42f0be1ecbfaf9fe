//! conveyor CLI — demo producer, worker, and status operations.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use conveyor::config::Config;
use conveyor::queue::{Payload, WorkQueue};
use conveyor::status::{JobTracker, Status};
use conveyor::telemetry::init_logging;
use conveyor::worker::Worker;
use secrecy::ExposeSecret;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "conveyor", about = "Distributed work queue and job status tracking")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a demo worker that consumes the queue and records job status
    Serve,
    /// Enqueue a JSON work item
    Enqueue {
        /// The work item as a JSON document
        json: String,
        /// Also register a status record and stamp its id into the item
        #[arg(long)]
        track: bool,
    },
    /// Job status operations
    Job {
        #[command(subcommand)]
        action: JobAction,
    },
}

#[derive(Subcommand)]
enum JobAction {
    /// Register a job as QUEUED
    Add {
        /// Request id (generated when omitted)
        id: Option<String>,
    },
    /// Record a status for a job
    Update {
        id: String,
        /// New status (QUEUED, SUCCESS, FAIL, or any in-progress value)
        status: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Poll a job's status (a terminal status is consumed by this read)
    Poll { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve => cmd_serve(config).await,
        Command::Enqueue { json, track } => cmd_enqueue(config, json, track).await,
        Command::Job { action } => {
            let store = conveyor::store::connect(&config).await?;
            let tracker = JobTracker::new(store, &config.namespace, config.status_ttl);

            match action {
                JobAction::Add { id } => {
                    let id = tracker.add_job(id.as_deref()).await?;
                    println!("{id}");
                    Ok(())
                }
                JobAction::Update {
                    id,
                    status,
                    message,
                } => {
                    tracker
                        .update_status(&id, Status::from(status.as_str()), message.as_deref())
                        .await?;
                    Ok(())
                }
                JobAction::Poll { id } => {
                    match tracker.poll_status(&id).await? {
                        Some(record) => {
                            println!("{}", serde_json::to_string_pretty(&record)?);
                        }
                        None => println!("absent"),
                    }
                    Ok(())
                }
            }
        }
    }
}

async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    init_logging(&config.log_level)?;

    let queue = WorkQueue::connect(
        config.redis_url.expose_secret(),
        &config.queue_name,
        config.payload_policy,
    )
    .await?;
    queue.check_queue_presence().await?;

    let store = conveyor::store::connect(&config).await?;
    let tracker = Arc::new(JobTracker::new(store, &config.namespace, config.status_ttl));

    let worker = Worker::new(queue);

    let w = worker.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        w.shutdown();
    });

    worker
        .run(move |payload| {
            let tracker = Arc::clone(&tracker);
            async move { process_item(&tracker, payload).await }
        })
        .await?;

    Ok(())
}

/// Demo processing logic: log the item, mark its job done when tracked.
async fn process_item(tracker: &JobTracker, payload: Payload) -> conveyor::Result<()> {
    match payload {
        Payload::Document(doc) => {
            info!(item = %doc, "processing work item");
            if let Some(id) = doc.get("request_id").and_then(|v| v.as_str()) {
                tracker
                    .update_status(id, Status::Success, Some("processed"))
                    .await?;
            }
            Ok(())
        }
        Payload::Raw(raw) => {
            warn!(%raw, "work item arrived unstructured, skipping");
            Ok(())
        }
    }
}

async fn cmd_enqueue(config: Config, json: String, track: bool) -> anyhow::Result<()> {
    let mut item: serde_json::Value = serde_json::from_str(&json)?;

    let queue = WorkQueue::connect(
        config.redis_url.expose_secret(),
        &config.queue_name,
        config.payload_policy,
    )
    .await?;

    if track {
        let store = conveyor::store::connect(&config).await?;
        let tracker = JobTracker::new(store, &config.namespace, config.status_ttl);
        let id = tracker.add_job(None).await?;
        if let Some(map) = item.as_object_mut() {
            map.insert("request_id".to_string(), serde_json::json!(id));
        }
        queue.enqueue_work(&item).await?;
        println!("{id}");
    } else {
        queue.enqueue_work(&item).await?;
        println!("enqueued to {}", queue.name());
    }

    Ok(())
}
