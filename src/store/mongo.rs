//! MongoDB status store.
//!
//! One document per key, upserted on `_id`. Mongo has no per-document
//! TTL of its own here, so every write stamps an `expires_at` deadline
//! and reads enforce it lazily: a `get` that finds an expired document
//! deletes it and reports a miss. Documents that are never read again
//! stay until their key is next touched — there is no background sweep.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use super::StatusStore;
use crate::error::Result;

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    #[serde(rename = "_id")]
    key: String,
    value: String,
    /// Unix epoch milliseconds after which this document is dead.
    expires_at: i64,
}

/// Status store backed by a MongoDB collection.
pub struct MongoStore {
    collection: Collection<StoredValue>,
}

impl MongoStore {
    /// Connect to MongoDB and bind to one collection.
    pub async fn connect(url: &str, database: &str, collection: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(url).await?;
        let collection = client.database(database).collection(collection);
        Ok(Self { collection })
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl StatusStore for MongoStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let stored = StoredValue {
            key: key.to_string(),
            value: value.to_string(),
            expires_at: now_ms() + ttl.as_millis() as i64,
        };
        self.collection
            .replace_one(doc! { "_id": key }, &stored)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let found = self.collection.find_one(doc! { "_id": key }).await?;
        match found {
            Some(stored) if stored.expires_at <= now_ms() => {
                self.collection.delete_one(doc! { "_id": key }).await?;
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(())
    }
}
