// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the message store, work queue, and expiring cache traits.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use smsgate_config::model::{QueueConfig, StorageConfig};
use smsgate_core::{
    AdapterType, DeliveryReportOutcome, ExpiringCache, HealthStatus, Message, MessageStore,
    NewMessage, PluginAdapter, ProcessingClaim, QueueDelivery, SmsgateError, WorkQueue,
};

use crate::database::{checkpoint, map_tr_err, Database};
use crate::queries;

/// Queue parameters fixed for the lifetime of a storage handle.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub name: String,
    pub max_attempts: u32,
    pub lock_timeout_secs: u64,
}

impl From<&QueueConfig> for QueueSettings {
    fn from(config: &QueueConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_attempts: config.max_attempts,
            lock_timeout_secs: config.lock_timeout_secs,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self::from(&QueueConfig::default())
    }
}

/// SQLite-backed storage adapter.
///
/// One database holds message records, the work queue, and cache entries,
/// so the gateway and the consumer can run as separate processes over the
/// same file.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
    queue: QueueSettings,
}

impl SqliteStorage {
    /// Open the configured database and run migrations.
    pub async fn open(storage: &StorageConfig, queue: &QueueConfig) -> Result<Self, SmsgateError> {
        let db = Database::open_with(&storage.database_path, storage.wal_mode).await?;
        debug!(path = %storage.database_path, queue = %queue.name, "SQLite storage initialized");
        Ok(Self::with_database(db, QueueSettings::from(queue)))
    }

    /// Wrap an already-open database.
    pub fn with_database(db: Database, queue: QueueSettings) -> Self {
        Self { db, queue }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of items waiting in this handle's queue.
    pub async fn queue_depth(&self) -> Result<i64, SmsgateError> {
        queries::queue::pending_count(&self.db, &self.queue.name).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, SmsgateError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SmsgateError> {
        checkpoint(&self.db).await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn create_message(&self, message: &NewMessage) -> Result<(), SmsgateError> {
        if !queries::messages::insert_message(&self.db, message).await? {
            debug!(tracking_id = %message.tracking_id, "message record already exists");
        }
        Ok(())
    }

    async fn get_message(&self, tracking_id: &str) -> Result<Option<Message>, SmsgateError> {
        queries::messages::get_message(&self.db, tracking_id).await
    }

    async fn begin_processing(&self, tracking_id: &str) -> Result<ProcessingClaim, SmsgateError> {
        queries::messages::claim_for_processing(&self.db, tracking_id).await
    }

    async fn mark_sent(
        &self,
        tracking_id: &str,
        provider: &str,
        provider_ref: &str,
    ) -> Result<bool, SmsgateError> {
        queries::messages::mark_sent(&self.db, tracking_id, provider, provider_ref).await
    }

    async fn mark_failed(&self, tracking_id: &str) -> Result<bool, SmsgateError> {
        queries::messages::mark_failed(&self.db, tracking_id).await
    }

    async fn append_event(&self, tracking_id: &str, event: &str) -> Result<(), SmsgateError> {
        queries::messages::append_event(&self.db, tracking_id, event).await
    }

    async fn apply_delivery_report(
        &self,
        provider: &str,
        provider_ref: &str,
        status: &str,
    ) -> Result<DeliveryReportOutcome, SmsgateError> {
        queries::messages::apply_delivery_report(&self.db, provider, provider_ref, status).await
    }
}

#[async_trait]
impl WorkQueue for SqliteStorage {
    async fn publish(&self, payload: &str) -> Result<i64, SmsgateError> {
        queries::queue::enqueue(&self.db, &self.queue.name, payload, self.queue.max_attempts)
            .await
            .map_err(|e| SmsgateError::PublishFailure {
                source: Box::new(e),
            })
    }

    async fn receive(&self) -> Result<Option<QueueDelivery>, SmsgateError> {
        let entry = queries::queue::dequeue(&self.db, &self.queue.name, self.queue.lock_timeout_secs)
            .await
            .map_err(|e| SmsgateError::Queue {
                message: "dequeue failed".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(entry.map(|e| QueueDelivery {
            id: e.id,
            payload: e.payload,
            attempts: e.attempts,
        }))
    }

    async fn ack(&self, id: i64) -> Result<(), SmsgateError> {
        queries::queue::ack(&self.db, id).await
    }

    async fn nack(&self, id: i64, requeue: bool) -> Result<(), SmsgateError> {
        if !requeue {
            return queries::queue::discard(&self.db, id).await;
        }
        if !queries::queue::fail(&self.db, id).await? {
            tracing::warn!(id, max_attempts = self.queue.max_attempts, "queue item reached its attempt ceiling");
        }
        Ok(())
    }
}

#[async_trait]
impl ExpiringCache for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, SmsgateError> {
        queries::cache::get(&self.db, key).await.map_err(cache_err)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SmsgateError> {
        queries::cache::set_if_absent(&self.db, key, value, ttl)
            .await
            .map_err(cache_err)
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, SmsgateError> {
        queries::cache::increment(&self.db, key, ttl)
            .await
            .map_err(cache_err)
    }

    async fn purge_expired(&self) -> Result<u64, SmsgateError> {
        queries::cache::purge_expired(&self.db).await.map_err(cache_err)
    }
}

fn cache_err(e: SmsgateError) -> SmsgateError {
    SmsgateError::Cache {
        message: "sqlite cache operation failed".to_string(),
        source: Some(Box::new(e)),
    }
}
