// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue consumer: a pool of workers feeding the policy engine.

use std::sync::Arc;
use std::time::Duration;

use smsgate_config::model::{ConsumerConfig, QueueConfig};
use smsgate_core::{QueueDelivery, SmsgateError, WorkItem, WorkQueue};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::policy::{DeliveryOutcome, PolicyEngine};

#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub workers: usize,
    /// Idle wait after an empty poll.
    pub poll_interval: Duration,
    /// Whether an exhausted item goes back on the queue.
    pub requeue_on_exhaustion: bool,
}

impl ConsumerSettings {
    pub fn from_config(consumer: &ConsumerConfig, queue: &QueueConfig) -> Self {
        Self {
            workers: consumer.workers,
            poll_interval: Duration::from_millis(queue.poll_interval_ms),
            requeue_on_exhaustion: consumer.requeue_on_exhaustion,
        }
    }
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self::from_config(&ConsumerConfig::default(), &QueueConfig::default())
    }
}

/// What to tell the queue about a handled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Requeue,
    Discard,
}

pub struct Consumer {
    queue: Arc<dyn WorkQueue>,
    engine: Arc<PolicyEngine>,
    settings: ConsumerSettings,
}

impl Consumer {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        engine: Arc<PolicyEngine>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            queue,
            engine,
            settings,
        }
    }

    /// Decides the fate of one delivery. Never fails: a payload that does not
    /// parse is discarded, since redelivery cannot fix it.
    pub async fn handle(&self, delivery: &QueueDelivery) -> Disposition {
        let item: WorkItem = match serde_json::from_str(&delivery.payload) {
            Ok(item) => item,
            Err(e) => {
                warn!(id = delivery.id, error = %e, "discarding malformed work item");
                return Disposition::Discard;
            }
        };

        debug!(
            id = delivery.id,
            tracking_id = %item.tracking_id,
            attempts = delivery.attempts,
            "processing work item"
        );

        match self.engine.process(&item).await {
            DeliveryOutcome::Sent { .. } | DeliveryOutcome::AlreadySettled(_) => Disposition::Ack,
            DeliveryOutcome::Exhausted if self.settings.requeue_on_exhaustion => {
                Disposition::Requeue
            }
            DeliveryOutcome::Exhausted => Disposition::Ack,
        }
    }

    /// Receives and handles at most one item. Returns whether one was found.
    pub async fn poll_once(&self) -> Result<bool, SmsgateError> {
        let Some(delivery) = self.queue.receive().await? else {
            return Ok(false);
        };

        match self.handle(&delivery).await {
            Disposition::Ack => self.queue.ack(delivery.id).await?,
            Disposition::Requeue => self.queue.nack(delivery.id, true).await?,
            Disposition::Discard => self.queue.nack(delivery.id, false).await?,
        }
        Ok(true)
    }

    /// Handles items until the queue is empty. Returns how many were handled.
    pub async fn drain(&self) -> Result<usize, SmsgateError> {
        let mut handled = 0;
        while self.poll_once().await? {
            handled += 1;
        }
        Ok(handled)
    }

    /// Runs the worker pool until `cancel` fires.
    ///
    /// A worker finishes the item it holds before observing cancellation.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let workers = self.settings.workers.max(1);
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let consumer = Arc::clone(&self);
            let cancel = cancel.clone();
            pool.spawn(async move { consumer.worker_loop(worker, cancel).await });
        }
        info!(
            workers,
            providers = ?self.engine.registry().names(),
            "consumer started"
        );

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "consumer worker terminated abnormally");
            }
        }
        info!("consumer stopped");
    }

    async fn worker_loop(&self, worker: usize, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            let busy = match self.poll_once().await {
                Ok(busy) => busy,
                Err(e) => {
                    warn!(worker, error = %e, "queue poll failed");
                    false
                }
            };
            if busy {
                continue;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
        debug!(worker, "consumer worker exiting");
    }
}
