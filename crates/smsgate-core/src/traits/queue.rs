// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable work queue between the ingress gate and the consumer.

use async_trait::async_trait;

use crate::error::SmsgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::QueueDelivery;

/// At-least-once queue of serialized work items.
///
/// Items handed out by [`receive`](WorkQueue::receive) stay invisible to other
/// receivers until they are acked, nacked, or their lock lapses.
#[async_trait]
pub trait WorkQueue: PluginAdapter {
    /// Durably enqueues a payload. Returns the queue item id.
    async fn publish(&self, payload: &str) -> Result<i64, SmsgateError>;

    /// Takes the oldest available item, if any.
    async fn receive(&self) -> Result<Option<QueueDelivery>, SmsgateError>;

    /// Marks an item as done.
    async fn ack(&self, id: i64) -> Result<(), SmsgateError>;

    /// Gives an item back. With `requeue` it becomes available again until
    /// its attempt ceiling is reached; without it the item is discarded.
    async fn nack(&self, id: i64, requeue: bool) -> Result<(), SmsgateError>;
}
