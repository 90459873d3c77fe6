// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery side of the pipeline.
//!
//! The [`Consumer`] pulls work items off the queue and hands each one to the
//! [`PolicyEngine`], which walks the candidate providers in order until one
//! accepts, recording every transition on the message.

pub mod consumer;
pub mod policy;

pub use consumer::{Consumer, ConsumerSettings, Disposition};
pub use policy::{DeliveryOutcome, PolicyEngine};

#[cfg(test)]
pub(crate) mod testing;
