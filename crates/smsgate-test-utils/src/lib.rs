// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for smsgate integration tests.
//!
//! Provides a scripted provider and an in-process harness wiring the gateway
//! router, the SQLite store/queue/cache, and the consumer together over a
//! temp database.
//!
//! # Components
//!
//! - [`MockProvider`] - provider adapter that replays scripted outcomes
//! - [`TestHarness`] - full pipeline with request helpers

pub mod harness;
pub mod mock_provider;

pub use harness::{HttpReply, TestHarness, TestHarnessBuilder};
pub use mock_provider::{MockOutcome, MockProvider};
