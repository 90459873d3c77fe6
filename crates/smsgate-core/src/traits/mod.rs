// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the delivery pipeline's pluggable seams.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod provider;
pub mod queue;
pub mod store;

pub use adapter::PluginAdapter;
pub use cache::ExpiringCache;
pub use provider::ProviderAdapter;
pub use queue::WorkQueue;
pub use store::MessageStore;
