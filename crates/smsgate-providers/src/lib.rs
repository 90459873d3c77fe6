// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS transmission provider adapters.
//!
//! Implements [`ProviderAdapter`](smsgate_core::ProviderAdapter) for HTTP
//! SMS APIs and an in-process simulator, and collects configured adapters
//! into an ordered [`ProviderRegistry`].

pub mod http;
pub mod registry;
pub mod simulated;

pub use http::HttpProvider;
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use simulated::SimulatedProvider;
