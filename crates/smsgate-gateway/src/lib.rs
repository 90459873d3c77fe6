// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for smsgate.
//!
//! Accepts send requests through the [`IngressGate`], serves message status,
//! and applies delivery reports posted back by providers.

pub mod auth;
pub mod delivery;
pub mod error;
pub mod handlers;
pub mod ingress;
pub mod server;

pub use auth::{ClientDirectory, WebhookAuth};
pub use error::ApiError;
pub use ingress::{Admission, IngressGate, SendRequest};
pub use server::{build_router, start_server, GatewayState, HealthState};
