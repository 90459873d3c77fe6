// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for SMS transmission backends.

use async_trait::async_trait;

use crate::error::SmsgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutboundSms, ProviderRef};

/// Adapter for an external SMS transmission service.
///
/// The adapter's [`PluginAdapter::name`] is the name work items use in
/// their provider hints and the name recorded on the message once sent.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Submits one message for transmission.
    ///
    /// Returns the provider's reference for the accepted message. Any error
    /// means the provider did not accept it and the next candidate is tried.
    async fn send(&self, sms: &OutboundSms) -> Result<ProviderRef, SmsgateError>;
}
