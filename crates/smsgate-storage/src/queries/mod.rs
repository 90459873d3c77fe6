// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over a [`Database`](crate::Database).

pub mod cache;
pub mod messages;
pub mod queue;
