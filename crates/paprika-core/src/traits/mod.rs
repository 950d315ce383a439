// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the external collaborators of the reliability core.

pub mod channel;
pub mod generator;

pub use channel::DeliveryChannel;
pub use generator::ReplyGenerator;
