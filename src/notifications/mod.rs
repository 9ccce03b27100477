// ABOUTME: Notification module organizing message building and outbound dispatch
// ABOUTME: Defines the dispatcher contract consumed by the reminder and report tasks
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Notification Dispatch
//!
//! The transport is an external collaborator: the tasks only depend on the
//! `NotificationSender` contract. `messages` builds the concrete subject
//! and bodies; `mailer` is the HTTP transport implementation.

pub mod mailer;
pub mod messages;

use async_trait::async_trait;

/// One fully rendered outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
    pub recipient: String,
}

/// Dispatch error types
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport-level failure reaching the relay
    #[error("notification transport failed: {0}")]
    Transport(String),

    /// The relay answered but refused the message
    #[error("notification rejected by relay: {0}")]
    Rejected(String),
}

/// Trait for notification transport implementations
///
/// Returns the number of messages accepted by the transport; dispatch
/// failures surface as errors so callers can decide what bookkeeping to
/// skip. Nothing here retries.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &str;

    /// Send one message, returning the count accepted (0 means rejected)
    async fn send(&self, message: &OutboundMessage) -> Result<u32, NotifyError>;
}
