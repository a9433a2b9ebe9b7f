// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery adapters (SMTP, SMS gateways, push services, in-app inboxes).

use async_trait::async_trait;

use crate::context::NotificationContext;
use crate::error::HeraldError;
use crate::types::{NotificationType, Sendable};

/// Identity shared by every adapter.
pub trait AdapterInfo: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// The single channel this adapter delivers.
    fn notification_type(&self) -> NotificationType;

    /// Background adapters treat `send` as a hand-off to their own queue.
    /// A worker later completes delivery through the engine's `delayed_send`,
    /// which calls the adapter's `delayed_send`.
    fn is_background(&self) -> bool {
        false
    }
}

/// Blocking delivery adapter.
///
/// Implementations render the notification with their own
/// [`TemplateRenderer`](crate::traits::TemplateRenderer) and read attachment
/// bytes through [`StoredAttachment::file`](crate::attachment::StoredAttachment).
pub trait NotificationAdapter: AdapterInfo {
    fn send(&self, notification: &Sendable, context: &NotificationContext)
    -> Result<(), HeraldError>;

    /// Deliver a notification previously handed off by `send`.
    fn delayed_send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.send(notification, context)
    }
}

/// Non-blocking delivery adapter.
#[async_trait]
pub trait AsyncNotificationAdapter: AdapterInfo {
    async fn send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError>;

    async fn delayed_send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.send(notification, context).await
    }
}
