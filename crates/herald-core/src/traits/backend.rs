// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence backends for notification records and attachments.
//!
//! Backends own notification state. The engine never mutates a record in
//! place; every transition goes through one of these methods and the engine
//! continues with the value the backend returns. Lookups of a missing id
//! return [`HeraldError::NotificationNotFound`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::attachment::{ResolvedAttachment, StoredAttachment};
use crate::context::NotificationContext;
use crate::error::HeraldError;
use crate::types::{
    AttachmentId, NewNotification, Notification, NotificationId, NotificationPatch,
    OneOffNotification, OneOffRecipient, Page, Sendable, UserId,
};

/// Blocking persistence backend.
pub trait NotificationBackend: Send + Sync {
    fn persist_notification(
        &self,
        user_id: &UserId,
        notification: NewNotification,
    ) -> Result<Notification, HeraldError>;

    fn persist_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        notification: NewNotification,
    ) -> Result<OneOffNotification, HeraldError>;

    /// Apply a partial update. Never changes status.
    fn update_notification(
        &self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Sendable, HeraldError>;

    fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    /// Every `PENDING` notification due at `now`, oldest first.
    fn get_all_pending_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError>;

    fn get_pending_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError>;

    /// Every `PENDING` notification scheduled strictly after `now`, soonest first.
    fn get_all_future_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError>;

    /// `PENDING` notifications scheduled strictly after `now`.
    fn get_future_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError>;

    fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, HeraldError>;

    fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError>;

    /// `SENT` in-app notifications of `user_id` that were not marked read.
    fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError>;

    fn store_attachments(
        &self,
        attachments: Vec<ResolvedAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError>;

    fn mark_sent(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    fn mark_failed(&self, id: &NotificationId, message: &str) -> Result<Sendable, HeraldError>;

    fn mark_cancelled(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    /// Record the context and adapters of a successful delivery.
    fn store_context_used(
        &self,
        id: &NotificationId,
        context: &NotificationContext,
        adapters: &[String],
    ) -> Result<(), HeraldError>;

    fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError>;
}

/// Non-blocking persistence backend. Same contract as [`NotificationBackend`].
#[async_trait]
pub trait AsyncNotificationBackend: Send + Sync {
    async fn persist_notification(
        &self,
        user_id: &UserId,
        notification: NewNotification,
    ) -> Result<Notification, HeraldError>;

    async fn persist_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        notification: NewNotification,
    ) -> Result<OneOffNotification, HeraldError>;

    async fn update_notification(
        &self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Sendable, HeraldError>;

    async fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    async fn get_all_pending_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError>;

    async fn get_pending_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError>;

    async fn get_all_future_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError>;

    async fn get_future_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError>;

    async fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, HeraldError>;

    async fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError>;

    async fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError>;

    async fn store_attachments(
        &self,
        attachments: Vec<ResolvedAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError>;

    async fn mark_sent(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    async fn mark_failed(
        &self,
        id: &NotificationId,
        message: &str,
    ) -> Result<Sendable, HeraldError>;

    async fn mark_cancelled(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    async fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError>;

    async fn store_context_used(
        &self,
        id: &NotificationId,
        context: &NotificationContext,
        adapters: &[String],
    ) -> Result<(), HeraldError>;

    async fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError>;
}
