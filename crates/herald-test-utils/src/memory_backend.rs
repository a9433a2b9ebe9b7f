// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory notification backend.
//!
//! Implements both [`NotificationBackend`] and [`AsyncNotificationBackend`]
//! over one mutex-guarded state, so every operation is serialized. Each call
//! is appended to a call log that tests can inspect.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use herald_core::{
    AsyncNotificationBackend, AttachmentFile, AttachmentId, Clock, HeraldError, NewNotification,
    Notification, NotificationBackend, NotificationContext, NotificationDetails, NotificationId,
    NotificationPatch, NotificationStatus, NotificationType, OneOffNotification, OneOffRecipient,
    Page, ResolvedAttachment, Sendable, StoredAttachment, SystemClock, UserId,
};

type BlobStore = Arc<Mutex<HashMap<AttachmentId, Bytes>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct State {
    /// Insertion order is preserved; it breaks `created_at` ties.
    records: Vec<Sendable>,
    calls: Vec<&'static str>,
    fail_next_persist: bool,
    fail_next_context_store: bool,
}

impl State {
    fn find_mut(&mut self, id: &NotificationId) -> Result<&mut Sendable, HeraldError> {
        self.records
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| HeraldError::NotificationNotFound { id: id.clone() })
    }

    fn transition(
        &mut self,
        id: &NotificationId,
        next: NotificationStatus,
        operation: &str,
        now: DateTime<Utc>,
    ) -> Result<&mut Sendable, HeraldError> {
        let record = self.find_mut(id)?;
        let current = record.status();
        if !current.can_transition_to(next) {
            return Err(HeraldError::InvalidStatusTransition {
                id: id.clone(),
                status: current,
                operation: operation.to_string(),
            });
        }
        let details = record.details_mut();
        details.status = next;
        details.updated_at = now;
        Ok(record)
    }
}

/// Bytes of an attachment held by a [`MemoryBackend`].
pub struct MemoryAttachmentFile {
    id: AttachmentId,
    blobs: BlobStore,
}

impl AttachmentFile for MemoryAttachmentFile {
    fn read(&self) -> Result<Bytes, HeraldError> {
        lock(&self.blobs)
            .get(&self.id)
            .cloned()
            .ok_or_else(|| HeraldError::AttachmentStorage {
                message: format!("attachment {} has been deleted", self.id),
                source: None,
            })
    }

    fn stream(&self) -> Result<Box<dyn Read + Send>, HeraldError> {
        Ok(Box::new(Cursor::new(self.read()?)))
    }

    fn url(&self, expires_in: Duration) -> Result<String, HeraldError> {
        Ok(format!(
            "memory://attachments/{}?expires_in={}",
            self.id,
            expires_in.as_secs()
        ))
    }

    fn delete(&self) -> Result<(), HeraldError> {
        lock(&self.blobs).remove(&self.id);
        Ok(())
    }
}

/// Reference backend keeping every record in process memory.
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    blobs: BlobStore,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Timestamps (`created_at`, `sent_at`, ...) are taken from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            blobs: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Names of the backend methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.state).calls.clone()
    }

    /// Make the next `persist_*` call fail with a backend error.
    pub fn fail_next_persist(&self) {
        lock(&self.state).fail_next_persist = true;
    }

    /// Make the next `store_context_used` call fail with a backend error.
    pub fn fail_next_context_store(&self) {
        lock(&self.state).fail_next_context_store = true;
    }

    /// Number of attachment blobs currently stored.
    pub fn stored_attachment_count(&self) -> usize {
        lock(&self.blobs).len()
    }

    /// Every record, in insertion order.
    pub fn all(&self) -> Vec<Sendable> {
        lock(&self.state).records.clone()
    }

    fn record_call(&self, name: &'static str) -> MutexGuard<'_, State> {
        let mut state = lock(&self.state);
        state.calls.push(name);
        state
    }

    fn take_persist_failure(state: &mut State) -> Result<(), HeraldError> {
        if std::mem::take(&mut state.fail_next_persist) {
            Err(HeraldError::backend("simulated persistence failure"))
        } else {
            Ok(())
        }
    }

    fn next_id() -> NotificationId {
        NotificationId(uuid::Uuid::new_v4().to_string())
    }

    fn due_sorted(records: &[Sendable], now: DateTime<Utc>) -> Vec<Sendable> {
        let mut due: Vec<Sendable> = records
            .iter()
            .filter(|n| n.details().is_due(now))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        due.sort_by_key(|n| n.details().created_at);
        due
    }

    fn future_sorted(records: &[Sendable], now: DateTime<Utc>) -> Vec<Sendable> {
        let mut future: Vec<Sendable> = records
            .iter()
            .filter(|n| n.details().is_future(now))
            .cloned()
            .collect();
        future.sort_by_key(|n| n.details().send_after);
        future
    }

    fn future_of_user(records: &[Sendable], user_id: &UserId, now: DateTime<Utc>) -> Vec<Notification> {
        Self::future_sorted(records, now)
            .into_iter()
            .filter_map(Sendable::into_notification)
            .filter(|n| &n.user_id == user_id)
            .collect()
    }
}

impl NotificationBackend for MemoryBackend {
    fn persist_notification(
        &self,
        user_id: &UserId,
        notification: NewNotification,
    ) -> Result<Notification, HeraldError> {
        let mut state = self.record_call("persist_notification");
        Self::take_persist_failure(&mut state)?;
        let stored = Notification {
            id: Self::next_id(),
            user_id: user_id.clone(),
            details: NotificationDetails::pending(notification, self.clock.now()),
        };
        state.records.push(Sendable::Notification(stored.clone()));
        Ok(stored)
    }

    fn persist_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        notification: NewNotification,
    ) -> Result<OneOffNotification, HeraldError> {
        let mut state = self.record_call("persist_one_off_notification");
        Self::take_persist_failure(&mut state)?;
        let stored = OneOffNotification {
            id: Self::next_id(),
            email_or_phone: recipient.email_or_phone.clone(),
            first_name: recipient.first_name.clone(),
            last_name: recipient.last_name.clone(),
            details: NotificationDetails::pending(notification, self.clock.now()),
        };
        state.records.push(Sendable::OneOff(stored.clone()));
        Ok(stored)
    }

    fn update_notification(
        &self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Sendable, HeraldError> {
        let now = self.clock.now();
        let mut state = self.record_call("update_notification");
        let record = state.find_mut(id)?;
        patch.apply_to(record.details_mut(), now);
        Ok(record.clone())
    }

    fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let mut state = self.record_call("get_notification");
        state.find_mut(id).map(|n| n.clone())
    }

    fn get_all_pending_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError> {
        let state = self.record_call("get_all_pending_notifications");
        Ok(Self::due_sorted(&state.records, now))
    }

    fn get_pending_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        let state = self.record_call("get_pending_notifications");
        Ok(page.apply(Self::due_sorted(&state.records, now)))
    }

    fn get_all_future_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError> {
        let state = self.record_call("get_all_future_notifications");
        Ok(Self::future_sorted(&state.records, now))
    }

    fn get_future_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        let state = self.record_call("get_future_notifications");
        Ok(page.apply(Self::future_sorted(&state.records, now)))
    }

    fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, HeraldError> {
        let state = self.record_call("get_all_future_notifications_from_user");
        Ok(Self::future_of_user(&state.records, user_id, now))
    }

    fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        let state = self.record_call("get_future_notifications_from_user");
        Ok(page.apply(Self::future_of_user(&state.records, user_id, now)))
    }

    fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        let state = self.record_call("get_in_app_unread");
        let mut unread: Vec<Notification> = state
            .records
            .iter()
            .cloned()
            .filter_map(Sendable::into_notification)
            .filter(|n| {
                &n.user_id == user_id
                    && n.details.notification_type == NotificationType::InApp
                    && n.details.status == NotificationStatus::Sent
            })
            .collect();
        // Newest first, like an inbox.
        unread.sort_by(|a, b| b.details.sent_at.cmp(&a.details.sent_at));
        Ok(page.apply(unread))
    }

    fn store_attachments(
        &self,
        attachments: Vec<ResolvedAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError> {
        drop(self.record_call("store_attachments"));
        let now = self.clock.now();
        let mut blobs = lock(&self.blobs);
        Ok(attachments
            .into_iter()
            .map(|resolved| {
                let id = AttachmentId(uuid::Uuid::new_v4().to_string());
                blobs.insert(id.clone(), resolved.data);
                let mut storage_metadata = serde_json::Map::new();
                storage_metadata.insert("store".into(), "memory".into());
                StoredAttachment {
                    file: Arc::new(MemoryAttachmentFile {
                        id: id.clone(),
                        blobs: Arc::clone(&self.blobs),
                    }),
                    id,
                    filename: resolved.filename,
                    content_type: resolved.content_type,
                    size: resolved.size,
                    checksum: resolved.checksum,
                    created_at: now,
                    description: resolved.description,
                    is_inline: resolved.is_inline,
                    storage_metadata,
                }
            })
            .collect())
    }

    fn mark_sent(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let now = self.clock.now();
        let mut state = self.record_call("mark_sent");
        let record = state.transition(id, NotificationStatus::Sent, "mark as sent", now)?;
        let details = record.details_mut();
        details.sent_at = Some(now);
        details.error_message = None;
        Ok(record.clone())
    }

    fn mark_failed(&self, id: &NotificationId, message: &str) -> Result<Sendable, HeraldError> {
        let now = self.clock.now();
        let mut state = self.record_call("mark_failed");
        let record = state.transition(id, NotificationStatus::Failed, "mark as failed", now)?;
        let details = record.details_mut();
        details.failed_at = Some(now);
        details.error_message = Some(message.to_string());
        Ok(record.clone())
    }

    fn mark_cancelled(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let now = self.clock.now();
        let mut state = self.record_call("mark_cancelled");
        let record = state.transition(id, NotificationStatus::Cancelled, "cancel", now)?;
        Ok(record.clone())
    }

    fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let now = self.clock.now();
        let mut state = self.record_call("mark_read");
        let record = state.transition(id, NotificationStatus::Read, "mark as read", now)?;
        Ok(record.clone())
    }

    fn store_context_used(
        &self,
        id: &NotificationId,
        context: &NotificationContext,
        adapters: &[String],
    ) -> Result<(), HeraldError> {
        let mut state = self.record_call("store_context_used");
        if std::mem::take(&mut state.fail_next_context_store) {
            return Err(HeraldError::backend("simulated context store failure"));
        }
        let details = state.find_mut(id)?.details_mut();
        details.context_used = Some(context.clone());
        details.adapter_used = Some(adapters.join(","));
        Ok(())
    }

    fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError> {
        let mut state = self.record_call("delete_attachment");
        if lock(&self.blobs).remove(id).is_none() {
            return Err(HeraldError::AttachmentStorage {
                message: format!("unknown attachment {id}"),
                source: None,
            });
        }
        for record in &mut state.records {
            record.details_mut().attachments.retain(|a| &a.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncNotificationBackend for MemoryBackend {
    async fn persist_notification(
        &self,
        user_id: &UserId,
        notification: NewNotification,
    ) -> Result<Notification, HeraldError> {
        NotificationBackend::persist_notification(self, user_id, notification)
    }

    async fn persist_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        notification: NewNotification,
    ) -> Result<OneOffNotification, HeraldError> {
        NotificationBackend::persist_one_off_notification(self, recipient, notification)
    }

    async fn update_notification(
        &self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Sendable, HeraldError> {
        NotificationBackend::update_notification(self, id, patch)
    }

    async fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        NotificationBackend::get_notification(self, id)
    }

    async fn get_all_pending_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError> {
        NotificationBackend::get_all_pending_notifications(self, now)
    }

    async fn get_pending_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        NotificationBackend::get_pending_notifications(self, now, page)
    }

    async fn get_all_future_notifications(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sendable>, HeraldError> {
        NotificationBackend::get_all_future_notifications(self, now)
    }

    async fn get_future_notifications(
        &self,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        NotificationBackend::get_future_notifications(self, now, page)
    }

    async fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>, HeraldError> {
        NotificationBackend::get_all_future_notifications_from_user(self, user_id, now)
    }

    async fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        NotificationBackend::get_future_notifications_from_user(self, user_id, now, page)
    }

    async fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        NotificationBackend::get_in_app_unread(self, user_id, page)
    }

    async fn store_attachments(
        &self,
        attachments: Vec<ResolvedAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError> {
        NotificationBackend::store_attachments(self, attachments)
    }

    async fn mark_sent(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        NotificationBackend::mark_sent(self, id)
    }

    async fn mark_failed(
        &self,
        id: &NotificationId,
        message: &str,
    ) -> Result<Sendable, HeraldError> {
        NotificationBackend::mark_failed(self, id, message)
    }

    async fn mark_cancelled(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        NotificationBackend::mark_cancelled(self, id)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        NotificationBackend::mark_read(self, id)
    }

    async fn store_context_used(
        &self,
        id: &NotificationId,
        context: &NotificationContext,
        adapters: &[String],
    ) -> Result<(), HeraldError> {
        NotificationBackend::store_context_used(self, id, context, adapters)
    }

    async fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError> {
        NotificationBackend::delete_attachment(self, id)
    }
}
