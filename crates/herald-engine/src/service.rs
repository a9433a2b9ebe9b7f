// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async orchestration engine.

use std::sync::Arc;

use herald_attachments::AsyncAttachmentResolver;
use herald_config::HeraldConfig;
use herald_context::ContextRegistry;
use herald_core::{
    AsyncNotificationAdapter, AsyncNotificationBackend, AttachmentId, Clock, ContextFlavor,
    HeraldError, Notification, NotificationAttachment, NotificationId, NotificationRequest,
    NotificationType, NotificationUpdate, OneOffNotification, OneOffRecipient, Page, Sendable,
    StoredAttachment, SystemClock, UserId,
};
use tracing::{debug, info, warn};

use crate::machine::{self, DeliveryTally, DispatchOutcome, DispatchSummary, SendMode, Verdict};

const FLAVOR: ContextFlavor = ContextFlavor::Async;

/// Notification engine whose collaborator calls are awaited one after another
/// on the caller's runtime. No tasks are spawned, so a dispatch pass is the
/// same per-notification, per-adapter sequence as in [`NotificationService`].
///
/// [`NotificationService`]: crate::NotificationService
pub struct AsyncNotificationService {
    backend: Arc<dyn AsyncNotificationBackend>,
    adapters: Vec<Arc<dyn AsyncNotificationAdapter>>,
    registry: Arc<ContextRegistry>,
    resolver: AsyncAttachmentResolver,
    clock: Arc<dyn Clock>,
    config: HeraldConfig,
}

impl AsyncNotificationService {
    pub fn new(
        backend: Arc<dyn AsyncNotificationBackend>,
        adapters: Vec<Arc<dyn AsyncNotificationAdapter>>,
        registry: Arc<ContextRegistry>,
        config: &HeraldConfig,
    ) -> Result<Self, HeraldError> {
        crate::check_config(config)?;
        Ok(Self {
            backend,
            adapters,
            registry,
            resolver: AsyncAttachmentResolver::new(&config.attachments)?,
            clock: Arc::new(SystemClock),
            config: config.clone(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn create_notification(
        &self,
        user_id: &UserId,
        request: NotificationRequest,
    ) -> Result<Notification, HeraldError> {
        self.registry.ensure_registered(&request.context_name, FLAVOR)?;
        let (mut new, attachments) = machine::split_request(request);
        let stored = self.store_attachments(attachments).await?;
        new.attachments = stored.clone();

        let notification = match self.backend.persist_notification(user_id, new).await {
            Ok(notification) => notification,
            Err(e) => {
                self.discard_attachments(&stored).await;
                return Err(e);
            }
        };
        info!(
            notification_id = %notification.id,
            user_id = %user_id,
            notification_type = %notification.details.notification_type,
            attachments = stored.len(),
            "notification created"
        );
        Ok(notification)
    }

    pub async fn create_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        request: NotificationRequest,
    ) -> Result<OneOffNotification, HeraldError> {
        machine::validate_target(recipient, request.notification_type)?;
        self.registry.ensure_registered(&request.context_name, FLAVOR)?;
        let (mut new, attachments) = machine::split_request(request);
        let stored = self.store_attachments(attachments).await?;
        new.attachments = stored.clone();

        let notification = match self
            .backend
            .persist_one_off_notification(recipient, new)
            .await
        {
            Ok(notification) => notification,
            Err(e) => {
                self.discard_attachments(&stored).await;
                return Err(e);
            }
        };
        info!(
            notification_id = %notification.id,
            notification_type = %notification.details.notification_type,
            attachments = stored.len(),
            "one-off notification created"
        );
        Ok(notification)
    }

    pub async fn update_notification(
        &self,
        id: &NotificationId,
        update: NotificationUpdate,
    ) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id).await?;
        machine::ensure_updatable(&current, &update)?;
        if let Some(name) = &update.context_name {
            self.registry.ensure_registered(name, FLAVOR)?;
        }

        let (mut patch, attachments) = machine::split_update(update);
        let stored = self.store_attachments(attachments).await?;
        patch.add_attachments = stored.clone();

        let updated = match self.backend.update_notification(id, patch).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_attachments(&stored).await;
                return Err(e);
            }
        };
        debug!(notification_id = %id, "notification updated");
        Ok(updated)
    }

    pub async fn cancel_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id).await?;
        machine::ensure_cancellable(&current)?;
        let cancelled = self.backend.mark_cancelled(id).await?;
        info!(notification_id = %id, "notification cancelled");
        Ok(cancelled)
    }

    pub async fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        self.backend.get_notification(id).await
    }

    pub async fn get_pending_notifications(
        &self,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        self.backend
            .get_pending_notifications(self.clock.now(), page)
            .await
    }

    pub async fn get_all_future_notifications(&self) -> Result<Vec<Sendable>, HeraldError> {
        self.backend
            .get_all_future_notifications(self.clock.now())
            .await
    }

    pub async fn get_future_notifications(
        &self,
        page: Page,
    ) -> Result<Vec<Sendable>, HeraldError> {
        self.backend
            .get_future_notifications(self.clock.now(), page)
            .await
    }

    pub async fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, HeraldError> {
        self.backend
            .get_all_future_notifications_from_user(user_id, self.clock.now())
            .await
    }

    pub async fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        self.backend
            .get_future_notifications_from_user(user_id, self.clock.now(), page)
            .await
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id).await?;
        machine::ensure_readable(&current)?;
        let read = self.backend.mark_read(id).await?;
        debug!(notification_id = %id, "notification marked read");
        Ok(read)
    }

    pub async fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        if machine::capable_adapters(&self.adapters, NotificationType::InApp).is_empty() {
            return Err(HeraldError::NoInAppAdapter);
        }
        self.backend.get_in_app_unread(user_id, page).await
    }

    pub async fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError> {
        self.backend.delete_attachment(id).await?;
        debug!(attachment_id = %id, "attachment deleted");
        Ok(())
    }

    /// Dispatch every due notification once. Only a failure to list the
    /// pending set is returned as an error.
    pub async fn send_pending_notifications(&self) -> Result<DispatchSummary, HeraldError> {
        let now = self.clock.now();
        let mut pending = self.backend.get_all_pending_notifications(now).await?;
        machine::limit_pass(&mut pending, &self.config.dispatch);

        let mut summary = DispatchSummary::default();
        for notification in &pending {
            summary.absorb(notification, self.dispatch(notification).await);
        }
        Ok(summary.finish())
    }

    pub async fn send_notification(
        &self,
        id: &NotificationId,
    ) -> Result<DispatchOutcome, HeraldError> {
        let notification = self.backend.get_notification(id).await?;
        machine::ensure_dispatchable(&notification)?;
        self.dispatch(&notification).await
    }

    /// Entry point for a background worker completing a hand-off. `None`
    /// when no background adapter serves the notification's channel.
    pub async fn delayed_send(
        &self,
        id: &NotificationId,
    ) -> Result<Option<DispatchOutcome>, HeraldError> {
        let notification = self.backend.get_notification(id).await?;
        machine::ensure_dispatchable(&notification)?;
        let background =
            machine::background_adapters(&self.adapters, notification.details().notification_type);
        if background.is_empty() {
            debug!(notification_id = %id, "no background adapter for channel");
            return Ok(None);
        }
        self.deliver(&notification, background, SendMode::Delayed)
            .await
            .map(Some)
    }

    async fn dispatch(&self, notification: &Sendable) -> Result<DispatchOutcome, HeraldError> {
        match machine::route(&self.adapters, notification) {
            Ok(capable) => self.deliver(notification, capable, SendMode::Direct).await,
            Err(verdict) => self.finalize(notification, &verdict).await,
        }
    }

    async fn deliver(
        &self,
        notification: &Sendable,
        adapters: Vec<&Arc<dyn AsyncNotificationAdapter>>,
        mode: SendMode,
    ) -> Result<DispatchOutcome, HeraldError> {
        let details = notification.details();
        let verdict = match self
            .registry
            .get_context_async(&details.context_name, &details.context_kwargs)
            .await
        {
            Err(e) => Verdict::context_failed(notification.id(), &e),
            Ok(context) => {
                let mut tally = DeliveryTally::new(notification.id());
                for adapter in adapters {
                    let result = match mode {
                        SendMode::Direct => adapter.send(notification, &context).await,
                        SendMode::Delayed => adapter.delayed_send(notification, &context).await,
                    };
                    tally.observe(adapter.name(), result);
                }
                tally.verdict(context)
            }
        };
        self.finalize(notification, &verdict).await
    }

    async fn finalize(
        &self,
        notification: &Sendable,
        verdict: &Verdict,
    ) -> Result<DispatchOutcome, HeraldError> {
        let id = notification.id();
        let record = match verdict {
            Verdict::Sent { context, adapters } => {
                let sent = self.backend.mark_sent(id).await?;
                if let Err(e) = self.backend.store_context_used(id, context, adapters).await {
                    machine::context_store_failed(id, &e);
                }
                sent
            }
            Verdict::Failed { message } => self.backend.mark_failed(id, message).await?,
        };
        Ok(DispatchOutcome::recorded(verdict, &record))
    }

    async fn store_attachments(
        &self,
        attachments: Vec<NotificationAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }
        let resolved = self.resolver.resolve_all(attachments).await?;
        self.backend.store_attachments(resolved).await
    }

    async fn discard_attachments(&self, stored: &[StoredAttachment]) {
        for attachment in stored {
            if let Err(e) = self.backend.delete_attachment(&attachment.id).await {
                warn!(attachment_id = %attachment.id, error = %e, "failed to discard orphaned attachment");
            }
        }
    }
}
