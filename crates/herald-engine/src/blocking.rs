// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking orchestration engine.

use std::sync::Arc;

use herald_attachments::AttachmentResolver;
use herald_config::HeraldConfig;
use herald_context::ContextRegistry;
use herald_core::{
    AttachmentId, Clock, ContextFlavor, HeraldError, Notification, NotificationAdapter,
    NotificationAttachment, NotificationBackend, NotificationId, NotificationRequest,
    NotificationType, NotificationUpdate, OneOffNotification, OneOffRecipient, Page, Sendable,
    StoredAttachment, SystemClock, UserId,
};
use tracing::{debug, info, warn};

use crate::machine::{self, DeliveryTally, DispatchOutcome, DispatchSummary, SendMode, Verdict};

const FLAVOR: ContextFlavor = ContextFlavor::Blocking;

/// Notification engine whose every collaborator call blocks the calling thread.
///
/// Owns a blocking HTTP client for attachment downloads, so it must be built
/// and dropped outside of any async runtime.
pub struct NotificationService {
    backend: Arc<dyn NotificationBackend>,
    adapters: Vec<Arc<dyn NotificationAdapter>>,
    registry: Arc<ContextRegistry>,
    resolver: AttachmentResolver,
    clock: Arc<dyn Clock>,
    config: HeraldConfig,
}

impl NotificationService {
    /// Fails with [`HeraldError::Config`] when `config` does not validate.
    pub fn new(
        backend: Arc<dyn NotificationBackend>,
        adapters: Vec<Arc<dyn NotificationAdapter>>,
        registry: Arc<ContextRegistry>,
        config: &HeraldConfig,
    ) -> Result<Self, HeraldError> {
        crate::check_config(config)?;
        Ok(Self {
            backend,
            adapters,
            registry,
            resolver: AttachmentResolver::new(&config.attachments)?,
            clock: Arc::new(SystemClock),
            config: config.clone(),
        })
    }

    /// Replace the time source used for due-date decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, resolve and store attachments, then persist a `PENDING` notification.
    pub fn create_notification(
        &self,
        user_id: &UserId,
        request: NotificationRequest,
    ) -> Result<Notification, HeraldError> {
        self.registry.ensure_registered(&request.context_name, FLAVOR)?;
        let (mut new, attachments) = machine::split_request(request);
        let stored = self.store_attachments(attachments)?;
        new.attachments = stored.clone();

        let notification = self
            .backend
            .persist_notification(user_id, new)
            .inspect_err(|_| self.discard_attachments(&stored))?;
        info!(
            notification_id = %notification.id,
            user_id = %user_id,
            notification_type = %notification.details.notification_type,
            attachments = stored.len(),
            "notification created"
        );
        Ok(notification)
    }

    /// Same as [`create_notification`](Self::create_notification) for a direct recipient.
    pub fn create_one_off_notification(
        &self,
        recipient: &OneOffRecipient,
        request: NotificationRequest,
    ) -> Result<OneOffNotification, HeraldError> {
        machine::validate_target(recipient, request.notification_type)?;
        self.registry.ensure_registered(&request.context_name, FLAVOR)?;
        let (mut new, attachments) = machine::split_request(request);
        let stored = self.store_attachments(attachments)?;
        new.attachments = stored.clone();

        let notification = self
            .backend
            .persist_one_off_notification(recipient, new)
            .inspect_err(|_| self.discard_attachments(&stored))?;
        info!(
            notification_id = %notification.id,
            notification_type = %notification.details.notification_type,
            attachments = stored.len(),
            "one-off notification created"
        );
        Ok(notification)
    }

    /// Apply a partial update. Status is never changed.
    pub fn update_notification(
        &self,
        id: &NotificationId,
        update: NotificationUpdate,
    ) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id)?;
        machine::ensure_updatable(&current, &update)?;
        if let Some(name) = &update.context_name {
            self.registry.ensure_registered(name, FLAVOR)?;
        }

        let (mut patch, attachments) = machine::split_update(update);
        let stored = self.store_attachments(attachments)?;
        patch.add_attachments = stored.clone();

        let updated = self
            .backend
            .update_notification(id, patch)
            .inspect_err(|_| self.discard_attachments(&stored))?;
        debug!(notification_id = %id, "notification updated");
        Ok(updated)
    }

    pub fn cancel_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id)?;
        machine::ensure_cancellable(&current)?;
        let cancelled = self.backend.mark_cancelled(id)?;
        info!(notification_id = %id, "notification cancelled");
        Ok(cancelled)
    }

    pub fn get_notification(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        self.backend.get_notification(id)
    }

    pub fn get_pending_notifications(&self, page: Page) -> Result<Vec<Sendable>, HeraldError> {
        self.backend
            .get_pending_notifications(self.clock.now(), page)
    }

    pub fn get_all_future_notifications(&self) -> Result<Vec<Sendable>, HeraldError> {
        self.backend.get_all_future_notifications(self.clock.now())
    }

    pub fn get_future_notifications(&self, page: Page) -> Result<Vec<Sendable>, HeraldError> {
        self.backend.get_future_notifications(self.clock.now(), page)
    }

    pub fn get_all_future_notifications_from_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, HeraldError> {
        self.backend
            .get_all_future_notifications_from_user(user_id, self.clock.now())
    }

    pub fn get_future_notifications_from_user(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        self.backend
            .get_future_notifications_from_user(user_id, self.clock.now(), page)
    }

    /// Acknowledge a delivered notification (`SENT` to `READ`).
    pub fn mark_read(&self, id: &NotificationId) -> Result<Sendable, HeraldError> {
        let current = self.backend.get_notification(id)?;
        machine::ensure_readable(&current)?;
        let read = self.backend.mark_read(id)?;
        debug!(notification_id = %id, "notification marked read");
        Ok(read)
    }

    /// Unread in-app notifications of a user. Requires an in-app adapter.
    pub fn get_in_app_unread(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Vec<Notification>, HeraldError> {
        if machine::capable_adapters(&self.adapters, NotificationType::InApp).is_empty() {
            return Err(HeraldError::NoInAppAdapter);
        }
        self.backend.get_in_app_unread(user_id, page)
    }

    pub fn delete_attachment(&self, id: &AttachmentId) -> Result<(), HeraldError> {
        self.backend.delete_attachment(id)?;
        debug!(attachment_id = %id, "attachment deleted");
        Ok(())
    }

    /// Dispatch every due notification once.
    ///
    /// Per-notification failures become `FAILED` records; only a failure to
    /// list the pending set is returned.
    pub fn send_pending_notifications(&self) -> Result<DispatchSummary, HeraldError> {
        let now = self.clock.now();
        let mut pending = self.backend.get_all_pending_notifications(now)?;
        machine::limit_pass(&mut pending, &self.config.dispatch);

        let mut summary = DispatchSummary::default();
        for notification in &pending {
            summary.absorb(notification, self.dispatch(notification));
        }
        Ok(summary.finish())
    }

    /// Dispatch one notification now, regardless of schedule.
    ///
    /// Re-sending a `SENT`, `FAILED` or `READ` notification is a new attempt.
    pub fn send_notification(&self, id: &NotificationId) -> Result<DispatchOutcome, HeraldError> {
        let notification = self.backend.get_notification(id)?;
        machine::ensure_dispatchable(&notification)?;
        self.dispatch(&notification)
    }

    /// Complete a background hand-off: regenerate the context and call
    /// `delayed_send` on every background adapter of the channel.
    ///
    /// Returns `None`, leaving the record untouched, when no background
    /// adapter serves the notification's channel.
    pub fn delayed_send(&self, id: &NotificationId) -> Result<Option<DispatchOutcome>, HeraldError> {
        let notification = self.backend.get_notification(id)?;
        machine::ensure_dispatchable(&notification)?;
        let background =
            machine::background_adapters(&self.adapters, notification.details().notification_type);
        if background.is_empty() {
            debug!(notification_id = %id, "no background adapter for channel");
            return Ok(None);
        }
        self.deliver(&notification, background, SendMode::Delayed).map(Some)
    }

    fn dispatch(&self, notification: &Sendable) -> Result<DispatchOutcome, HeraldError> {
        match machine::route(&self.adapters, notification) {
            Ok(capable) => self.deliver(notification, capable, SendMode::Direct),
            Err(verdict) => self.finalize(notification, &verdict),
        }
    }

    fn deliver(
        &self,
        notification: &Sendable,
        adapters: Vec<&Arc<dyn NotificationAdapter>>,
        mode: SendMode,
    ) -> Result<DispatchOutcome, HeraldError> {
        let details = notification.details();
        let verdict = match self
            .registry
            .get_context(&details.context_name, &details.context_kwargs)
        {
            Err(e) => Verdict::context_failed(notification.id(), &e),
            Ok(context) => {
                let mut tally = DeliveryTally::new(notification.id());
                for adapter in adapters {
                    let result = match mode {
                        SendMode::Direct => adapter.send(notification, &context),
                        SendMode::Delayed => adapter.delayed_send(notification, &context),
                    };
                    tally.observe(adapter.name(), result);
                }
                tally.verdict(context)
            }
        };
        self.finalize(notification, &verdict)
    }

    fn finalize(
        &self,
        notification: &Sendable,
        verdict: &Verdict,
    ) -> Result<DispatchOutcome, HeraldError> {
        let id = notification.id();
        let record = match verdict {
            Verdict::Sent { context, adapters } => {
                let sent = self.backend.mark_sent(id)?;
                if let Err(e) = self.backend.store_context_used(id, context, adapters) {
                    machine::context_store_failed(id, &e);
                }
                sent
            }
            Verdict::Failed { message } => self.backend.mark_failed(id, message)?,
        };
        Ok(DispatchOutcome::recorded(verdict, &record))
    }

    fn store_attachments(
        &self,
        attachments: Vec<NotificationAttachment>,
    ) -> Result<Vec<StoredAttachment>, HeraldError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }
        let resolved = self.resolver.resolve_all(attachments)?;
        self.backend.store_attachments(resolved)
    }

    fn discard_attachments(&self, stored: &[StoredAttachment]) {
        for attachment in stored {
            if let Err(e) = self.backend.delete_attachment(&attachment.id) {
                warn!(attachment_id = %attachment.id, error = %e, "failed to discard orphaned attachment");
            }
        }
    }
}
