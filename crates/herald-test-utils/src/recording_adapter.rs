// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter that records deliveries instead of transmitting them.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use herald_core::{
    AdapterInfo, AsyncNotificationAdapter, HeraldError, NotificationAdapter, NotificationContext,
    NotificationId, NotificationType, Recipient, RenderedNotification, Sendable, TemplateRenderer,
};

use crate::renderer::FakeRenderer;

/// One captured delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub notification_id: NotificationId,
    /// User id for regular notifications, address for one-offs.
    pub recipient: String,
    pub rendered: RenderedNotification,
    pub context: NotificationContext,
    /// Filenames of attachments embedded in the body.
    pub inline_attachments: Vec<String>,
    /// Filenames of regular attachments.
    pub attachments: Vec<String>,
    /// Total attachment bytes read through the stored files.
    pub attachment_bytes: usize,
}

/// A mock delivery adapter for one channel.
///
/// Implements both the blocking and async adapter traits. Renders with its
/// renderer, reads every attachment, and either records a [`Delivery`] or,
/// when built with [`RecordingAdapter::failing`], returns an `AdapterSend`
/// error after counting the attempt.
///
/// Built with [`RecordingAdapter::background`], `send` only queues the
/// notification id; rendering and recording happen in `delayed_send`.
#[derive(Clone)]
pub struct RecordingAdapter {
    name: String,
    notification_type: NotificationType,
    renderer: Arc<dyn TemplateRenderer>,
    failure: Option<String>,
    background: bool,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    attempts: Arc<Mutex<Vec<NotificationId>>>,
    handoffs: Arc<Mutex<Vec<NotificationId>>>,
}

impl RecordingAdapter {
    pub fn new(name: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            name: name.into(),
            notification_type,
            renderer: Arc::new(FakeRenderer),
            failure: None,
            background: false,
            deliveries: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(Vec::new())),
            handoffs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An adapter whose every send fails with `message`.
    pub fn failing(
        name: impl Into<String>,
        notification_type: NotificationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(name, notification_type)
        }
    }

    /// Defer delivery to `delayed_send`. A configured failure applies there.
    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Successful deliveries so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every notification `send` was called with, successful or not.
    pub fn attempts(&self) -> Vec<NotificationId> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications handed off by `send` in background mode, in order.
    pub fn handoffs(&self) -> Vec<NotificationId> {
        self.handoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send_or_queue(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        if !self.background {
            return self.deliver(notification, context);
        }
        tracing::debug!(
            adapter = %self.name,
            notification_id = %notification.id(),
            "queued for background delivery"
        );
        self.handoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.id().clone());
        Ok(())
    }

    fn deliver(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.id().clone());

        if let Some(message) = &self.failure {
            return Err(HeraldError::adapter_send(&self.name, message.clone()));
        }

        let rendered = self.renderer.render(notification, context)?;

        let mut inline_attachments = Vec::new();
        let mut attachments = Vec::new();
        let mut attachment_bytes = 0;
        for attachment in notification.attachments() {
            attachment_bytes += attachment.file.read()?.len();
            if attachment.is_inline {
                inline_attachments.push(attachment.filename.clone());
            } else {
                attachments.push(attachment.filename.clone());
            }
        }

        let recipient = match notification.recipient() {
            Recipient::User(user_id) => user_id.to_string(),
            Recipient::Direct { email_or_phone, .. } => email_or_phone.to_string(),
        };

        tracing::debug!(
            adapter = %self.name,
            notification_id = %notification.id(),
            %recipient,
            "recorded delivery"
        );

        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                notification_id: notification.id().clone(),
                recipient,
                rendered,
                context: context.clone(),
                inline_attachments,
                attachments,
                attachment_bytes,
            });
        Ok(())
    }
}

impl AdapterInfo for RecordingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    fn is_background(&self) -> bool {
        self.background
    }
}

impl NotificationAdapter for RecordingAdapter {
    fn send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.send_or_queue(notification, context)
    }

    fn delayed_send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.deliver(notification, context)
    }
}

#[async_trait]
impl AsyncNotificationAdapter for RecordingAdapter {
    async fn send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.send_or_queue(notification, context)
    }

    async fn delayed_send(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<(), HeraldError> {
        self.deliver(notification, context)
    }
}
