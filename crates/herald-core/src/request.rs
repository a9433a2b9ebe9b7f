// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-facing inputs for creating and updating notifications.

use chrono::{DateTime, Utc};

use crate::attachment::NotificationAttachment;
use crate::context::ContextKwargs;
use crate::types::NotificationType;

/// Everything needed to create a notification, except the recipient.
#[derive(Debug)]
pub struct NotificationRequest {
    pub notification_type: NotificationType,
    pub title: String,
    pub body_template: String,
    pub subject_template: String,
    pub preheader_template: String,
    pub context_name: String,
    pub context_kwargs: ContextKwargs,
    pub send_after: Option<DateTime<Utc>>,
    pub adapter_extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub attachments: Vec<NotificationAttachment>,
}

impl NotificationRequest {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        body_template: impl Into<String>,
        context_name: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            body_template: body_template.into(),
            subject_template: String::new(),
            preheader_template: String::new(),
            context_name: context_name.into(),
            context_kwargs: ContextKwargs::new(),
            send_after: None,
            adapter_extra_parameters: None,
            attachments: Vec::new(),
        }
    }

    pub fn subject_template(mut self, template: impl Into<String>) -> Self {
        self.subject_template = template.into();
        self
    }

    pub fn preheader_template(mut self, template: impl Into<String>) -> Self {
        self.preheader_template = template.into();
        self
    }

    pub fn context_kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context_kwargs.insert(key.into(), value.into());
        self
    }

    pub fn context_kwargs(mut self, kwargs: ContextKwargs) -> Self {
        self.context_kwargs = kwargs;
        self
    }

    pub fn send_after(mut self, at: DateTime<Utc>) -> Self {
        self.send_after = Some(at);
        self
    }

    pub fn adapter_extra_parameters(
        mut self,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.adapter_extra_parameters = Some(params);
        self
    }

    pub fn attachment(mut self, attachment: NotificationAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Partial update of a notification. Unset fields are left untouched.
#[derive(Debug, Default)]
pub struct NotificationUpdate {
    pub title: Option<String>,
    pub body_template: Option<String>,
    pub subject_template: Option<String>,
    pub preheader_template: Option<String>,
    pub context_name: Option<String>,
    pub context_kwargs: Option<ContextKwargs>,
    /// `Some(None)` clears the schedule.
    pub send_after: Option<Option<DateTime<Utc>>>,
    pub adapter_extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub add_attachments: Vec<NotificationAttachment>,
    /// Administrative field, writable in any status.
    pub error_message: Option<String>,
}

impl NotificationUpdate {
    /// Whether the update changes anything beyond administrative fields.
    pub fn touches_content(&self) -> bool {
        self.title.is_some()
            || self.body_template.is_some()
            || self.subject_template.is_some()
            || self.preheader_template.is_some()
            || self.context_name.is_some()
            || self.context_kwargs.is_some()
            || self.send_after.is_some()
            || self.adapter_extra_parameters.is_some()
            || !self.add_attachments.is_empty()
    }
}
