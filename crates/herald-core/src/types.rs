// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification records, identifiers, and the sendable sum type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::attachment::StoredAttachment;
use crate::context::{ContextKwargs, NotificationContext};
use crate::error::HeraldError;

/// Opaque identifier of a notification, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Identifier of the principal that owns a regular notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(NotificationId);
string_id!(UserId);
string_id!(AttachmentId);

/// Delivery channel of a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Email,
    Sms,
    Push,
    InApp,
}

impl NotificationType {
    /// Parse a channel name such as `EMAIL` or `IN_APP`.
    pub fn from_channel_name(name: &str) -> Result<Self, HeraldError> {
        name.parse()
            .map_err(|_| HeraldError::InvalidNotificationType(name.to_string()))
    }
}

/// Lifecycle status of a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Created, eligible for dispatch once `send_after` has elapsed.
    Pending,
    /// Every capable adapter delivered it.
    Sent,
    /// At least one capable adapter (or context generation) failed.
    Failed,
    /// Cancelled by the caller before dispatch. Final.
    Cancelled,
    /// Delivered in-app notification acknowledged by the user.
    Read,
}

impl NotificationStatus {
    /// Whether a `PENDING`-only operation (update, cancel) may run.
    pub fn is_pending(self) -> bool {
        self == NotificationStatus::Pending
    }

    /// Whether an explicit dispatch (first send or re-send) may start from this status.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, NotificationStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// `SENT`, `FAILED` and `READ` are terminal for the dispatch pass but may be
    /// re-entered by an explicit re-send.
    pub fn can_transition_to(self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        match (self, next) {
            (Pending, Sent | Failed | Cancelled) => true,
            (Sent | Failed | Read, Sent | Failed) => true,
            (Sent, Read) => true,
            _ => false,
        }
    }
}

/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size,
        }
    }

    /// Items skipped before this page. Page 0 is treated as page 1 and the
    /// product saturates, so a hand-built page never overflows.
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }

    /// Slice an already-ordered result set down to this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset()).take(self.size).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// Fields shared by regular and one-off notifications.
#[derive(Debug, Clone)]
pub struct NotificationDetails {
    pub notification_type: NotificationType,
    /// Audit label, never rendered.
    pub title: String,
    pub body_template: String,
    pub subject_template: String,
    pub preheader_template: String,
    /// Registry key of the context generator.
    pub context_name: String,
    /// Arguments passed to the generator at send time.
    pub context_kwargs: ContextKwargs,
    pub send_after: Option<DateTime<Utc>>,
    pub adapter_extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub attachments: Vec<StoredAttachment>,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Context rendered on the last successful delivery.
    pub context_used: Option<NotificationContext>,
    /// Adapters that performed the last successful delivery.
    pub adapter_used: Option<String>,
}

impl NotificationDetails {
    /// Build the details of a freshly persisted notification.
    pub fn pending(new: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            notification_type: new.notification_type,
            title: new.title,
            body_template: new.body_template,
            subject_template: new.subject_template,
            preheader_template: new.preheader_template,
            context_name: new.context_name,
            context_kwargs: new.context_kwargs,
            send_after: new.send_after,
            adapter_extra_parameters: new.adapter_extra_parameters,
            attachments: new.attachments,
            status: NotificationStatus::Pending,
            created_at: now,
            updated_at: now,
            sent_at: None,
            failed_at: None,
            error_message: None,
            context_used: None,
            adapter_used: None,
        }
    }

    /// Pending and either unscheduled or scheduled at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && self.send_after.is_none_or(|at| at <= now)
    }

    /// Pending and scheduled strictly after `now`.
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && self.send_after.is_some_and(|at| at > now)
    }
}

/// A notification addressed to a known user.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub details: NotificationDetails,
}

/// A notification addressed directly to an email address or phone number.
#[derive(Debug, Clone)]
pub struct OneOffNotification {
    pub id: NotificationId,
    pub email_or_phone: String,
    pub first_name: String,
    pub last_name: String,
    pub details: NotificationDetails,
}

/// How the recipient of a sendable is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient<'a> {
    /// Resolved by the adapter from the user record.
    User(&'a UserId),
    /// Carried on the notification itself.
    Direct {
        email_or_phone: &'a str,
        first_name: &'a str,
        last_name: &'a str,
    },
}

impl Recipient<'_> {
    /// Address carried on the notification, if any.
    pub fn direct_address(&self) -> Option<&str> {
        match self {
            Recipient::User(_) => None,
            Recipient::Direct { email_or_phone, .. } => Some(email_or_phone),
        }
    }
}

/// Either kind of notification, as handled by backends, adapters and renderers.
#[derive(Debug, Clone)]
pub enum Sendable {
    Notification(Notification),
    OneOff(OneOffNotification),
}

impl Sendable {
    pub fn id(&self) -> &NotificationId {
        match self {
            Sendable::Notification(n) => &n.id,
            Sendable::OneOff(n) => &n.id,
        }
    }

    pub fn details(&self) -> &NotificationDetails {
        match self {
            Sendable::Notification(n) => &n.details,
            Sendable::OneOff(n) => &n.details,
        }
    }

    pub fn details_mut(&mut self) -> &mut NotificationDetails {
        match self {
            Sendable::Notification(n) => &mut n.details,
            Sendable::OneOff(n) => &mut n.details,
        }
    }

    pub fn recipient(&self) -> Recipient<'_> {
        match self {
            Sendable::Notification(n) => Recipient::User(&n.user_id),
            Sendable::OneOff(n) => Recipient::Direct {
                email_or_phone: &n.email_or_phone,
                first_name: &n.first_name,
                last_name: &n.last_name,
            },
        }
    }

    pub fn status(&self) -> NotificationStatus {
        self.details().status
    }

    pub fn notification_type(&self) -> NotificationType {
        self.details().notification_type
    }

    pub fn attachments(&self) -> &[StoredAttachment] {
        &self.details().attachments
    }

    pub fn is_one_off(&self) -> bool {
        matches!(self, Sendable::OneOff(_))
    }

    pub fn into_notification(self) -> Option<Notification> {
        match self {
            Sendable::Notification(n) => Some(n),
            Sendable::OneOff(_) => None,
        }
    }

    pub fn into_one_off(self) -> Option<OneOffNotification> {
        match self {
            Sendable::OneOff(n) => Some(n),
            Sendable::Notification(_) => None,
        }
    }
}

impl From<Notification> for Sendable {
    fn from(value: Notification) -> Self {
        Sendable::Notification(value)
    }
}

impl From<OneOffNotification> for Sendable {
    fn from(value: OneOffNotification) -> Self {
        Sendable::OneOff(value)
    }
}

/// Direct recipient of a one-off notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOffRecipient {
    pub email_or_phone: String,
    pub first_name: String,
    pub last_name: String,
}

impl OneOffRecipient {
    pub fn new(
        email_or_phone: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email_or_phone: email_or_phone.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// A validated notification with its attachments already stored, ready to persist.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub body_template: String,
    pub subject_template: String,
    pub preheader_template: String,
    pub context_name: String,
    pub context_kwargs: ContextKwargs,
    pub send_after: Option<DateTime<Utc>>,
    pub adapter_extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub attachments: Vec<StoredAttachment>,
}

/// Resolved partial update handed to the backend.
///
/// `None` leaves a field untouched; `send_after: Some(None)` clears the schedule.
#[derive(Debug, Clone, Default)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub body_template: Option<String>,
    pub subject_template: Option<String>,
    pub preheader_template: Option<String>,
    pub context_name: Option<String>,
    pub context_kwargs: Option<ContextKwargs>,
    pub send_after: Option<Option<DateTime<Utc>>>,
    pub adapter_extra_parameters: Option<serde_json::Map<String, serde_json::Value>>,
    pub add_attachments: Vec<StoredAttachment>,
    pub error_message: Option<String>,
}

impl NotificationPatch {
    /// Apply the patch in place. Status is never changed.
    pub fn apply_to(self, details: &mut NotificationDetails, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            details.title = title;
        }
        if let Some(body_template) = self.body_template {
            details.body_template = body_template;
        }
        if let Some(subject_template) = self.subject_template {
            details.subject_template = subject_template;
        }
        if let Some(preheader_template) = self.preheader_template {
            details.preheader_template = preheader_template;
        }
        if let Some(context_name) = self.context_name {
            details.context_name = context_name;
        }
        if let Some(context_kwargs) = self.context_kwargs {
            details.context_kwargs = context_kwargs;
        }
        if let Some(send_after) = self.send_after {
            details.send_after = send_after;
        }
        if let Some(params) = self.adapter_extra_parameters {
            details.adapter_extra_parameters = Some(params);
        }
        details.attachments.extend(self.add_attachments);
        if let Some(error_message) = self.error_message {
            details.error_message = Some(error_message);
        }
        details.updated_at = now;
    }
}
