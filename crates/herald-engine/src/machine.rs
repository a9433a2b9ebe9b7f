// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle rules shared by the blocking and async engines.
//!
//! Nothing here calls a backend, adapter or context generator. The engines
//! call these functions between collaborator calls to decide whether an
//! operation may proceed and what the final status of a dispatch attempt is,
//! so the blocking and async shells differ only in how they wait.

use std::ops::Deref;
use std::sync::LazyLock;

use herald_config::DispatchConfig;
use herald_core::{
    AdapterInfo, HeraldError, NewNotification, NotificationAttachment, NotificationContext,
    NotificationId, NotificationPatch, NotificationRequest, NotificationStatus, NotificationType,
    NotificationUpdate, OneOffRecipient, Sendable,
};
use regex::Regex;
use tracing::{debug, error, info, warn};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("phone pattern is valid"));

/// Check a one-off recipient address against the channel it will be sent on.
pub fn validate_target(
    recipient: &OneOffRecipient,
    notification_type: NotificationType,
) -> Result<(), HeraldError> {
    let target = recipient.email_or_phone.as_str();
    let invalid = |reason: &str| HeraldError::InvalidTarget {
        target: target.to_string(),
        notification_type,
        reason: reason.to_string(),
    };

    if target.trim().is_empty() {
        return Err(invalid("recipient must not be empty"));
    }

    match notification_type {
        NotificationType::Email => {
            if !EMAIL.is_match(target) {
                return Err(invalid("not a valid email address"));
            }
        }
        NotificationType::Sms => {
            let digits: String = target
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
                .collect();
            if !PHONE.is_match(&digits) {
                return Err(invalid("not a valid phone number"));
            }
        }
        NotificationType::Push | NotificationType::InApp => {
            if target.chars().any(char::is_whitespace) {
                return Err(invalid("device or inbox token must not contain whitespace"));
            }
        }
    }
    Ok(())
}

/// Split a request into the record to persist and the attachments still to resolve.
pub fn split_request(request: NotificationRequest) -> (NewNotification, Vec<NotificationAttachment>) {
    let NotificationRequest {
        notification_type,
        title,
        body_template,
        subject_template,
        preheader_template,
        context_name,
        context_kwargs,
        send_after,
        adapter_extra_parameters,
        attachments,
    } = request;
    (
        NewNotification {
            notification_type,
            title,
            body_template,
            subject_template,
            preheader_template,
            context_name,
            context_kwargs,
            send_after,
            adapter_extra_parameters,
            attachments: Vec::new(),
        },
        attachments,
    )
}

/// Split an update into the backend patch and the attachments still to resolve.
pub fn split_update(update: NotificationUpdate) -> (NotificationPatch, Vec<NotificationAttachment>) {
    let NotificationUpdate {
        title,
        body_template,
        subject_template,
        preheader_template,
        context_name,
        context_kwargs,
        send_after,
        adapter_extra_parameters,
        add_attachments,
        error_message,
    } = update;
    (
        NotificationPatch {
            title,
            body_template,
            subject_template,
            preheader_template,
            context_name,
            context_kwargs,
            send_after,
            adapter_extra_parameters,
            add_attachments: Vec::new(),
            error_message,
        },
        add_attachments,
    )
}

fn reject(notification: &Sendable, operation: &str) -> HeraldError {
    HeraldError::InvalidStatusTransition {
        id: notification.id().clone(),
        status: notification.status(),
        operation: operation.to_string(),
    }
}

/// Content changes need `PENDING`; administrative-only updates are always allowed.
pub fn ensure_updatable(
    notification: &Sendable,
    update: &NotificationUpdate,
) -> Result<(), HeraldError> {
    if update.touches_content() && !notification.status().is_pending() {
        return Err(reject(notification, "update"));
    }
    Ok(())
}

pub fn ensure_cancellable(notification: &Sendable) -> Result<(), HeraldError> {
    if notification
        .status()
        .can_transition_to(NotificationStatus::Cancelled)
    {
        Ok(())
    } else {
        Err(reject(notification, "cancel"))
    }
}

/// Explicit sends are allowed from every status except `CANCELLED`.
pub fn ensure_dispatchable(notification: &Sendable) -> Result<(), HeraldError> {
    if notification.status().is_dispatchable() {
        Ok(())
    } else {
        Err(reject(notification, "send"))
    }
}

pub fn ensure_readable(notification: &Sendable) -> Result<(), HeraldError> {
    if notification
        .status()
        .can_transition_to(NotificationStatus::Read)
    {
        Ok(())
    } else {
        Err(reject(notification, "mark as read"))
    }
}

/// Adapters whose channel matches, in configured order.
pub fn capable_adapters<A>(adapters: &[A], notification_type: NotificationType) -> Vec<&A>
where
    A: Deref,
    A::Target: AdapterInfo,
{
    adapters
        .iter()
        .filter(|adapter| adapter.notification_type() == notification_type)
        .collect()
}

/// Adapters that will attempt `notification`, or the failed verdict to
/// record when no adapter serves its channel.
pub fn route<'a, A>(adapters: &'a [A], notification: &Sendable) -> Result<Vec<&'a A>, Verdict>
where
    A: Deref,
    A::Target: AdapterInfo,
{
    let notification_type = notification.details().notification_type;
    let capable = capable_adapters(adapters, notification_type);
    if capable.is_empty() {
        warn!(notification_id = %notification.id(), %notification_type, "no adapter for channel");
        return Err(Verdict::failed(&HeraldError::NoAdapterForChannel { notification_type }));
    }
    Ok(capable)
}

/// Capable adapters that deliver through a background hand-off.
pub fn background_adapters<A>(adapters: &[A], notification_type: NotificationType) -> Vec<&A>
where
    A: Deref,
    A::Target: AdapterInfo,
{
    capable_adapters(adapters, notification_type)
        .into_iter()
        .filter(|adapter| adapter.is_background())
        .collect()
}

/// Keep at most `max_notifications_per_pass` of the due set.
pub fn limit_pass(pending: &mut Vec<Sendable>, dispatch: &DispatchConfig) {
    if let Some(limit) = dispatch.max_notifications_per_pass {
        pending.truncate(limit);
    }
    debug!(count = pending.len(), "starting dispatch pass");
}

/// Which adapter entry point a delivery goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// `send`: a regular delivery, or the hand-off of a background adapter.
    Direct,
    /// `delayed_send`: a background worker completing a hand-off.
    Delayed,
}

/// Final decision of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Every capable adapter delivered.
    Sent {
        context: NotificationContext,
        adapters: Vec<String>,
    },
    Failed { message: String },
}

impl Verdict {
    pub fn failed(err: &HeraldError) -> Self {
        Verdict::Failed {
            message: err.to_string(),
        }
    }

    /// Verdict for a context generator that failed before any adapter ran.
    pub fn context_failed(notification_id: &NotificationId, err: &HeraldError) -> Self {
        warn!(%notification_id, error = %err, "context generation failed");
        Self::failed(err)
    }

    pub fn status(&self) -> NotificationStatus {
        match self {
            Verdict::Sent { .. } => NotificationStatus::Sent,
            Verdict::Failed { .. } => NotificationStatus::Failed,
        }
    }
}

/// The delivery is already recorded as `SENT`, so a lost context snapshot
/// is only logged.
pub fn context_store_failed(notification_id: &NotificationId, err: &HeraldError) {
    warn!(%notification_id, error = %err, "failed to store context used");
}

/// Per-adapter results of one dispatch attempt.
#[derive(Debug)]
pub struct DeliveryTally {
    notification_id: NotificationId,
    delivered: Vec<String>,
    first_failure: Option<String>,
}

impl DeliveryTally {
    pub fn new(notification_id: &NotificationId) -> Self {
        Self {
            notification_id: notification_id.clone(),
            delivered: Vec::new(),
            first_failure: None,
        }
    }

    /// Record what one adapter returned. Later adapters still run after a failure.
    pub fn observe(&mut self, adapter: &str, result: Result<(), HeraldError>) {
        match result {
            Ok(()) => {
                debug!(notification_id = %self.notification_id, adapter, "delivered");
                self.delivered.push(adapter.to_string());
            }
            Err(e) => {
                warn!(
                    notification_id = %self.notification_id,
                    adapter,
                    error = %e,
                    "adapter failed to send notification"
                );
                if self.first_failure.is_none() {
                    self.first_failure = Some(e.to_string());
                }
            }
        }
    }

    /// `SENT` only if nothing failed; otherwise `FAILED` with the first error.
    pub fn verdict(self, context: NotificationContext) -> Verdict {
        match self.first_failure {
            Some(message) => Verdict::Failed { message },
            None => Verdict::Sent {
                context,
                adapters: self.delivered,
            },
        }
    }
}

/// Result of dispatching a single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub notification_id: NotificationId,
    /// Status of the record as the backend stored it.
    pub status: NotificationStatus,
    /// Adapters that delivered, in order. Empty when the attempt failed.
    pub delivered_by: Vec<String>,
    pub error: Option<String>,
}

impl DispatchOutcome {
    /// Outcome of `verdict` once the backend returned `record`.
    pub fn recorded(verdict: &Verdict, record: &Sendable) -> Self {
        let notification_id = record.id().clone();
        let status = record.status();
        match verdict {
            Verdict::Sent { adapters, .. } => {
                info!(%notification_id, %status, adapters = ?adapters, "notification sent");
                Self {
                    notification_id,
                    status,
                    delivered_by: adapters.clone(),
                    error: None,
                }
            }
            Verdict::Failed { message } => {
                info!(%notification_id, %status, error = %message, "notification failed");
                Self {
                    notification_id,
                    status,
                    delivered_by: Vec::new(),
                    error: Some(message.clone()),
                }
            }
        }
    }
}

/// Totals of one `send_pending_notifications` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    /// Notifications whose final status could not be recorded by the backend.
    pub errored: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchSummary {
    /// Fold the result of dispatching `notification` into the totals.
    ///
    /// An error means the backend rejected the final transition, so the
    /// outcome keeps the status the notification had when the pass began.
    pub fn absorb(&mut self, notification: &Sendable, result: Result<DispatchOutcome, HeraldError>) {
        let outcome = match result {
            Ok(outcome) => {
                match outcome.status {
                    NotificationStatus::Sent => self.sent += 1,
                    _ => self.failed += 1,
                }
                outcome
            }
            Err(e) => {
                error!(notification_id = %notification.id(), error = %e, "failed to record dispatch outcome");
                self.errored += 1;
                DispatchOutcome {
                    notification_id: notification.id().clone(),
                    status: notification.status(),
                    delivered_by: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        self.outcomes.push(outcome);
    }

    /// Log the totals and hand the summary back.
    pub fn finish(self) -> Self {
        info!(
            sent = self.sent,
            failed = self.failed,
            errored = self.errored,
            "dispatch pass complete"
        );
        self
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}
