// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald notification engine.
//!
//! This crate provides the shared data model, error taxonomy, and the
//! collaborator traits (backends, adapters, renderers, attachment files,
//! clocks) that the engine orchestrates.

pub mod attachment;
pub mod clock;
pub mod context;
pub mod error;
pub mod request;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use attachment::{
    AttachmentFile, AttachmentSource, NotificationAttachment, ResolvedAttachment,
    StoredAttachment,
};
pub use clock::{Clock, SystemClock};
pub use context::{ContextFlavor, ContextKwargs, NotificationContext};
pub use error::{BoxError, HeraldError};
pub use request::{NotificationRequest, NotificationUpdate};
pub use types::{
    AttachmentId, NewNotification, Notification, NotificationDetails, NotificationId,
    NotificationPatch, NotificationStatus, NotificationType, OneOffNotification, OneOffRecipient,
    Page, Recipient, Sendable, UserId,
};

pub use traits::{
    AdapterInfo, AsyncNotificationAdapter, AsyncNotificationBackend, NotificationAdapter,
    NotificationBackend, RenderedNotification, TemplateRenderer,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn notification_type_has_four_channels() {
        for name in ["EMAIL", "SMS", "PUSH", "IN_APP"] {
            let parsed = NotificationType::from_str(name).unwrap();
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&NotificationStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        let back: NotificationStatus = serde_json::from_str("\"READ\"").unwrap();
        assert_eq!(back, NotificationStatus::Read);
    }
}
