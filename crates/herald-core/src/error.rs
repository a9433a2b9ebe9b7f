// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald notification engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::context::ContextFlavor;
use crate::types::{NotificationId, NotificationStatus, NotificationType};

/// Boxed error used for collaborator failures (backends, adapters, generators).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Herald collaborator traits and engine operations.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// No generator is bound under the requested context name.
    #[error("no context generator registered under `{name}`")]
    ContextNotRegistered { name: String },

    /// A generator is already bound under this name in the same namespace.
    #[error("a context generator is already registered under `{name}`")]
    DuplicateContextName { name: String },

    /// The generator exists, but only for the other execution model.
    #[error("context `{name}` is registered for the {registered} engine but was requested by the {requested} engine")]
    ContextFlavorMismatch {
        name: String,
        registered: ContextFlavor,
        requested: ContextFlavor,
    },

    /// The generator ran and returned an error.
    #[error("context generator `{name}` failed: {source}")]
    ContextGeneration { name: String, source: BoxError },

    #[error("notification not found: {id}")]
    NotificationNotFound { id: NotificationId },

    /// The operation is not allowed for the notification's current status.
    #[error("cannot {operation} notification {id} while it is {status}")]
    InvalidStatusTransition {
        id: NotificationId,
        status: NotificationStatus,
        operation: String,
    },

    /// A one-off recipient is empty or malformed for the requested channel.
    #[error("invalid {notification_type} target `{target}`: {reason}")]
    InvalidTarget {
        target: String,
        notification_type: NotificationType,
        reason: String,
    },

    #[error("unknown notification type `{0}`")]
    InvalidNotificationType(String),

    #[error("attachment file not found: {}", path.display())]
    AttachmentFileNotFound { path: PathBuf },

    /// Reading a local file or caller-supplied stream failed.
    #[error("failed to read attachment: {source}")]
    AttachmentRead { source: std::io::Error },

    /// Remote attachment could not be fetched (non-2xx, network failure, bad scheme).
    #[error("failed to download attachment from {url}: {message}")]
    AttachmentDownload {
        url: String,
        message: String,
        status: Option<u16>,
    },

    #[error("attachment exceeds the {limit} byte limit")]
    AttachmentTooLarge { limit: u64 },

    /// Content type was omitted and there is no filename to infer it from.
    #[error("cannot infer attachment content type without a filename")]
    UnknownContentType,

    /// Stored attachment access or deletion failed.
    #[error("attachment storage error: {message}")]
    AttachmentStorage {
        message: String,
        source: Option<BoxError>,
    },

    /// A single adapter failed to deliver a notification.
    #[error("adapter `{adapter}` failed to send notification: {message}")]
    AdapterSend {
        adapter: String,
        message: String,
        source: Option<BoxError>,
    },

    #[error("template rendering failed: {message}")]
    Render {
        message: String,
        source: Option<BoxError>,
    },

    #[error("no adapter configured for {notification_type} notifications")]
    NoAdapterForChannel { notification_type: NotificationType },

    #[error("no in-app notification adapter configured")]
    NoInAppAdapter,

    /// Backend persistence failure (connection, query, serialization).
    #[error("backend error: {source}")]
    Backend { source: BoxError },
}

impl HeraldError {
    /// Wrap an arbitrary backend failure.
    pub fn backend(source: impl Into<BoxError>) -> Self {
        HeraldError::Backend {
            source: source.into(),
        }
    }

    /// Build an adapter transmission failure without an underlying source.
    pub fn adapter_send(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        HeraldError::AdapterSend {
            adapter: adapter.into(),
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transition_message_names_operation() {
        let err = HeraldError::InvalidStatusTransition {
            id: NotificationId::from("n-1"),
            status: NotificationStatus::Sent,
            operation: "update".into(),
        };
        assert_eq!(err.to_string(), "cannot update notification n-1 while it is SENT");
    }

    #[test]
    fn flavor_mismatch_message() {
        let err = HeraldError::ContextFlavorMismatch {
            name: "welcome".into(),
            registered: ContextFlavor::Async,
            requested: ContextFlavor::Blocking,
        };
        assert_eq!(
            err.to_string(),
            "context `welcome` is registered for the async engine but was requested by the blocking engine"
        );
    }

    #[test]
    fn adapter_send_message_names_adapter() {
        let err = HeraldError::adapter_send("smtp", "timeout");
        assert_eq!(err.to_string(), "adapter `smtp` failed to send notification: timeout");
        assert_eq!(
            HeraldError::backend("db down").to_string(),
            "backend error: db down"
        );
    }
}
