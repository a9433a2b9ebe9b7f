// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment inputs, resolved payloads, and stored references.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::HeraldError;
use crate::types::AttachmentId;

/// Where the bytes of an attachment come from.
pub enum AttachmentSource {
    /// A file on the local filesystem.
    Path(PathBuf),
    /// An `http`, `https`, `s3`, `gs` or `azure` URL.
    Url(String),
    /// An in-memory buffer.
    Bytes(Bytes),
    /// An already-open stream, read to the end on resolution.
    Reader(Box<dyn Read + Send>),
}

impl AttachmentSource {
    /// Classify a location string: anything with a `scheme://` prefix is a URL,
    /// everything else is a filesystem path.
    pub fn from_location(location: &str) -> Self {
        match location.split_once("://") {
            Some((scheme, _))
                if !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                AttachmentSource::Url(location.to_string())
            }
            _ => AttachmentSource::Path(PathBuf::from(location)),
        }
    }

    /// Last path or URL segment, used as a fallback filename.
    pub fn implied_filename(&self) -> Option<String> {
        let segment = match self {
            AttachmentSource::Path(path) => path.file_name()?.to_str()?.to_string(),
            AttachmentSource::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                let (_, rest) = without_query.split_once("://")?;
                let (_, path) = rest.split_once('/')?;
                path.rsplit('/').next()?.to_string()
            }
            AttachmentSource::Bytes(_) | AttachmentSource::Reader(_) => return None,
        };
        (!segment.is_empty()).then_some(segment)
    }
}

impl fmt::Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            AttachmentSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            AttachmentSource::Bytes(data) => write!(f, "Bytes({} bytes)", data.len()),
            AttachmentSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<PathBuf> for AttachmentSource {
    fn from(value: PathBuf) -> Self {
        AttachmentSource::Path(value)
    }
}

impl From<Bytes> for AttachmentSource {
    fn from(value: Bytes) -> Self {
        AttachmentSource::Bytes(value)
    }
}

impl From<Vec<u8>> for AttachmentSource {
    fn from(value: Vec<u8>) -> Self {
        AttachmentSource::Bytes(Bytes::from(value))
    }
}

/// An attachment as supplied by the caller, before resolution.
#[derive(Debug)]
pub struct NotificationAttachment {
    pub file: AttachmentSource,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub is_inline: bool,
}

impl NotificationAttachment {
    pub fn new(file: impl Into<AttachmentSource>) -> Self {
        Self {
            file: file.into(),
            filename: None,
            content_type: None,
            description: None,
            is_inline: false,
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as embedded in the message body rather than attached.
    pub fn inline(mut self) -> Self {
        self.is_inline = true;
        self
    }
}

/// Fully materialized attachment, ready to hand to the backend for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of `data`.
    pub checksum: String,
    pub data: Bytes,
    pub description: Option<String>,
    pub is_inline: bool,
}

/// Access to the bytes of a stored attachment, provided by the backend.
pub trait AttachmentFile: Send + Sync {
    fn read(&self) -> Result<Bytes, HeraldError>;

    fn stream(&self) -> Result<Box<dyn Read + Send>, HeraldError>;

    /// Temporary URL valid for `expires_in`, for storages that can mint one.
    fn url(&self, expires_in: Duration) -> Result<String, HeraldError>;

    fn delete(&self) -> Result<(), HeraldError>;
}

/// Reference to an attachment persisted by the backend.
#[derive(Clone)]
pub struct StoredAttachment {
    pub id: AttachmentId,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub is_inline: bool,
    pub storage_metadata: serde_json::Map<String, serde_json::Value>,
    pub file: Arc<dyn AttachmentFile>,
}

impl fmt::Debug for StoredAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredAttachment")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("checksum", &self.checksum)
            .field("is_inline", &self.is_inline)
            .finish_non_exhaustive()
    }
}
