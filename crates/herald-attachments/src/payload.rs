// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Naming, typing, size limits and checksums shared by both resolvers.

use std::io::Read;

use bytes::Bytes;
use herald_core::{AttachmentSource, HeraldError, ResolvedAttachment};
use sha2::{Digest, Sha256};

/// Content type used when the filename extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Stored name for attachments that carry a content type but no filename.
const FALLBACK_FILENAME: &str = "attachment";

/// Lowercase hex SHA-256 of `data`.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Content type implied by a filename's extension.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Everything about an attachment except its bytes, decided before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttachmentMeta {
    pub filename: String,
    pub content_type: String,
    pub description: Option<String>,
    pub is_inline: bool,
}

impl AttachmentMeta {
    pub(crate) fn new(
        file: &AttachmentSource,
        filename: Option<String>,
        content_type: Option<String>,
        description: Option<String>,
        is_inline: bool,
    ) -> Result<Self, HeraldError> {
        let filename = filename
            .filter(|name| !name.trim().is_empty())
            .or_else(|| file.implied_filename());
        let content_type = content_type.filter(|ct| !ct.trim().is_empty());

        let (filename, content_type) = match (filename, content_type) {
            (Some(filename), Some(content_type)) => (filename, content_type),
            (Some(filename), None) => {
                let content_type = content_type_for(&filename);
                (filename, content_type)
            }
            (None, Some(content_type)) => (FALLBACK_FILENAME.to_string(), content_type),
            (None, None) => return Err(HeraldError::UnknownContentType),
        };

        Ok(Self {
            filename,
            content_type,
            description,
            is_inline,
        })
    }

    pub(crate) fn finish(self, data: Bytes) -> ResolvedAttachment {
        ResolvedAttachment {
            checksum: checksum(&data),
            size: data.len() as u64,
            filename: self.filename,
            content_type: self.content_type,
            data,
            description: self.description,
            is_inline: self.is_inline,
        }
    }
}

pub(crate) fn check_size(size: u64, limit: u64) -> Result<(), HeraldError> {
    if size > limit {
        Err(HeraldError::AttachmentTooLarge { limit })
    } else {
        Ok(())
    }
}

/// Read a stream to the end, failing once more than `limit` bytes arrive.
pub(crate) fn read_limited(reader: impl Read, limit: u64) -> Result<Bytes, HeraldError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|source| HeraldError::AttachmentRead { source })?;
    check_size(buf.len() as u64, limit)?;
    Ok(Bytes::from(buf))
}
