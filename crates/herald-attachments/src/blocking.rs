// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking attachment resolver, used by the blocking engine.

use std::io;
use std::path::Path;

use bytes::Bytes;
use herald_config::AttachmentConfig;
use herald_core::{AttachmentSource, HeraldError, NotificationAttachment, ResolvedAttachment};
use tracing::debug;

use crate::location::http_url;
use crate::payload::{check_size, read_limited, AttachmentMeta};

/// Resolves attachments on the calling thread.
///
/// Must not be constructed or dropped inside an async runtime; use
/// [`AsyncAttachmentResolver`](crate::AsyncAttachmentResolver) there.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    client: reqwest::blocking::Client,
    config: AttachmentConfig,
}

impl AttachmentResolver {
    pub fn new(config: &AttachmentConfig) -> Result<Self, HeraldError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.download_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HeraldError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Resolve attachments in order, stopping at the first failure.
    pub fn resolve_all(
        &self,
        attachments: Vec<NotificationAttachment>,
    ) -> Result<Vec<ResolvedAttachment>, HeraldError> {
        attachments
            .into_iter()
            .map(|attachment| self.resolve(attachment))
            .collect()
    }

    pub fn resolve(
        &self,
        attachment: NotificationAttachment,
    ) -> Result<ResolvedAttachment, HeraldError> {
        let NotificationAttachment {
            file,
            filename,
            content_type,
            description,
            is_inline,
        } = attachment;
        let meta = AttachmentMeta::new(&file, filename, content_type, description, is_inline)?;
        let limit = self.config.max_size_bytes;

        let data = match file {
            AttachmentSource::Path(path) => self.read_path(&path)?,
            AttachmentSource::Url(url) => self.download(&url)?,
            AttachmentSource::Bytes(data) => {
                check_size(data.len() as u64, limit)?;
                data
            }
            AttachmentSource::Reader(reader) => read_limited(reader, limit)?,
        };

        let resolved = meta.finish(data);
        debug!(
            filename = %resolved.filename,
            content_type = %resolved.content_type,
            size = resolved.size,
            "resolved attachment"
        );
        Ok(resolved)
    }

    fn read_path(&self, path: &Path) -> Result<Bytes, HeraldError> {
        let metadata = std::fs::metadata(path).map_err(|e| path_error(path, e))?;
        if !metadata.is_file() {
            return Err(HeraldError::AttachmentFileNotFound {
                path: path.to_path_buf(),
            });
        }
        check_size(metadata.len(), self.config.max_size_bytes)?;
        let file = std::fs::File::open(path).map_err(|e| path_error(path, e))?;
        read_limited(file, self.config.max_size_bytes)
    }

    fn download(&self, location: &str) -> Result<Bytes, HeraldError> {
        let target = http_url(location, &self.config)?;
        debug!(url = %target, "downloading attachment");
        let response = self
            .client
            .get(target)
            .send()
            .map_err(|e| download_error(location, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeraldError::AttachmentDownload {
                url: location.to_string(),
                message: format!("server responded with {status}"),
                status: Some(status.as_u16()),
            });
        }
        if let Some(len) = response.content_length() {
            check_size(len, self.config.max_size_bytes)?;
        }

        read_limited(response, self.config.max_size_bytes).map_err(|err| match err {
            HeraldError::AttachmentRead { source } => HeraldError::AttachmentDownload {
                url: location.to_string(),
                message: format!("failed to read response body: {source}"),
                status: None,
            },
            other => other,
        })
    }
}

pub(crate) fn path_error(path: &Path, err: io::Error) -> HeraldError {
    if err.kind() == io::ErrorKind::NotFound {
        HeraldError::AttachmentFileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        HeraldError::AttachmentRead { source: err }
    }
}

pub(crate) fn download_error(location: &str, err: &reqwest::Error) -> HeraldError {
    HeraldError::AttachmentDownload {
        url: location.to_string(),
        message: err.to_string(),
        status: err.status().map(|s| s.as_u16()),
    }
}
