// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async attachment resolver, used by the async engine.

use std::path::Path;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use herald_config::AttachmentConfig;
use herald_core::{AttachmentSource, HeraldError, NotificationAttachment, ResolvedAttachment};
use tracing::debug;

use crate::blocking::{download_error, path_error};
use crate::location::http_url;
use crate::payload::{check_size, read_limited, AttachmentMeta};

/// Resolves attachments on the caller's runtime. No tasks are spawned.
#[derive(Debug, Clone)]
pub struct AsyncAttachmentResolver {
    client: reqwest::Client,
    config: AttachmentConfig,
}

impl AsyncAttachmentResolver {
    pub fn new(config: &AttachmentConfig) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
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
    pub async fn resolve_all(
        &self,
        attachments: Vec<NotificationAttachment>,
    ) -> Result<Vec<ResolvedAttachment>, HeraldError> {
        let mut resolved = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            resolved.push(self.resolve(attachment).await?);
        }
        Ok(resolved)
    }

    pub async fn resolve(
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
            AttachmentSource::Path(path) => self.read_path(&path).await?,
            AttachmentSource::Url(url) => self.download(&url).await?,
            AttachmentSource::Bytes(data) => {
                check_size(data.len() as u64, limit)?;
                data
            }
            // Caller-supplied readers are synchronous; they are drained in place.
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

    async fn read_path(&self, path: &Path) -> Result<Bytes, HeraldError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| path_error(path, e))?;
        if !metadata.is_file() {
            return Err(HeraldError::AttachmentFileNotFound {
                path: path.to_path_buf(),
            });
        }
        check_size(metadata.len(), self.config.max_size_bytes)?;
        let data = tokio::fs::read(path).await.map_err(|e| path_error(path, e))?;
        check_size(data.len() as u64, self.config.max_size_bytes)?;
        Ok(Bytes::from(data))
    }

    async fn download(&self, location: &str) -> Result<Bytes, HeraldError> {
        let target = http_url(location, &self.config)?;
        debug!(url = %target, "downloading attachment");
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| download_error(location, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HeraldError::AttachmentDownload {
                url: location.to_string(),
                message: format!("server responded with {status}"),
                status: Some(status.as_u16()),
            });
        }
        let limit = self.config.max_size_bytes;
        if let Some(len) = response.content_length() {
            check_size(len, limit)?;
        }

        let mut body = response.bytes_stream();
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| download_error(location, &e))?;
            check_size((buf.len() + chunk.len()) as u64, limit)?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}
