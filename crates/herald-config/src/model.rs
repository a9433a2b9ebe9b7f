// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Herald notification engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration, passed explicitly to the engines.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Dispatch pass settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Attachment resolution settings.
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Upper bound on notifications handled by one `send_pending_notifications`
    /// call. Unset means the whole due set.
    #[serde(default)]
    pub max_notifications_per_pass: Option<usize>,
}

/// Attachment download and size limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentConfig {
    /// Largest attachment accepted from any source, in bytes.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// `User-Agent` header sent with attachment downloads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Path-style S3-compatible endpoint. Unset uses
    /// `https://<bucket>.s3.amazonaws.com`.
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    #[serde(default = "default_gcs_endpoint")]
    pub gcs_endpoint: String,

    /// Path-style Azure Blob endpoint (e.g. an emulator). Unset uses
    /// `https://<account>.blob.core.windows.net`.
    #[serde(default)]
    pub azure_endpoint: Option<String>,
}

impl AttachmentConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            download_timeout_secs: default_download_timeout_secs(),
            user_agent: default_user_agent(),
            s3_endpoint: None,
            gcs_endpoint: default_gcs_endpoint(),
            azure_endpoint: None,
        }
    }
}

fn default_max_size_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("herald/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_gcs_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}
