// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns caller-supplied attachments into fully materialized payloads.
//!
//! Every input kind (filesystem path, `http`/`https` URL, `s3`/`gs`/`azure`
//! object URL, byte buffer, open reader) is read to the end, its content type
//! decided, and a SHA-256 checksum computed. Nothing is written to durable
//! storage here; the backend stores the [`ResolvedAttachment`]s.
//!
//! [`ResolvedAttachment`]: herald_core::ResolvedAttachment

pub mod blocking;
pub mod location;
pub mod payload;
pub mod resolver;

pub use blocking::AttachmentResolver;
pub use location::http_url;
pub use payload::{checksum, content_type_for, DEFAULT_CONTENT_TYPE};
pub use resolver::AsyncAttachmentResolver;
