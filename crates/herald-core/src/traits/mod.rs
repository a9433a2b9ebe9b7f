// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the orchestration engine.
//!
//! Backends and adapters come in a blocking and an async flavor. Async
//! variants use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod backend;
pub mod renderer;

pub use adapter::{AdapterInfo, AsyncNotificationAdapter, NotificationAdapter};
pub use backend::{AsyncNotificationBackend, NotificationBackend};
pub use renderer::{RenderedNotification, TemplateRenderer};
