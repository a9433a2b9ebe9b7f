// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides in-memory collaborators for fast, deterministic tests without
//! external services.
//!
//! # Components
//!
//! - [`MemoryBackend`] - Backend implementing both the blocking and async traits
//! - [`RecordingAdapter`] - Adapter capturing every delivery (optionally failing)
//! - [`FakeRenderer`] - `{{placeholder}}` substitution renderer
//! - [`ManualClock`] - Clock that only moves when told to

pub mod clock;
pub mod memory_backend;
pub mod recording_adapter;
pub mod renderer;

pub use clock::ManualClock;
pub use memory_backend::{MemoryAttachmentFile, MemoryBackend};
pub use recording_adapter::{Delivery, RecordingAdapter};
pub use renderer::FakeRenderer;
