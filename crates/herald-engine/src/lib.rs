// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification orchestration engines.
//!
//! [`NotificationService`] runs every collaborator call on the calling
//! thread; [`AsyncNotificationService`] awaits each one on the caller's
//! runtime without spawning tasks. Both delegate validation, transition
//! and outcome rules to the shared [`machine`] module, so they behave the
//! same apart from how they wait.
//!
//! Adapters flagged as background treat `send` as a hand-off to their own
//! queue; the pass records the notification `SENT` and a worker completes
//! delivery through `delayed_send`.
//!
//! A notification is created `PENDING` with its context name and arguments
//! only. The context is generated at send time, right before rendering, by
//! the generator registered under that name.

pub mod blocking;
pub mod machine;
pub mod service;

pub use blocking::NotificationService;
pub use machine::{DispatchOutcome, DispatchSummary};
pub use service::AsyncNotificationService;

use herald_config::HeraldConfig;
use herald_core::HeraldError;

/// Engines refuse a configuration that `load_and_validate_*` would reject.
fn check_config(config: &HeraldConfig) -> Result<(), HeraldError> {
    herald_config::validation::validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        HeraldError::Config(messages.join("; "))
    })
}
