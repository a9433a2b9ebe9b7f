// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering contract.

use serde::{Deserialize, Serialize};

use crate::context::NotificationContext;
use crate::error::HeraldError;
use crate::types::Sendable;

/// Output of rendering a notification's templates against its context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNotification {
    pub body: String,
    pub subject: Option<String>,
    pub preheader: Option<String>,
}

/// Resolves template identifiers to content and renders them.
pub trait TemplateRenderer: Send + Sync {
    fn render(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<RenderedNotification, HeraldError>;
}
