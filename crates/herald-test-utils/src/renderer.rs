// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder-substitution renderer for tests.

use herald_core::{HeraldError, NotificationContext, RenderedNotification, Sendable, TemplateRenderer};

/// Treats template identifiers as inline templates and replaces
/// `{{key}}` with the context value under `key`.
///
/// Leftover placeholders are a render error. Empty subject and preheader
/// templates render to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeRenderer;

impl FakeRenderer {
    fn fill(template: &str, context: &NotificationContext) -> Result<String, HeraldError> {
        let mut out = template.to_string();
        for (key, value) in &context.0 {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{{{{{key}}}}}"), &rendered);
        }
        if let Some(start) = out.find("{{") {
            let name = out[start + 2..]
                .split("}}")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            return Err(HeraldError::Render {
                message: format!("no value for placeholder `{name}`"),
                source: None,
            });
        }
        Ok(out)
    }

    fn fill_optional(
        template: &str,
        context: &NotificationContext,
    ) -> Result<Option<String>, HeraldError> {
        if template.is_empty() {
            Ok(None)
        } else {
            Self::fill(template, context).map(Some)
        }
    }
}

impl TemplateRenderer for FakeRenderer {
    fn render(
        &self,
        notification: &Sendable,
        context: &NotificationContext,
    ) -> Result<RenderedNotification, HeraldError> {
        let details = notification.details();
        Ok(RenderedNotification {
            body: Self::fill(&details.body_template, context)?,
            subject: Self::fill_optional(&details.subject_template, context)?,
            preheader: Self::fill_optional(&details.preheader_template, context)?,
        })
    }
}
