// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use herald_context::ContextRegistry;
use herald_core::{
    BoxError, ContextKwargs, NotificationContext, NotificationRequest, NotificationType,
};

pub const WELCOME: &str = "welcome_ctx";
pub const ALWAYS_FAILS: &str = "broken_ctx";

/// Counts generator invocations.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn welcome_context(kwargs: &ContextKwargs) -> NotificationContext {
    let first_name = kwargs
        .get("first_name")
        .and_then(|v| v.as_str())
        .unwrap_or("friend")
        .to_string();
    NotificationContext::new()
        .with("first_name", first_name)
        .with("product", "Herald")
}

/// Registry with blocking generators `welcome_ctx` (counted) and `broken_ctx`.
pub fn blocking_registry(calls: &Calls) -> Arc<ContextRegistry> {
    let registry = Arc::new(ContextRegistry::new());
    let counter = calls.clone();
    registry
        .register(WELCOME, move |kwargs: &ContextKwargs| {
            counter.bump();
            Ok(welcome_context(kwargs))
        })
        .unwrap();
    registry
        .register(ALWAYS_FAILS, |_: &ContextKwargs| {
            Err::<NotificationContext, BoxError>("profile service unavailable".into())
        })
        .unwrap();
    registry
}

/// Registry with async generators `welcome_ctx` (counted) and `broken_ctx`.
pub fn async_registry(calls: &Calls) -> Arc<ContextRegistry> {
    let registry = Arc::new(ContextRegistry::new());
    let counter = calls.clone();
    registry
        .register_async(WELCOME, move |kwargs: ContextKwargs| {
            let counter = counter.clone();
            async move {
                counter.bump();
                Ok::<_, BoxError>(welcome_context(&kwargs))
            }
        })
        .unwrap();
    registry
        .register_async(ALWAYS_FAILS, |_: ContextKwargs| async {
            Err::<NotificationContext, BoxError>("profile service unavailable".into())
        })
        .unwrap();
    registry
}

pub fn welcome_request(notification_type: NotificationType) -> NotificationRequest {
    NotificationRequest::new(
        notification_type,
        "Welcome",
        "Hello {{first_name}}, welcome to {{product}}!",
        WELCOME,
    )
    .subject_template("Welcome aboard, {{first_name}}")
    .context_kwarg("first_name", "Ada")
}
