// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generator traits, implemented for plain functions and closures.

use std::future::Future;

use async_trait::async_trait;
use herald_core::{BoxError, ContextKwargs, NotificationContext};

/// A blocking function from keyword arguments to a rendering context.
pub trait ContextGenerator: Send + Sync {
    fn generate(&self, kwargs: &ContextKwargs) -> Result<NotificationContext, BoxError>;
}

impl<F> ContextGenerator for F
where
    F: Fn(&ContextKwargs) -> Result<NotificationContext, BoxError> + Send + Sync,
{
    fn generate(&self, kwargs: &ContextKwargs) -> Result<NotificationContext, BoxError> {
        self(kwargs)
    }
}

/// An async function from keyword arguments to a rendering context.
#[async_trait]
pub trait AsyncContextGenerator: Send + Sync {
    async fn generate(&self, kwargs: &ContextKwargs) -> Result<NotificationContext, BoxError>;
}

#[async_trait]
impl<F, Fut> AsyncContextGenerator for F
where
    F: Fn(ContextKwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<NotificationContext, BoxError>> + Send + 'static,
{
    async fn generate(&self, kwargs: &ContextKwargs) -> Result<NotificationContext, BoxError> {
        self(kwargs.clone()).await
    }
}
