// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The context registry and its process-wide instance.

use std::future::Future;
use std::sync::{Arc, LazyLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use herald_core::{BoxError, ContextFlavor, ContextKwargs, HeraldError, NotificationContext};
use tracing::debug;

use crate::generator::{AsyncContextGenerator, ContextGenerator};

static GLOBAL: LazyLock<Arc<ContextRegistry>> = LazyLock::new(|| Arc::new(ContextRegistry::new()));

/// Named generators, split by execution model.
///
/// A name may be bound at most once per namespace; re-registration fails and
/// leaves the first generator active.
#[derive(Default)]
pub struct ContextRegistry {
    blocking: DashMap<String, Arc<dyn ContextGenerator>>,
    asynchronous: DashMap<String, Arc<dyn AsyncContextGenerator>>,
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("blocking", &self.names(ContextFlavor::Blocking))
            .field("async", &self.names(ContextFlavor::Async))
            .finish()
    }
}

impl ContextRegistry {
    /// Create an empty, private registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ContextRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Bind a blocking generator function under `name`.
    pub fn register<F>(&self, name: impl Into<String>, generator: F) -> Result<(), HeraldError>
    where
        F: Fn(&ContextKwargs) -> Result<NotificationContext, BoxError> + Send + Sync + 'static,
    {
        self.register_generator(name, Arc::new(generator))
    }

    /// Bind an async generator function under `name`.
    pub fn register_async<F, Fut>(
        &self,
        name: impl Into<String>,
        generator: F,
    ) -> Result<(), HeraldError>
    where
        F: Fn(ContextKwargs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NotificationContext, BoxError>> + Send + 'static,
    {
        self.register_async_generator(name, Arc::new(generator))
    }

    pub fn register_generator(
        &self,
        name: impl Into<String>,
        generator: Arc<dyn ContextGenerator>,
    ) -> Result<(), HeraldError> {
        let name = name.into();
        match self.blocking.entry(name) {
            Entry::Occupied(entry) => Err(HeraldError::DuplicateContextName {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                debug!(context = %entry.key(), flavor = "blocking", "registered context generator");
                entry.insert(generator);
                Ok(())
            }
        }
    }

    pub fn register_async_generator(
        &self,
        name: impl Into<String>,
        generator: Arc<dyn AsyncContextGenerator>,
    ) -> Result<(), HeraldError> {
        let name = name.into();
        match self.asynchronous.entry(name) {
            Entry::Occupied(entry) => Err(HeraldError::DuplicateContextName {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                debug!(context = %entry.key(), flavor = "async", "registered context generator");
                entry.insert(generator);
                Ok(())
            }
        }
    }

    /// Check that `name` can be resolved by an engine of the given flavor.
    pub fn ensure_registered(&self, name: &str, flavor: ContextFlavor) -> Result<(), HeraldError> {
        if self.contains(name, flavor) {
            return Ok(());
        }
        let other = match flavor {
            ContextFlavor::Blocking => ContextFlavor::Async,
            ContextFlavor::Async => ContextFlavor::Blocking,
        };
        if self.contains(name, other) {
            Err(HeraldError::ContextFlavorMismatch {
                name: name.to_string(),
                registered: other,
                requested: flavor,
            })
        } else {
            Err(HeraldError::ContextNotRegistered {
                name: name.to_string(),
            })
        }
    }

    pub fn contains(&self, name: &str, flavor: ContextFlavor) -> bool {
        match flavor {
            ContextFlavor::Blocking => self.blocking.contains_key(name),
            ContextFlavor::Async => self.asynchronous.contains_key(name),
        }
    }

    /// Run the blocking generator bound to `name`.
    pub fn get_context(
        &self,
        name: &str,
        kwargs: &ContextKwargs,
    ) -> Result<NotificationContext, HeraldError> {
        self.ensure_registered(name, ContextFlavor::Blocking)?;
        // Clone out of the map so the shard lock is not held while the generator runs.
        let generator = self
            .blocking
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| HeraldError::ContextNotRegistered {
                name: name.to_string(),
            })?;
        debug!(context = name, "generating context");
        generator
            .generate(kwargs)
            .map_err(|source| HeraldError::ContextGeneration {
                name: name.to_string(),
                source,
            })
    }

    /// Run the async generator bound to `name`.
    pub async fn get_context_async(
        &self,
        name: &str,
        kwargs: &ContextKwargs,
    ) -> Result<NotificationContext, HeraldError> {
        self.ensure_registered(name, ContextFlavor::Async)?;
        let generator = self
            .asynchronous
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| HeraldError::ContextNotRegistered {
                name: name.to_string(),
            })?;
        debug!(context = name, "generating context");
        generator
            .generate(kwargs)
            .await
            .map_err(|source| HeraldError::ContextGeneration {
                name: name.to_string(),
                source,
            })
    }

    /// Registered names in one namespace, sorted.
    pub fn names(&self, flavor: ContextFlavor) -> Vec<String> {
        let mut names: Vec<String> = match flavor {
            ContextFlavor::Blocking => self.blocking.iter().map(|e| e.key().clone()).collect(),
            ContextFlavor::Async => self.asynchronous.iter().map(|e| e.key().clone()).collect(),
        };
        names.sort();
        names
    }

    /// Remove every generator from both namespaces.
    pub fn reset(&self) {
        self.blocking.clear();
        self.asynchronous.clear();
    }
}

/// Bind a blocking generator in the process-wide registry.
pub fn register_context<F>(name: impl Into<String>, generator: F) -> Result<(), HeraldError>
where
    F: Fn(&ContextKwargs) -> Result<NotificationContext, BoxError> + Send + Sync + 'static,
{
    GLOBAL.register(name, generator)
}

/// Bind an async generator in the process-wide registry.
pub fn register_async_context<F, Fut>(
    name: impl Into<String>,
    generator: F,
) -> Result<(), HeraldError>
where
    F: Fn(ContextKwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<NotificationContext, BoxError>> + Send + 'static,
{
    GLOBAL.register_async(name, generator)
}
