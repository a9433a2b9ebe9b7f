// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of named context generators.
//!
//! Notifications store only a context name and its keyword arguments. The
//! generator bound to that name runs at send time to produce the variables
//! the templates are rendered with. Blocking and async generators live in
//! separate namespaces so each engine only ever runs generators of its own
//! execution model.

pub mod generator;
pub mod registry;

pub use generator::{AsyncContextGenerator, ContextGenerator};
pub use registry::{register_async_context, register_context, ContextRegistry};
