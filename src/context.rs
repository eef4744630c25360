// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all reconcilers.
//!
//! Every controller receives an `Arc<Context>` holding:
//! - the [`ResourceStore`] used for every read and write
//! - the [`EngineConfig`] carrying the controller identity and write settings
//!
//! Reconcilers keep no state between invocations; everything they need is
//! re-read from the store through this context.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::store::ResourceStore;

/// Shared context passed to all reconcilers.
#[derive(Clone)]
pub struct Context {
    /// Declarative store capability
    pub store: Arc<dyn ResourceStore>,

    /// Engine identity and write settings
    pub config: EngineConfig,
}

impl Context {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }
}
