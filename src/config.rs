// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Engine configuration injected at construction time.
//!
//! The controller identity is not a package-level constant: every comparison
//! against `GatewayClass.spec.controllerName` goes through [`EngineConfig`], so a
//! second instance of the engine can claim a different set of classes.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CONFLICT_RETRIES, DEFAULT_CONTROLLER_NAME, DEFAULT_RECONCILE_TIMEOUT_SECS,
};

/// Settings shared by every reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Identity matched against `GatewayClass.spec.controllerName`.
    pub controller_name: String,

    /// Field manager used for every write (server-side apply ownership).
    pub field_manager: String,

    /// Deadline for a single reconcile invocation.
    pub reconcile_timeout: Duration,

    /// Attempts for a single optimistic-concurrency write before giving up.
    pub conflict_retries: u32,
}

impl EngineConfig {
    /// Configuration claiming classes for `controller_name`, with defaults for the rest.
    ///
    /// The field manager defaults to the controller name.
    #[must_use]
    pub fn new(controller_name: impl Into<String>) -> Self {
        let controller_name = controller_name.into();
        Self {
            field_manager: controller_name.clone(),
            controller_name,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Override the field manager.
    #[must_use]
    pub fn with_field_manager(mut self, field_manager: impl Into<String>) -> Self {
        self.field_manager = field_manager.into();
        self
    }

    /// Override the per-invocation deadline.
    #[must_use]
    pub fn with_reconcile_timeout(mut self, timeout: Duration) -> Self {
        self.reconcile_timeout = timeout;
        self
    }

    /// Override the number of conflict retries. At least one attempt is always made.
    #[must_use]
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries.max(1);
        self
    }

    /// Whether a class naming `controller_name` is claimed by this engine.
    #[must_use]
    pub fn claims(&self, controller_name: &str) -> bool {
        self.controller_name == controller_name
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROLLER_NAME)
    }
}
