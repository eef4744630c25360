// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of Gateway API resources into derived resources.
//!
//! # Reconciliation Architecture
//!
//! Every reconciler is level-triggered and keeps no state between invocations:
//!
//! 1. **Read** - Load the resource, its class and the class configuration
//! 2. **Build** - Compute every derived resource, owner reference included
//! 3. **Apply** - Create or update each derived resource, skipping unchanged ones
//! 4. **Status** - Report configuration problems on the `GatewayClass`
//!
//! Scheduling, per-object serialization and retry backoff belong to the
//! dispatcher (`kube::runtime::Controller` in the binary).
//!
//! # Available Reconcilers
//!
//! - [`reconcile_gateway`] - Derives the shadow gateway and templated children
//! - [`reconcile_httproute`] - Copies routes onto the shadow gateway
//! - [`reconcile_gatewayclass`] - Reports whether a class's configuration is usable
//!
//! # Example: Using a Reconciler
//!
//! ```rust,no_run
//! use cloud_gateway_controller::config::EngineConfig;
//! use cloud_gateway_controller::context::Context;
//! use cloud_gateway_controller::reconcilers::reconcile_gateway;
//! use cloud_gateway_controller::store::KubeStore;
//! use std::sync::Arc;
//!
//! async fn reconcile(client: kube::Client) {
//!     let ctx = Context::new(Arc::new(KubeStore::new(client)), EngineConfig::default());
//!     let outcome = reconcile_gateway(&ctx, "foo-ns", "foo-gateway").await;
//!     println!("{outcome:?}");
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use kube::Resource;

use crate::errors::ReconcileError;

pub mod builder;
pub mod class;
pub mod gateway;
pub mod gatewayclass;
pub mod gvr;
pub mod httproute;
pub mod resources;
pub mod retry;
pub mod status;
pub mod template;

#[cfg(test)]
mod fixtures;

pub use gateway::{reconcile_gateway, ApplySummary, ReconcileOutcome, ReconcilePhase, SkipReason};
pub use gatewayclass::reconcile_gatewayclass;
pub use httproute::reconcile_httproute;

/// Message of the `Accepted=True` class condition.
pub const ACCEPTED_MESSAGE: &str = "GatewayClass configuration is valid";

/// Run `reconcile` with a deadline.
///
/// When the deadline elapses the future is dropped at its current await point,
/// so no further store calls are made for this invocation.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] on timeout, or the error of `reconcile`.
pub async fn with_deadline<T, F>(timeout: Duration, reconcile: F) -> Result<T, ReconcileError>
where
    F: Future<Output = Result<T, ReconcileError>>,
{
    match tokio::time::timeout(timeout, reconcile).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ReconcileError::Cancelled(timeout)),
    }
}

/// Whether `resource`'s controller owner reference points at an object of `kind`.
///
/// Derived gateways are controlled by a `Gateway` and derived routes by an
/// `HTTPRoute`; both are excluded from further derivation.
#[must_use]
pub fn is_controlled_by_kind<K: Resource>(resource: &K, kind: &str) -> bool {
    resource
        .meta()
        .owner_references
        .as_ref()
        .is_some_and(|owners| {
            owners
                .iter()
                .any(|o| o.controller == Some(true) && o.kind == kind)
        })
}
