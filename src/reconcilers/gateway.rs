// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Gateway` reconciliation.
//!
//! One invocation walks a fixed sequence of phases:
//!
//! ```text
//! Fetched -> ClassResolved -> ConfigBound -> ChildrenBuilt -> Applied -> Done
//! ```
//!
//! A missing gateway, a missing class, a class owned by another controller and
//! a gateway this controller derived itself all end in [`ReconcileOutcome::Skipped`].
//! Any other problem ends the invocation with a [`ReconcileError`]; nothing is
//! retried here beyond the single-write conflict retry of the apply engine.
//! Children are applied independently: one that fails to apply does not stop
//! the others, and the first failure is returned once all were attempted.
//!
//! Configuration and template failures are also reported on the class as
//! `Accepted=False`, and a later successful reconcile sets it back to `True`.

use std::fmt;

use kube::ResourceExt;
use tracing::{debug, info, warn};

use crate::constants::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, KIND_GATEWAY};
use crate::context::Context;
use crate::crd::{Gateway, GatewayClass};
use crate::errors::ReconcileError;
use crate::reconcilers::builder::build_gateway_children;
use crate::reconcilers::class::{load_class_config, resolve_class, ClassResolution};
use crate::reconcilers::resources::{apply_derived, ApplyOutcome};
use crate::reconcilers::status::report_class_accepted;
use crate::reconcilers::{is_controlled_by_kind, with_deadline, ACCEPTED_MESSAGE};
use crate::status_reasons::REASON_ACCEPTED;
use crate::store::get_typed;

/// Progress of one gateway reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilePhase {
    Fetched,
    ClassResolved,
    ConfigBound,
    ChildrenBuilt,
    Applied,
    Done,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a reconciliation ended without doing anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The resource no longer exists.
    NotFound,
    /// The requested class does not exist.
    ClassNotFound,
    /// The class is implemented by another controller.
    NotOurs,
    /// The resource was derived by this controller from another one.
    DerivedResource,
    /// The route is already a reparented copy.
    AlreadyReparented,
    /// No parent reference of the route names a claimed gateway.
    NoClaimedParent,
}

/// Per-invocation write tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl ApplySummary {
    pub fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Updated => self.updated += 1,
            ApplyOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of writes the invocation performed.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}

/// Terminal state of a successful invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied(ApplySummary),
    Skipped(SkipReason),
}

fn enter(phase: ReconcilePhase, namespace: &str, name: &str) {
    debug!(namespace = %namespace, gateway = %name, phase = %phase, "Gateway reconcile phase");
}

/// Report a class-visible failure on the class, then hand the error back.
///
/// A failing status write is logged; the original error is what the caller sees.
async fn report_failure(ctx: &Context, class: &GatewayClass, err: ReconcileError) -> ReconcileError {
    if err.is_class_visible() {
        if let Err(status_err) = report_class_accepted(
            ctx.store.as_ref(),
            class,
            CONDITION_STATUS_FALSE,
            err.reason(),
            &err.to_string(),
            &ctx.config.field_manager,
        )
        .await
        {
            warn!(
                class = %class.name_any(),
                error = %status_err,
                "Failed to report GatewayClass condition"
            );
        }
    }
    err
}

/// Reconcile the gateway `namespace/name` under the configured deadline.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] if the deadline elapses, and any error
/// of the phases otherwise.
pub async fn reconcile_gateway(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    with_deadline(
        ctx.config.reconcile_timeout,
        reconcile_gateway_phases(ctx, namespace, name),
    )
    .await
}

async fn reconcile_gateway_phases(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let store = ctx.store.as_ref();

    let Some(gateway) = get_typed::<Gateway>(store, Some(namespace), name).await? else {
        debug!(namespace = %namespace, gateway = %name, "Gateway not found, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::NotFound));
    };
    enter(ReconcilePhase::Fetched, namespace, name);

    if is_controlled_by_kind(&gateway, KIND_GATEWAY) {
        debug!(namespace = %namespace, gateway = %name, "Gateway is a shadow gateway, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::DerivedResource));
    }

    let class_name = gateway.spec.gateway_class_name.clone();
    let class = match resolve_class(store, &ctx.config, &class_name).await? {
        ClassResolution::Claimed(class) => class,
        ClassResolution::NotOurs => {
            debug!(namespace = %namespace, gateway = %name, class = %class_name, "GatewayClass is not ours, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NotOurs));
        }
        ClassResolution::NotFound => {
            debug!(namespace = %namespace, gateway = %name, class = %class_name, "GatewayClass not found, skipping");
            return Ok(ReconcileOutcome::Skipped(SkipReason::ClassNotFound));
        }
    };
    enter(ReconcilePhase::ClassResolved, namespace, name);

    let config = match load_class_config(store, &class).await {
        Ok(config) => config,
        Err(e) => return Err(report_failure(ctx, &class, e).await),
    };
    enter(ReconcilePhase::ConfigBound, namespace, name);

    let children = match build_gateway_children(&gateway, &config) {
        Ok(children) => children,
        Err(e) => return Err(report_failure(ctx, &class, e).await),
    };
    enter(ReconcilePhase::ChildrenBuilt, namespace, name);

    let mut summary = ApplySummary::default();
    let mut first_error = None;
    for child in &children {
        match apply_derived(store, &ctx.config, child).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    gateway = %name,
                    kind = %child.kind(),
                    child = %child.name(),
                    error = %e,
                    "Failed to apply derived resource"
                );
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    enter(ReconcilePhase::Applied, namespace, name);

    report_class_accepted(
        store,
        &class,
        CONDITION_STATUS_TRUE,
        REASON_ACCEPTED,
        ACCEPTED_MESSAGE,
        &ctx.config.field_manager,
    )
    .await?;
    enter(ReconcilePhase::Done, namespace, name);

    if summary.writes() > 0 {
        info!(
            namespace = %namespace,
            gateway = %name,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "Reconciled derived resources"
        );
    }
    Ok(ReconcileOutcome::Applied(summary))
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod gateway_tests;
