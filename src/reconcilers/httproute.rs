// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `HTTPRoute` reparenting.
//!
//! A route attached to a claimed gateway is copied onto that gateway's shadow:
//! the copy is named `<route>-<secondaryClass>` and its only parent reference
//! names `<gateway>-<secondaryClass>`. Derived routes are never reparented
//! again, whether recognised by their controller owner, the source-route
//! annotation or the name suffix. The first two need no class configuration, so
//! a derived route is skipped even when its class configuration is broken.

use kube::ResourceExt;
use tracing::{debug, info};

use crate::constants::KIND_HTTP_ROUTE;
use crate::context::Context;
use crate::crd::{Gateway, GatewayClass, HTTPRoute, ParentReference};
use crate::document::to_dynamic;
use crate::errors::ReconcileError;
use crate::labels::SOURCE_ROUTE_ANNOTATION;
use crate::reconcilers::builder::{build_derived_route, ApplyStrategy, DerivedResource};
use crate::reconcilers::class::{load_class_config, resolve_class, ClassResolution};
use crate::reconcilers::gateway::{ApplySummary, ReconcileOutcome, SkipReason};
use crate::reconcilers::resources::apply_derived;
use crate::reconcilers::{is_controlled_by_kind, with_deadline};
use crate::store::{get_typed, ResourceStore};

/// Find the first parent reference of `route` naming a gateway whose class
/// this controller implements.
async fn claimed_parent<'a>(
    ctx: &Context,
    route: &'a HTTPRoute,
    route_namespace: &str,
) -> Result<Option<(&'a ParentReference, GatewayClass)>, ReconcileError> {
    let store: &dyn ResourceStore = ctx.store.as_ref();

    for parent_ref in route.spec.parent_refs.iter().filter(|r| r.targets_gateway()) {
        let namespace = parent_ref.namespace_or(route_namespace);
        let Some(gateway) = get_typed::<Gateway>(store, Some(namespace), &parent_ref.name).await?
        else {
            debug!(route = %route.name_any(), gateway = %parent_ref.name, "Parent gateway not found");
            continue;
        };
        if let ClassResolution::Claimed(class) =
            resolve_class(store, &ctx.config, &gateway.spec.gateway_class_name).await?
        {
            return Ok(Some((parent_ref, class)));
        }
    }
    Ok(None)
}

/// Reconcile the route `namespace/name` under the configured deadline.
///
/// # Errors
///
/// Returns [`ReconcileError::Cancelled`] if the deadline elapses, configuration
/// errors of the parent's class, and apply failures.
pub async fn reconcile_httproute(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    with_deadline(
        ctx.config.reconcile_timeout,
        reconcile_httproute_inner(ctx, namespace, name),
    )
    .await
}

async fn reconcile_httproute_inner(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let store = ctx.store.as_ref();

    let Some(route) = get_typed::<HTTPRoute>(store, Some(namespace), name).await? else {
        debug!(namespace = %namespace, route = %name, "HTTPRoute not found, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::NotFound));
    };
    if is_controlled_by_kind(&route, KIND_HTTP_ROUTE) {
        debug!(namespace = %namespace, route = %name, "HTTPRoute is a derived route, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::DerivedResource));
    }
    if route.annotations().contains_key(SOURCE_ROUTE_ANNOTATION) {
        debug!(namespace = %namespace, route = %name, "HTTPRoute was copied from another route, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyReparented));
    }

    let Some((parent_ref, class)) = claimed_parent(ctx, &route, namespace).await? else {
        debug!(namespace = %namespace, route = %name, "No parent gateway is claimed, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::NoClaimedParent));
    };

    let config = load_class_config(store, &class).await?;
    if name.ends_with(&format!("-{}", config.secondary_class)) {
        debug!(
            namespace = %namespace,
            route = %name,
            secondary_class = %config.secondary_class,
            "HTTPRoute already carries the reparented suffix, skipping"
        );
        return Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyReparented));
    }

    let derived = build_derived_route(&route, parent_ref, &config.secondary_class)?;
    let child = DerivedResource {
        object: to_dynamic(&derived)?,
        strategy: ApplyStrategy::Replace,
    };

    let mut summary = ApplySummary::default();
    summary.record(apply_derived(store, &ctx.config, &child).await?);

    if summary.writes() > 0 {
        info!(
            namespace = %namespace,
            route = %name,
            derived = %child.name(),
            gateway = %parent_ref.name,
            "Reparented HTTPRoute onto shadow gateway"
        );
    }
    Ok(ReconcileOutcome::Applied(summary))
}

#[cfg(test)]
#[path = "httproute_tests.rs"]
mod httproute_tests;
