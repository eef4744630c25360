// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `GatewayClass` reconciliation.
//!
//! Reports on each claimed class whether its configuration can be used:
//! the `parametersRef` must resolve to a `ConfigMap` naming a secondary class,
//! and every child template in it must compile.
//!
//! Template *execution* problems depend on the gateway being rendered, so they
//! are reported by the gateway driver as `TemplateRenderFailed`. This reconciler
//! leaves such a condition in place; the next successful gateway reconcile
//! clears it.

use kube::ResourceExt;
use tracing::debug;

use crate::constants::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_ACCEPTED};
use crate::context::Context;
use crate::crd::GatewayClass;
use crate::errors::{ReconcileError, RenderError};
use crate::reconcilers::builder::CHILD_TEMPLATE_KEYS;
use crate::reconcilers::class::{load_class_config, ClassConfig};
use crate::reconcilers::gateway::{ApplySummary, ReconcileOutcome, SkipReason};
use crate::reconcilers::status::{find_condition, report_class_accepted};
use crate::reconcilers::template::check_template;
use crate::reconcilers::{with_deadline, ACCEPTED_MESSAGE};
use crate::status_reasons::{
    REASON_ACCEPTED, REASON_INVALID_PARAMETERS, REASON_TEMPLATE_RENDER_FAILED,
};
use crate::store::get_typed;

fn check_templates(config: &ClassConfig) -> Result<(), RenderError> {
    for key in CHILD_TEMPLATE_KEYS {
        if let Some(body) = config.template(key) {
            check_template(key, body)?;
        }
    }
    Ok(())
}

/// Whether the class carries a render failure reported by the gateway driver.
fn has_render_failure(class: &GatewayClass) -> bool {
    class
        .status
        .as_ref()
        .and_then(|s| find_condition(&s.conditions, CONDITION_TYPE_ACCEPTED))
        .is_some_and(|c| {
            c.status == CONDITION_STATUS_FALSE
                && c.reason.as_deref() == Some(REASON_TEMPLATE_RENDER_FAILED)
        })
}

/// Reconcile the class `name` under the configured deadline.
///
/// # Errors
///
/// Returns [`ReconcileError::ConfigBinding`] or [`ReconcileError::Render`] after
/// reporting them as `Accepted=False`, and store failures as-is.
pub async fn reconcile_gatewayclass(
    ctx: &Context,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    with_deadline(
        ctx.config.reconcile_timeout,
        reconcile_gatewayclass_inner(ctx, name),
    )
    .await
}

async fn reconcile_gatewayclass_inner(
    ctx: &Context,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let store = ctx.store.as_ref();
    let field_manager = &ctx.config.field_manager;

    let Some(class) = get_typed::<GatewayClass>(store, None, name).await? else {
        debug!(class = %name, "GatewayClass not found, skipping");
        return Ok(ReconcileOutcome::Skipped(SkipReason::NotFound));
    };
    if !ctx.config.claims(&class.spec.controller_name) {
        debug!(
            class = %name,
            controller = %class.spec.controller_name,
            "GatewayClass is managed by another controller, skipping"
        );
        return Ok(ReconcileOutcome::Skipped(SkipReason::NotOurs));
    }

    let checked = load_class_config(store, &class)
        .await
        .and_then(|config| check_templates(&config).map_err(ReconcileError::from));
    if let Err(err) = checked {
        if err.is_class_visible() {
            report_class_accepted(
                store,
                &class,
                CONDITION_STATUS_FALSE,
                REASON_INVALID_PARAMETERS,
                &err.to_string(),
                field_manager,
            )
            .await?;
        }
        return Err(err);
    }

    if has_render_failure(&class) {
        debug!(class = %class.name_any(), "Leaving template render failure in place");
    } else {
        report_class_accepted(
            store,
            &class,
            CONDITION_STATUS_TRUE,
            REASON_ACCEPTED,
            ACCEPTED_MESSAGE,
            field_manager,
        )
        .await?;
    }
    Ok(ReconcileOutcome::Applied(ApplySummary::default()))
}

#[cfg(test)]
#[path = "gatewayclass_tests.rs"]
mod gatewayclass_tests;
