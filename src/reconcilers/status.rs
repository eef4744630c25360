// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers and `GatewayClass` status reporting.
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Accepted")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last changed
//! - `observedGeneration`: the `metadata.generation` the condition describes
//!
//! Status is only written when it actually changes, so reporting the same
//! outcome on every resync does not generate watch events.
//!
//! # Example
//!
//! ```rust
//! use cloud_gateway_controller::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Accepted", "True", "Accepted", "Configuration is valid", Some(1));
//! assert_eq!(condition.status, "True");
//! ```

use chrono::Utc;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::constants::CONDITION_TYPE_ACCEPTED;
use crate::crd::{Condition, GatewayClass, GatewayClassStatus};
use crate::errors::ReconcileError;
use crate::store::{patch_status_typed, ResourceStore};

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Accepted")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase`
/// * `message` - A human-readable explanation
/// * `observed_generation` - Generation of the object the condition describes
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
        observed_generation,
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// The `lastTransitionTime` of an existing condition is preserved when its status
/// value does not change.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
        existing.observed_generation = observed_generation;
    } else {
        conditions.push(create_condition(
            condition_type,
            status,
            reason,
            message,
            observed_generation,
        ));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        find_condition(current, &new_cond.r#type).is_some_and(|curr_cond| {
            curr_cond.status == new_cond.status
                && curr_cond.reason == new_cond.reason
                && curr_cond.message == new_cond.message
                && curr_cond.observed_generation == new_cond.observed_generation
        })
    })
}

/// Set the `Accepted` condition of `class`, writing only if it changed.
///
/// Returns whether a status write was issued.
///
/// # Errors
///
/// Returns store failures from the status write.
pub async fn report_class_accepted(
    store: &dyn ResourceStore,
    class: &GatewayClass,
    status: &str,
    reason: &str,
    message: &str,
    field_manager: &str,
) -> Result<bool, ReconcileError> {
    let name = class.name_any();
    let current = class
        .status
        .as_ref()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();

    let mut conditions = current.clone();
    update_condition_in_memory(
        &mut conditions,
        CONDITION_TYPE_ACCEPTED,
        status,
        reason,
        message,
        class.metadata.generation,
    );

    if conditions_equal(&current, &conditions) {
        debug!(class = %name, status = %status, reason = %reason, "Accepted condition unchanged, skipping status write");
        return Ok(false);
    }

    patch_status_typed::<GatewayClass, _>(
        store,
        None,
        &name,
        &GatewayClassStatus { conditions },
        field_manager,
    )
    .await?;
    info!(class = %name, status = %status, reason = %reason, "Updated GatewayClass Accepted condition");
    Ok(true)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
