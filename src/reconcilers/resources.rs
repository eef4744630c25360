// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Idempotent create-or-update of derived resources.
//!
//! This module writes the objects produced by the builders. Each write first
//! reads the current object and compares it with the desired one; nothing is
//! written when the desired fields are already in place, so a reconcile with
//! unchanged inputs performs zero writes.
//!
//! Every write stamps [`DESIRED_HASH_ANNOTATION`] with a SHA-256 of the desired
//! payload. A stored object whose hash differs is rewritten even when all desired
//! fields are present, so fields removed from a parent or template are dropped
//! from the derived object too. Objects without the annotation fall back to the
//! field-by-field comparison.
//!
//! # Strategies
//!
//! - **Replace**: overwrite the whole spec with an optimistic-concurrency replace
//!   (shadow gateways, derived routes). A stale `resourceVersion` is retried by
//!   re-reading, up to the configured number of attempts.
//! - **`ForceApply`**: server-side apply with the controller's field manager and
//!   `force`, so the controller always wins fields it sets (templated children).
//!   Absent objects are created by the same apply so the field manager owns every
//!   field from the start.
//!
//! A create that loses a race with another writer (`AlreadyExists`) falls back
//! to reading the winner and updating it.
//!
//! # Example
//!
//! ```rust,no_run
//! use cloud_gateway_controller::config::EngineConfig;
//! use cloud_gateway_controller::reconcilers::builder::DerivedResource;
//! use cloud_gateway_controller::reconcilers::resources::apply_derived;
//! use cloud_gateway_controller::store::ResourceStore;
//!
//! async fn example(store: &dyn ResourceStore, config: &EngineConfig, child: DerivedResource) {
//!     let outcome = apply_derived(store, config, &child).await;
//!     println!("{outcome:?}");
//! }
//! ```

use kube::core::{ApiResource, DynamicObject};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::document::is_subset;
use crate::errors::{ReconcileError, StoreError};
use crate::labels::DESIRED_HASH_ANNOTATION;
use crate::metrics::record_derived_write;
use crate::reconcilers::builder::{ApplyStrategy, DerivedResource};
use crate::reconcilers::gvr::resolve_api_resource;
use crate::reconcilers::retry::retry_on_conflict;
use crate::store::ResourceStore;

/// What a single apply did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    /// The stored object already matched; nothing was written.
    Unchanged,
}

impl ApplyOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Updated => "updated",
            ApplyOutcome::Unchanged => "unchanged",
        }
    }
}

/// Create or update `derived` in the store.
///
/// # Arguments
///
/// * `store` - The declarative store
/// * `config` - Supplies the field manager and conflict retry budget
/// * `derived` - The fully built object and its update strategy
///
/// # Errors
///
/// - [`ReconcileError::MissingOwnerIdentity`] if the object has no owner reference;
///   such an object is never written
/// - [`ReconcileError::Resolution`] if the object's kind cannot be resolved
/// - [`ReconcileError::WriteConflict`] if every attempt lost a concurrency race
/// - [`ReconcileError::StoreUnavailable`] / [`ReconcileError::Rejected`] from the store
pub async fn apply_derived(
    store: &dyn ResourceStore,
    config: &EngineConfig,
    derived: &DerivedResource,
) -> Result<ApplyOutcome, ReconcileError> {
    let kind = derived.kind().to_string();
    let name = derived.name();

    let has_owner = derived
        .object
        .metadata
        .owner_references
        .as_ref()
        .is_some_and(|owners| !owners.is_empty());
    if !has_owner {
        return Err(ReconcileError::MissingOwnerIdentity { kind, name });
    }

    let resource = resolve_api_resource(store, derived.api_version(), &kind).await?;
    let derived = &with_desired_hash(derived);

    debug!(
        namespace = ?derived.namespace(),
        name = %name,
        kind = %kind,
        strategy = ?derived.strategy,
        "Creating or updating derived resource"
    );

    let operation_name = format!("apply {kind} {name}");
    let outcome = retry_on_conflict(
        config.conflict_retries,
        || apply_once(store, &resource, derived, &config.field_manager),
        &operation_name,
    )
    .await?;

    match outcome {
        ApplyOutcome::Unchanged => {
            debug!(kind = %kind, name = %name, "Derived resource is up to date");
        }
        ApplyOutcome::Created | ApplyOutcome::Updated => {
            record_derived_write(&kind, outcome.as_str());
            info!(
                "{} {} {}/{}",
                if outcome == ApplyOutcome::Created { "Created" } else { "Updated" },
                kind,
                derived.namespace().unwrap_or_default(),
                name
            );
        }
    }
    Ok(outcome)
}

/// One read-compare-write pass. Conflicts are returned to the caller for retry.
async fn apply_once(
    store: &dyn ResourceStore,
    resource: &ApiResource,
    derived: &DerivedResource,
    field_manager: &str,
) -> Result<ApplyOutcome, StoreError> {
    let namespace = derived.namespace();
    let name = derived.name();

    if let Some(existing) = store.get(resource, namespace, &name).await? {
        return update_existing(store, resource, derived, &existing, field_manager).await;
    }

    let mut fresh = derived.object.clone();
    fresh.metadata.resource_version = None;
    if derived.strategy == ApplyStrategy::ForceApply {
        store.apply(resource, &fresh, field_manager).await?;
        return Ok(ApplyOutcome::Created);
    }
    match store.create(resource, &fresh, field_manager).await {
        Ok(_) => Ok(ApplyOutcome::Created),
        Err(StoreError::AlreadyExists { kind, name }) => {
            debug!(
                "{} {} was created concurrently, updating instead",
                kind, name
            );
            match store.get(resource, namespace, &name).await? {
                Some(existing) => {
                    update_existing(store, resource, derived, &existing, field_manager).await
                }
                // Created and deleted again between our two calls.
                None => Err(StoreError::Conflict {
                    kind,
                    name,
                    message: "object vanished after AlreadyExists".to_string(),
                }),
            }
        }
        Err(e) => Err(e),
    }
}

async fn update_existing(
    store: &dyn ResourceStore,
    resource: &ApiResource,
    derived: &DerivedResource,
    existing: &DynamicObject,
    field_manager: &str,
) -> Result<ApplyOutcome, StoreError> {
    if is_current(&derived.object, existing) {
        return Ok(ApplyOutcome::Unchanged);
    }

    match derived.strategy {
        ApplyStrategy::Replace => {
            let replacement = merge_for_replace(&derived.object, existing);
            store.replace(resource, &replacement, field_manager).await?;
        }
        ApplyStrategy::ForceApply => {
            let mut desired = derived.object.clone();
            desired.metadata.resource_version = None;
            store.apply(resource, &desired, field_manager).await?;
        }
    }
    Ok(ApplyOutcome::Updated)
}

/// The parts of an object this controller sets: labels, annotations, owner
/// references and every top-level field except `status`.
fn managed_view(object: &DynamicObject) -> Value {
    let mut view = match &object.data {
        Value::Object(data) => {
            let mut data = data.clone();
            data.remove("status");
            Value::Object(data)
        }
        _ => json!({}),
    };
    let annotations = object.metadata.annotations.as_ref().map(|annotations| {
        let mut annotations = annotations.clone();
        annotations.remove(DESIRED_HASH_ANNOTATION);
        annotations
    });
    view["metadata"] = json!({
        "labels": object.metadata.labels,
        "annotations": annotations,
        "ownerReferences": object.metadata.owner_references,
    });
    view
}

/// SHA-256 (hex) of the fields this controller sets on `object`.
///
/// The hash annotation itself is excluded, so stamping does not change the hash.
#[must_use]
pub fn calculate_desired_hash(object: &DynamicObject) -> String {
    let json = serde_json::to_string(&managed_view(object)).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn stored_hash(object: &DynamicObject) -> Option<&str> {
    object
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(DESIRED_HASH_ANNOTATION))
        .map(String::as_str)
}

/// `derived` with its desired hash annotation set.
fn with_desired_hash(derived: &DerivedResource) -> DerivedResource {
    let mut stamped = derived.clone();
    let hash = calculate_desired_hash(&stamped.object);
    stamped
        .object
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(DESIRED_HASH_ANNOTATION.to_string(), hash);
    stamped
}

/// Whether `existing` already matches `desired`.
///
/// When both carry a desired hash, differing hashes mean the desired payload
/// changed (possibly by removing fields) since the last write. Otherwise, and in
/// addition, every field `desired` sets must be present in `existing`.
#[must_use]
pub fn is_current(desired: &DynamicObject, existing: &DynamicObject) -> bool {
    if let (Some(want), Some(have)) = (stored_hash(desired), stored_hash(existing)) {
        if want != have {
            return false;
        }
    }
    is_subset(&managed_view(desired), &managed_view(existing))
}

/// `existing` with the desired spec (every top-level field but `status`),
/// labels and annotations merged in, and the desired owner references.
fn merge_for_replace(desired: &DynamicObject, existing: &DynamicObject) -> DynamicObject {
    let mut replacement = existing.clone();

    if let (Value::Object(target), Value::Object(source)) = (&mut replacement.data, &desired.data) {
        for (key, value) in source {
            if key != "status" {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    if let Some(labels) = &desired.metadata.labels {
        replacement
            .metadata
            .labels
            .get_or_insert_with(Default::default)
            .extend(labels.clone());
    }
    if let Some(annotations) = &desired.metadata.annotations {
        replacement
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .extend(annotations.clone());
    }
    replacement
        .metadata
        .owner_references
        .clone_from(&desired.metadata.owner_references);
    replacement
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
