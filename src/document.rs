// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic structured documents and their conversion to typed kinds.
//!
//! Derived resources of arbitrary kinds travel through the engine as
//! [`DynamicObject`]s: `apiVersion`/`kind`, typed `metadata`, and a
//! `serde_json::Value` tree for everything else. Kinds the engine understands
//! natively (`Gateway`, `HTTPRoute`, ...) are converted explicitly with
//! [`to_dynamic`] and [`from_dynamic`]; nothing relies on structural coercion.

use kube::core::DynamicObject;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::StoreError;

/// Convert a typed object into a generic document.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] if the object does not serialize into a
/// Kubernetes object shape (`apiVersion`, `kind`, `metadata`).
pub fn to_dynamic<K: Serialize>(object: &K) -> Result<DynamicObject, StoreError> {
    let value = serde_json::to_value(object)
        .map_err(|e| StoreError::Invalid(format!("cannot serialize object: {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| StoreError::Invalid(format!("object is not a Kubernetes object: {e}")))
}

/// Convert a generic document into a typed object.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] if the document does not match the typed schema.
pub fn from_dynamic<K: DeserializeOwned>(object: DynamicObject) -> Result<K, StoreError> {
    let name = object.metadata.name.clone().unwrap_or_default();
    let value = serde_json::to_value(object)
        .map_err(|e| StoreError::Invalid(format!("cannot serialize '{name}': {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| StoreError::Invalid(format!("'{name}' does not match the expected schema: {e}")))
}

/// Whether every field present in `desired` is present in `actual` with an equal value.
///
/// Objects are compared key by key (extra keys in `actual` are ignored, so server
/// defaulting does not count as drift); arrays must have the same length and be
/// element-wise subsets; scalars must be equal. `null` in `desired` means the
/// field is not set and matches anything.
#[must_use]
pub fn is_subset(desired: &Value, actual: &Value) -> bool {
    match (desired, actual) {
        (Value::Object(want), Value::Object(have)) => want.iter().all(|(key, value)| {
            match have.get(key) {
                Some(existing) => is_subset(value, existing),
                None => value.is_null(),
            }
        }),
        (Value::Array(want), Value::Array(have)) => {
            want.len() == have.len() && want.iter().zip(have).all(|(w, h)| is_subset(w, h))
        }
        (Value::Null, _) => true,
        (want, have) => want == have,
    }
}

/// Split an `apiVersion` into `(group, version)`. The core group is `""`.
#[must_use]
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
