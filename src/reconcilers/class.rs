// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Class resolution and configuration binding.
//!
//! A `Gateway` is claimed by this controller when its `gatewayClassName` names a
//! `GatewayClass` whose `controllerName` equals the configured identity. The
//! class then points at a `ConfigMap` through `spec.parametersRef`; that map
//! holds the secondary class name and the child templates.
//!
//! "No such class" and "class belongs to someone else" are both skips. A claimed
//! class with missing or malformed configuration is a
//! [`ReconcileError::ConfigBinding`], which is reported on the class status.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use tracing::debug;

use crate::config::EngineConfig;
use crate::constants::{
    CONFIG_KEY_SECONDARY_CLASS_NAME, CONFIG_KEY_TIER2_GATEWAY_CLASS, KIND_CONFIG_MAP,
};
use crate::crd::GatewayClass;
use crate::errors::ReconcileError;
use crate::store::{get_typed, list_typed, ResourceStore};

/// Outcome of looking up a class name.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassResolution {
    /// No class with that name exists.
    NotFound,
    /// The class exists but names another controller.
    NotOurs,
    /// The class is implemented by this controller.
    Claimed(GatewayClass),
}

/// Configuration bound to a claimed class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassConfig {
    /// Class given to shadow gateways and used as the derived-name suffix.
    pub secondary_class: String,

    /// The full `ConfigMap` data, exposed to templates as `config`.
    pub data: BTreeMap<String, String>,
}

impl ClassConfig {
    /// Read the configuration keys of `config_map` for class `class`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ConfigBinding`] if no secondary class is set, or
    /// if it equals `class` (the shadow would be claimed again).
    pub fn from_config_map(class: &str, config_map: &ConfigMap) -> Result<Self, ReconcileError> {
        let data = config_map.data.clone().unwrap_or_default();
        let secondary_class = data
            .get(CONFIG_KEY_TIER2_GATEWAY_CLASS)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                data.get(CONFIG_KEY_SECONDARY_CLASS_NAME)
                    .filter(|v| !v.trim().is_empty())
            })
            .map(|v| v.trim().to_string())
            .ok_or_else(|| ReconcileError::ConfigBinding {
                class: class.to_string(),
                message: format!(
                    "ConfigMap {}/{} does not set '{CONFIG_KEY_TIER2_GATEWAY_CLASS}'",
                    config_map.namespace().unwrap_or_default(),
                    config_map.name_any()
                ),
            })?;

        if secondary_class == class {
            return Err(ReconcileError::ConfigBinding {
                class: class.to_string(),
                message: format!("secondary class '{secondary_class}' must differ from the class itself"),
            });
        }

        Ok(Self {
            secondary_class,
            data,
        })
    }

    /// Template body stored under `key`, if any.
    #[must_use]
    pub fn template(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|body| !body.trim().is_empty())
    }
}

/// Find the class named `class_name` and check that this controller implements it.
///
/// Classes are listed and filtered rather than fetched by name, so the answer
/// is the same whatever the store's read path caches.
///
/// # Errors
///
/// Returns store failures only.
pub async fn resolve_class(
    store: &dyn ResourceStore,
    config: &EngineConfig,
    class_name: &str,
) -> Result<ClassResolution, ReconcileError> {
    let classes: Vec<GatewayClass> = list_typed(store, None).await?;

    let mut found = false;
    for class in classes {
        if class.name_any() != class_name {
            continue;
        }
        found = true;
        if config.claims(&class.spec.controller_name) {
            debug!(class = %class_name, "GatewayClass is managed by this controller");
            return Ok(ClassResolution::Claimed(class));
        }
    }

    if found {
        debug!(class = %class_name, "GatewayClass is managed by another controller");
        Ok(ClassResolution::NotOurs)
    } else {
        Ok(ClassResolution::NotFound)
    }
}

/// Load the `ConfigMap` referenced by a claimed class.
///
/// # Errors
///
/// - [`ReconcileError::ConfigBinding`] if the class has no usable `parametersRef`,
///   the referenced `ConfigMap` is missing, or its content is malformed
/// - store failures as-is
pub async fn load_class_config(
    store: &dyn ResourceStore,
    class: &GatewayClass,
) -> Result<ClassConfig, ReconcileError> {
    let class_name = class.name_any();
    let binding_error = |message: String| ReconcileError::ConfigBinding {
        class: class_name.clone(),
        message,
    };

    let reference = class
        .spec
        .parameters_ref
        .as_ref()
        .ok_or_else(|| binding_error("spec.parametersRef is not set".to_string()))?;

    if !reference.group.is_empty() || reference.kind != KIND_CONFIG_MAP {
        return Err(binding_error(format!(
            "parametersRef must reference a core ConfigMap, got {}/{}",
            reference.group, reference.kind
        )));
    }
    let namespace = reference
        .namespace
        .as_deref()
        .ok_or_else(|| binding_error("parametersRef has no namespace".to_string()))?;

    let config_map: ConfigMap = get_typed(store, Some(namespace), &reference.name)
        .await?
        .ok_or_else(|| {
            binding_error(format!(
                "ConfigMap {namespace}/{} not found",
                reference.name
            ))
        })?;

    ClassConfig::from_config_map(&class_name, &config_map)
}

#[cfg(test)]
#[path = "class_tests.rs"]
mod class_tests;
