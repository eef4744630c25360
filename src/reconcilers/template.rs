// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Template rendering for configuration-defined child resources.
//!
//! A template body from the class configuration is rendered with minijinja in
//! strict mode, then the text is parsed as YAML into a generic document.
//! Each stage has its own [`RenderError`] variant:
//!
//! 1. compile (`Syntax`)
//! 2. execute (`Execution`, including references to undefined fields)
//! 3. parse (`Parse`)
//! 4. shape check (`InvalidDocument`)
//!
//! Rendering has no side effects; the same template and context always produce
//! the same document.
//!
//! # Template context
//!
//! | Variable  | Content                                                    |
//! |-----------|------------------------------------------------------------|
//! | `parent`  | the parent `Gateway` as stored                             |
//! | `gateway` | the shadow `Gateway` built for the parent (`none` if absent) |
//! | `config`  | the class `ConfigMap` data                                 |
//!
//! ```yaml
//! apiVersion: networking.k8s.io/v1
//! kind: Ingress
//! metadata:
//!   name: {{ parent.metadata.name }}-alb
//! spec:
//!   ingressClassName: alb
//! ```

use std::collections::BTreeMap;

use kube::core::DynamicObject;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use serde_json::Value;

use crate::errors::RenderError;

/// Inputs exposed to a template.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RenderContext {
    /// The parent resource document
    pub parent: Value,

    /// The shadow gateway document, when one was built
    pub gateway: Option<Value>,

    /// Configuration key/value data
    pub config: BTreeMap<String, String>,
}

/// Render `body` (stored under configuration key `key`) into a generic document.
///
/// # Errors
///
/// Returns the [`RenderError`] variant matching the failing stage.
pub fn render_template(key: &str, body: &str, ctx: &RenderContext) -> Result<Value, RenderError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let template = env
        .template_from_str(body)
        .map_err(|e| RenderError::Syntax {
            key: key.to_string(),
            message: e.to_string(),
        })?;

    let text = template.render(ctx).map_err(|e| RenderError::Execution {
        key: key.to_string(),
        message: e.to_string(),
    })?;

    serde_yaml::from_str::<Value>(&text).map_err(|e| RenderError::Parse {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Compile `body` without rendering it.
///
/// # Errors
///
/// Returns [`RenderError::Syntax`] if the template does not compile.
pub fn check_template(key: &str, body: &str) -> Result<(), RenderError> {
    let env = Environment::new();
    env.template_from_str(body)
        .map(|_| ())
        .map_err(|e| RenderError::Syntax {
            key: key.to_string(),
            message: e.to_string(),
        })
}

fn invalid(key: &str, message: impl Into<String>) -> RenderError {
    RenderError::InvalidDocument {
        key: key.to_string(),
        message: message.into(),
    }
}

fn non_empty_str<'a>(document: &'a Value, pointer: &str) -> Option<&'a str> {
    document
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Check that a rendered document is a writable object in `parent_namespace`.
///
/// The document must be a mapping with `apiVersion`, `kind` and `metadata.name`.
/// A missing `metadata.namespace` is set to `parent_namespace`; a different one
/// is rejected, since owner references cannot cross namespaces.
///
/// # Errors
///
/// Returns [`RenderError::InvalidDocument`] describing the first problem found.
pub fn validate_document(
    key: &str,
    mut document: Value,
    parent_namespace: &str,
) -> Result<DynamicObject, RenderError> {
    if !document.is_object() {
        return Err(invalid(key, "rendered document is not a mapping"));
    }
    if non_empty_str(&document, "/apiVersion").is_none() {
        return Err(invalid(key, "rendered document has no apiVersion"));
    }
    if non_empty_str(&document, "/kind").is_none() {
        return Err(invalid(key, "rendered document has no kind"));
    }
    if non_empty_str(&document, "/metadata/name").is_none() {
        return Err(invalid(key, "rendered document has no metadata.name"));
    }

    match document.pointer("/metadata/namespace") {
        None | Some(Value::Null) => {
            if let Some(metadata) = document.get_mut("metadata").and_then(Value::as_object_mut) {
                metadata.insert(
                    "namespace".to_string(),
                    Value::String(parent_namespace.to_string()),
                );
            }
        }
        Some(Value::String(ns)) if ns == parent_namespace => {}
        Some(other) => {
            return Err(invalid(
                key,
                format!("rendered namespace {other} differs from parent namespace '{parent_namespace}'"),
            ));
        }
    }

    serde_json::from_value(document).map_err(|e| invalid(key, e.to_string()))
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod template_tests;
