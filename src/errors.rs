// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for store access, template rendering and reconciliation.
//!
//! Reconciliation errors follow a fixed taxonomy so the dispatcher can decide
//! how to retry without inspecting messages:
//!
//! - `NotFound` / `NotOurs` are never returned by the drivers; they become skips
//! - `ConfigBinding` / `Render` are persistent and reported on the class status
//! - `WriteConflict` / `StoreUnavailable` / `Cancelled` are transient

use std::time::Duration;
use thiserror::Error;

use crate::status_reasons::{
    REASON_INVALID_PARAMETERS, REASON_KIND_UNRESOLVABLE, REASON_RECONCILE_CANCELLED,
    REASON_STORE_UNAVAILABLE, REASON_TEMPLATE_RENDER_FAILED, REASON_WRITE_CONFLICT,
};

/// Errors returned by a [`ResourceStore`](crate::store::ResourceStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed object does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// Name of the missing object
        name: String,
    },

    /// A create collided with an existing object of the same identity.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Kind of the existing object
        kind: String,
        /// Name of the existing object
        name: String,
    },

    /// An update was issued against a stale `resourceVersion`.
    #[error("conflicting write on {kind} '{name}': {message}")]
    Conflict {
        /// Kind of the contended object
        kind: String,
        /// Name of the contended object
        name: String,
        /// Message returned by the store
        message: String,
    },

    /// Discovery has no collection serving this apiVersion and kind.
    #[error("no API resource serves kind '{kind}' in '{api_version}'")]
    Unresolvable {
        /// The requested apiVersion (`group/version` or `version`)
        api_version: String,
        /// The requested kind
        kind: String,
    },

    /// Transport failure, timeout, throttling or server-side error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the request or returned data that could not be decoded.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// Errors produced while rendering a configuration template into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The template body does not compile.
    #[error("template '{key}' has a syntax error: {message}")]
    Syntax {
        /// Configuration key holding the template
        key: String,
        /// Compiler message
        message: String,
    },

    /// The template compiled but failed while executing (e.g. undefined field).
    #[error("template '{key}' failed to execute: {message}")]
    Execution {
        /// Configuration key holding the template
        key: String,
        /// Engine message
        message: String,
    },

    /// The rendered text is not valid YAML.
    #[error("template '{key}' rendered text that does not parse: {message}")]
    Parse {
        /// Configuration key holding the template
        key: String,
        /// Parser message
        message: String,
    },

    /// The rendered document parses but is not a usable Kubernetes object.
    #[error("template '{key}' rendered an invalid object: {message}")]
    InvalidDocument {
        /// Configuration key holding the template
        key: String,
        /// What is wrong with the document
        message: String,
    },
}

/// Errors that end a reconciliation in the `Failed` state (or, for
/// `NotFound`/`NotOurs`, are translated into a skip).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The parent or a referenced object vanished.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Kind of the missing object
        kind: String,
        /// Name of the missing object
        name: String,
    },

    /// The class exists but is implemented by another controller.
    #[error("GatewayClass '{class}' is not managed by this controller")]
    NotOurs {
        /// Class name
        class: String,
    },

    /// The class is ours but its configuration is missing or malformed.
    #[error("GatewayClass '{class}' configuration is invalid: {message}")]
    ConfigBinding {
        /// Class name
        class: String,
        /// What is wrong with the configuration
        message: String,
    },

    /// A child template failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A child's apiVersion/kind could not be mapped to a collection.
    #[error("cannot resolve kind '{kind}' in '{api_version}'")]
    Resolution {
        /// The requested apiVersion
        api_version: String,
        /// The requested kind
        kind: String,
    },

    /// Every attempt of a single write lost an optimistic-concurrency race.
    #[error("write conflict on {kind} '{name}' persisted after retries")]
    WriteConflict {
        /// Kind of the contended object
        kind: String,
        /// Name of the contended object
        name: String,
    },

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store refused an object or request.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// A derived object could not be given an owner reference.
    #[error("{kind} '{name}' has no uid; cannot own derived resources")]
    MissingOwnerIdentity {
        /// Kind of the would-be owner
        kind: String,
        /// Name of the would-be owner
        name: String,
    },

    /// The invocation's deadline elapsed.
    #[error("reconciliation cancelled after {0:?}")]
    Cancelled(Duration),
}

impl ReconcileError {
    /// Whether the dispatcher should retry soon rather than after a long backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReconcileError::WriteConflict { .. }
                | ReconcileError::StoreUnavailable(_)
                | ReconcileError::Cancelled(_)
        )
    }

    /// Whether this error is reported on the `GatewayClass` status.
    #[must_use]
    pub fn is_class_visible(&self) -> bool {
        matches!(
            self,
            ReconcileError::ConfigBinding { .. } | ReconcileError::Render(_)
        )
    }

    /// Condition reason describing this error.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::ConfigBinding { .. }
            | ReconcileError::NotFound { .. }
            | ReconcileError::NotOurs { .. } => REASON_INVALID_PARAMETERS,
            ReconcileError::Render(_)
            | ReconcileError::Rejected(_)
            | ReconcileError::MissingOwnerIdentity { .. } => REASON_TEMPLATE_RENDER_FAILED,
            ReconcileError::Resolution { .. } => REASON_KIND_UNRESOLVABLE,
            ReconcileError::WriteConflict { .. } => REASON_WRITE_CONFLICT,
            ReconcileError::StoreUnavailable(_) => REASON_STORE_UNAVAILABLE,
            ReconcileError::Cancelled(_) => REASON_RECONCILE_CANCELLED,
        }
    }
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, name } => ReconcileError::NotFound { kind, name },
            StoreError::AlreadyExists { kind, name } | StoreError::Conflict { kind, name, .. } => {
                ReconcileError::WriteConflict { kind, name }
            }
            StoreError::Unresolvable { api_version, kind } => {
                ReconcileError::Resolution { api_version, kind }
            }
            StoreError::Unavailable(message) => ReconcileError::StoreUnavailable(message),
            StoreError::Invalid(message) => ReconcileError::Rejected(message),
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
