// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for `GatewayClass` resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status. The controller reports a single `Accepted` condition on each
//! class it claims.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Accepted
//!       status: "False"
//!       reason: InvalidParameters
//!       message: "ConfigMap infra/default-gateway-class referenced by GatewayClass default not found"
//!       observedGeneration: 3
//! ```

// ============================================================================
// Accepted Condition Reasons (Gateway API conventions)
// ============================================================================

/// The class is claimed by this controller and its parameters resolve.
pub const REASON_ACCEPTED: &str = "Accepted";

/// The class is claimed but `parametersRef` is missing, unreadable or malformed.
///
/// **Example:**
/// ```yaml
/// conditions:
///   - type: Accepted
///     status: "False"
///     reason: InvalidParameters
///     message: "ConfigMap default/gw-params has no tier2GatewayClass key"
/// ```
pub const REASON_INVALID_PARAMETERS: &str = "InvalidParameters";

// ============================================================================
// Derivation Failure Reasons
// ============================================================================

/// A template stored in the class configuration failed to render or parse.
///
/// Persistent until the template is fixed; surfaced on the class so operators see it.
pub const REASON_TEMPLATE_RENDER_FAILED: &str = "TemplateRenderFailed";

/// A rendered child names an apiVersion/kind the API server does not serve.
pub const REASON_KIND_UNRESOLVABLE: &str = "KindUnresolvable";

/// A write lost an optimistic-concurrency race on every attempt.
pub const REASON_WRITE_CONFLICT: &str = "WriteConflict";

/// The API server could not be reached or answered with a transient failure.
pub const REASON_STORE_UNAVAILABLE: &str = "StoreUnavailable";

/// The reconcile deadline elapsed before all children were applied.
pub const REASON_RECONCILE_CANCELLED: &str = "ReconcileCancelled";
