// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants stamped onto derived resources.
//!
//! This module defines standard Kubernetes labels and controller-specific
//! labels/annotations so every derived object is recognizable as ours.

use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/managed-by` on every derived resource
pub const MANAGED_BY_CLOUD_GATEWAY: &str = "cloud-gateway-controller";

/// Value for `app.kubernetes.io/part-of` on every derived resource
pub const PART_OF_CLOUD_GATEWAY: &str = "cloud-gateway";

// ============================================================================
// Controller-Specific Annotations
// ============================================================================

/// Annotation naming the parent `Gateway` a derived resource was built from
pub const PARENT_GATEWAY_ANNOTATION: &str = "gateway.cloud-gateway.io/parent";

/// Annotation naming the source `HTTPRoute` a derived route was built from
pub const SOURCE_ROUTE_ANNOTATION: &str = "gateway.cloud-gateway.io/source-route";

/// Annotation holding the SHA-256 of the payload last written by this controller
pub const DESIRED_HASH_ANNOTATION: &str = "gateway.cloud-gateway.io/desired-hash";

// ============================================================================
// Third-Party Annotations
// ============================================================================

/// Istio annotation selecting the service type of the generated gateway deployment
pub const ISTIO_SERVICE_TYPE_ANNOTATION: &str = "networking.istio.io/service-type";

/// Service type requested for shadow gateways (the load-balancer child fronts them)
pub const ISTIO_SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";

/// Labels applied to every resource this controller derives.
#[must_use]
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_CLOUD_GATEWAY.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_CLOUD_GATEWAY.to_string()),
    ])
}
