// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Gateway API resource types watched and derived by the controller.
//!
//! Only the fields the controller reads or rewrites are typed. Everything else in a
//! spec is carried through a flattened map so that copying a spec (for the shadow
//! gateway or a derived route) never drops fields this crate does not model.
//!
//! # Resource Types
//!
//! - [`Gateway`] - The parent resource; a request for traffic entry points
//! - [`GatewayClass`] - Declares which controller implements a class of gateways
//! - [`HTTPRoute`] - Routing rules attached to one or more gateways
//!
//! # Example: A Gateway claimed through its class
//!
//! ```rust
//! use cloud_gateway_controller::crd::{Gateway, GatewaySpec, Listener};
//!
//! let gateway = Gateway::new(
//!     "foo-gateway",
//!     GatewaySpec {
//!         gateway_class_name: "default".to_string(),
//!         listeners: vec![Listener {
//!             name: "prod-web".to_string(),
//!             port: 80,
//!             protocol: "HTTP".to_string(),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     },
//! );
//! assert_eq!(gateway.spec.gateway_class_name, "default");
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::{GATEWAY_API_GROUP, KIND_GATEWAY};

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. `Accepted`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,

    /// `metadata.generation` the condition was computed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

// ============================================================================
// GatewayClass
// ============================================================================

/// Reference from a `GatewayClass` to the object holding its parameters.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParametersReference {
    /// API group of the referent; empty for the core group.
    #[serde(default)]
    pub group: String,

    /// Kind of the referent, e.g. `ConfigMap`.
    pub kind: String,

    /// Name of the referent.
    pub name: String,

    /// Namespace of the referent. Required for namespaced kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `GatewayClass` binds a class name to the controller that implements it.
///
/// A class is claimed by this controller when `controllerName` equals the
/// configured controller identity.
///
/// # Example YAML
///
/// ```yaml
/// apiVersion: gateway.networking.k8s.io/v1beta1
/// kind: GatewayClass
/// metadata:
///   name: default
/// spec:
///   controllerName: github.com/pixelperfekt-dk/cloud-gateway-controller
///   parametersRef:
///     group: ""
///     kind: ConfigMap
///     name: default-gateway-class
///     namespace: default
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "GatewayClass",
    doc = "GatewayClass describes a class of Gateways available to the user for creating Gateway resources."
)]
#[kube(status = "GatewayClassStatus")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct GatewayClassSpec {
    /// Name of the controller managing Gateways of this class.
    pub controller_name: String,

    /// Optional reference to the configuration parameters of this class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_ref: Option<ParametersReference>,

    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `GatewayClass` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
pub struct GatewayClassStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

// ============================================================================
// Gateway
// ============================================================================

/// A listener on a `Gateway`.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    /// Unique name of the listener within the gateway.
    pub name: String,

    /// Virtual hostname to match for protocol types that define this concept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Network port.
    pub port: i32,

    /// Network protocol, e.g. `HTTP` or `HTTPS`.
    pub protocol: String,

    /// TLS configuration, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<Value>,

    /// Route attachment restrictions, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_routes: Option<Value>,
}

/// Requested address of a `Gateway`.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAddress {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,

    pub value: String,
}

/// `Gateway` represents an instance of a service-traffic handling infrastructure.
///
/// Gateways whose class is claimed by this controller are the parent resources
/// from which the shadow gateway and templated children are derived.
///
/// # Example YAML
///
/// ```yaml
/// apiVersion: gateway.networking.k8s.io/v1beta1
/// kind: Gateway
/// metadata:
///   name: foo-gateway
///   namespace: foo-gateway-ns
/// spec:
///   gatewayClassName: default
///   listeners:
///   - name: prod-web
///     port: 80
///     protocol: HTTP
///     hostname: example.com
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "Gateway",
    namespaced,
    doc = "Gateway represents an instance of a service-traffic handling infrastructure by binding Listeners to a set of IP addresses."
)]
#[kube(status = "GatewayStatus")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// Name of the `GatewayClass` this gateway belongs to.
    pub gateway_class_name: String,

    /// Logical endpoints bound on this gateway's addresses.
    #[serde(default)]
    pub listeners: Vec<Listener>,

    /// Requested addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<GatewayAddress>,

    /// Remaining spec fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `Gateway` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<GatewayAddress>,
}

// ============================================================================
// HTTPRoute
// ============================================================================

/// Reference from a route to the parent (normally a `Gateway`) it attaches to.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    /// API group of the referent; defaults to `gateway.networking.k8s.io`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Kind of the referent; defaults to `Gateway`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Namespace of the referent; defaults to the route's namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Name of the referent.
    pub name: String,

    /// Listener name within the referent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,

    /// Port within the referent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl ParentReference {
    /// Whether this reference points at a `Gateway`, applying the API defaults.
    #[must_use]
    pub fn targets_gateway(&self) -> bool {
        self.group.as_deref().unwrap_or(GATEWAY_API_GROUP) == GATEWAY_API_GROUP
            && self.kind.as_deref().unwrap_or(KIND_GATEWAY) == KIND_GATEWAY
    }

    /// Namespace of the referenced object, defaulting to the route's namespace.
    #[must_use]
    pub fn namespace_or<'a>(&'a self, route_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(route_namespace)
    }
}

/// `HTTPRoute` provides a way to route HTTP requests.
///
/// Routes attached to a claimed gateway are copied onto the shadow gateway
/// by the route reparenter.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[kube(
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "HTTPRoute",
    namespaced,
    doc = "HTTPRoute provides a way to route HTTP requests, matching by hostname, path, header or query param."
)]
#[kube(status = "HTTPRouteStatus")]
#[kube(derive = "PartialEq")]
#[serde(rename_all = "camelCase")]
pub struct HTTPRouteSpec {
    /// Parents this route wants to attach to, in order.
    #[serde(default)]
    pub parent_refs: Vec<ParentReference>,

    /// Hostnames matched against the HTTP Host header.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,

    /// Routing rules, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Value>,

    /// Remaining spec fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `HTTPRoute` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
pub struct HTTPRouteStatus {
    #[serde(default)]
    pub parents: Vec<Value>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
