// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Construction of derived resources.
//!
//! Builders are pure: they take the parent and its class configuration and
//! return fully-formed objects, owner reference included. Nothing here talks
//! to the store.
//!
//! # Naming
//!
//! Every derived name is `<source name>-<secondary class>`, so reconciling the
//! same parent with the same configuration always targets the same identity:
//!
//! | Source                     | Derived                          |
//! |----------------------------|----------------------------------|
//! | `Gateway/foo-gateway`      | `Gateway/foo-gateway-istio`      |
//! | `HTTPRoute/foo-route`      | `HTTPRoute/foo-route-istio`      |
//!
//! Templated children are named by their template.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::core::DynamicObject;
use kube::{Resource, ResourceExt};

use crate::constants::{CONFIG_KEY_ALB_TEMPLATE, CONFIG_KEY_CERTIFICATE_TEMPLATE};
use crate::crd::{Gateway, HTTPRoute, HTTPRouteSpec, ParentReference};
use crate::document::to_dynamic;
use crate::errors::ReconcileError;
use crate::labels::{
    managed_labels, ISTIO_SERVICE_TYPE_ANNOTATION, ISTIO_SERVICE_TYPE_CLUSTER_IP,
    PARENT_GATEWAY_ANNOTATION, SOURCE_ROUTE_ANNOTATION,
};
use crate::reconcilers::class::ClassConfig;
use crate::reconcilers::template::{render_template, validate_document, RenderContext};

/// Templates rendered for every claimed gateway, in write order.
pub const CHILD_TEMPLATE_KEYS: [&str; 2] = [CONFIG_KEY_ALB_TEMPLATE, CONFIG_KEY_CERTIFICATE_TEMPLATE];

/// Annotation written by `kubectl apply`; never copied onto derived objects.
const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// How the apply engine writes an existing derived resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyStrategy {
    /// Overwrite the whole spec with an optimistic-concurrency replace.
    Replace,
    /// Server-side apply with the controller's field manager and `force`.
    ForceApply,
}

/// A derived object ready to be written.
#[derive(Clone, Debug)]
pub struct DerivedResource {
    pub object: DynamicObject,
    pub strategy: ApplyStrategy,
}

impl DerivedResource {
    #[must_use]
    pub fn api_version(&self) -> &str {
        self.object
            .types
            .as_ref()
            .map_or("", |t| t.api_version.as_str())
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.object.types.as_ref().map_or("", |t| t.kind.as_str())
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.object.name_any()
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.object.metadata.namespace.as_deref()
    }
}

/// Deterministic name of an object derived from `base` for `secondary_class`.
#[must_use]
pub fn derived_name(base: &str, secondary_class: &str) -> String {
    format!("{base}-{secondary_class}")
}

/// Controller owner reference pointing at `owner`.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingOwnerIdentity`] if `owner` has no name or uid
/// (it has not been read back from the store).
pub fn owner_reference<K>(owner: &K) -> Result<OwnerReference, ReconcileError>
where
    K: Resource<DynamicType = ()>,
{
    owner
        .controller_owner_ref(&())
        .ok_or_else(|| ReconcileError::MissingOwnerIdentity {
            kind: K::kind(&()).to_string(),
            name: owner.meta().name.clone().unwrap_or_default(),
        })
}

/// Metadata for a derived object: identity from `name`/`namespace`, labels and
/// annotations copied from `source` (minus `kubectl` bookkeeping), managed labels added.
fn derived_metadata(source: &ObjectMeta, name: String) -> ObjectMeta {
    let mut labels = source.labels.clone().unwrap_or_default();
    labels.extend(managed_labels());

    let mut annotations = source.annotations.clone().unwrap_or_default();
    annotations.remove(LAST_APPLIED_ANNOTATION);

    ObjectMeta {
        name: Some(name),
        namespace: source.namespace.clone(),
        labels: Some(labels),
        annotations: Some(annotations),
        ..Default::default()
    }
}

/// The shadow gateway for `parent`, without an owner reference.
///
/// A copy of the parent's spec under `<parent>-<secondary_class>`, with the
/// class switched to `secondary_class`. Store-assigned metadata (uid, resource
/// version, generation, managed fields, owner references) is not carried over.
#[must_use]
pub fn shadow_gateway_for(parent: &Gateway, secondary_class: &str) -> Gateway {
    let mut metadata = derived_metadata(
        &parent.metadata,
        derived_name(&parent.name_any(), secondary_class),
    );
    let annotations = metadata.annotations.get_or_insert_with(BTreeMap::new);
    annotations.insert(
        ISTIO_SERVICE_TYPE_ANNOTATION.to_string(),
        ISTIO_SERVICE_TYPE_CLUSTER_IP.to_string(),
    );
    annotations.insert(PARENT_GATEWAY_ANNOTATION.to_string(), parent.name_any());

    let mut spec = parent.spec.clone();
    spec.gateway_class_name = secondary_class.to_string();

    Gateway {
        metadata,
        spec,
        status: None,
    }
}

/// The shadow gateway for `parent`, owned by `parent`.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingOwnerIdentity`] if `parent` has no uid.
pub fn build_shadow_gateway(parent: &Gateway, config: &ClassConfig) -> Result<Gateway, ReconcileError> {
    let owner = owner_reference(parent)?;
    let mut shadow = shadow_gateway_for(parent, &config.secondary_class);
    shadow.metadata.owner_references = Some(vec![owner]);
    Ok(shadow)
}

/// Render every configured child template for `parent`.
///
/// Each child gets the parent as controller owner and the managed labels
/// (template-provided labels win).
///
/// # Errors
///
/// Returns [`ReconcileError::Render`] for the first template that fails, and
/// [`ReconcileError::MissingOwnerIdentity`] if `parent` has no uid.
pub fn build_templated_children(
    parent: &Gateway,
    shadow: &Gateway,
    config: &ClassConfig,
) -> Result<Vec<DynamicObject>, ReconcileError> {
    let owner = owner_reference(parent)?;
    let namespace = parent.namespace().unwrap_or_default();
    let context = RenderContext {
        parent: serde_json::to_value(parent)
            .map_err(|e| ReconcileError::Rejected(format!("cannot serialize parent: {e}")))?,
        gateway: Some(
            serde_json::to_value(shadow)
                .map_err(|e| ReconcileError::Rejected(format!("cannot serialize shadow: {e}")))?,
        ),
        config: config.data.clone(),
    };

    let mut children = Vec::new();
    for key in CHILD_TEMPLATE_KEYS {
        let Some(body) = config.template(key) else {
            continue;
        };
        let document = render_template(key, body, &context)?;
        let mut child = validate_document(key, document, &namespace)?;

        let labels = child.metadata.labels.get_or_insert_with(BTreeMap::new);
        for (label, value) in managed_labels() {
            labels.entry(label).or_insert(value);
        }
        child.metadata.owner_references = Some(vec![owner.clone()]);
        children.push(child);
    }
    Ok(children)
}

/// Every derived resource of a claimed gateway: the shadow gateway first, then
/// the templated children in [`CHILD_TEMPLATE_KEYS`] order.
///
/// # Errors
///
/// Propagates the errors of [`build_shadow_gateway`] and [`build_templated_children`].
pub fn build_gateway_children(
    parent: &Gateway,
    config: &ClassConfig,
) -> Result<Vec<DerivedResource>, ReconcileError> {
    let shadow = build_shadow_gateway(parent, config)?;
    let templated = build_templated_children(parent, &shadow, config)?;

    let mut children = vec![DerivedResource {
        object: to_dynamic(&shadow)?,
        strategy: ApplyStrategy::Replace,
    }];
    children.extend(templated.into_iter().map(|object| DerivedResource {
        object,
        strategy: ApplyStrategy::ForceApply,
    }));
    Ok(children)
}

/// The copy of `route` attached to the shadow of the gateway `parent_ref` names.
///
/// The copy is named `<route>-<secondary_class>`, keeps the route's rules, has
/// `parent_ref` as its only parent (renamed to the shadow gateway) and is owned
/// by `route`.
///
/// # Errors
///
/// Returns [`ReconcileError::MissingOwnerIdentity`] if `route` has no uid.
pub fn build_derived_route(
    route: &HTTPRoute,
    parent_ref: &ParentReference,
    secondary_class: &str,
) -> Result<HTTPRoute, ReconcileError> {
    let owner = owner_reference(route)?;
    let mut metadata = derived_metadata(
        &route.metadata,
        derived_name(&route.name_any(), secondary_class),
    );
    metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(SOURCE_ROUTE_ANNOTATION.to_string(), route.name_any());
    metadata.owner_references = Some(vec![owner]);

    let mut shadow_ref = parent_ref.clone();
    shadow_ref.name = derived_name(&parent_ref.name, secondary_class);

    Ok(HTTPRoute {
        metadata,
        spec: HTTPRouteSpec {
            parent_refs: vec![shadow_ref],
            ..route.spec.clone()
        },
        status: None,
    })
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod builder_tests;
