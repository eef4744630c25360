// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! [`ResourceStore`] backed by a Kubernetes API server.

use async_trait::async_trait;
use kube::api::{ListParams, Patch, PatchParams, PostParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

use super::ResourceStore;
use crate::errors::StoreError;

/// Store implementation over a `kube::Client`.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Wrap a Kubernetes client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

/// Classify a client error by HTTP status.
///
/// `creating` distinguishes a 409 on create (name taken) from a 409 on update
/// (stale `resourceVersion`).
fn map_kube_error(err: kube::Error, kind: &str, name: &str, creating: bool) -> StoreError {
    match err {
        kube::Error::Api(ae) => match ae.code {
            404 => StoreError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            409 if creating => StoreError::AlreadyExists {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            409 => StoreError::Conflict {
                kind: kind.to_string(),
                name: name.to_string(),
                message: ae.message.clone(),
            },
            429 | 500..=599 => StoreError::Unavailable(format!(
                "{kind} '{name}': {} ({})",
                ae.message, ae.code
            )),
            _ => StoreError::Invalid(format!("{kind} '{name}': {} ({})", ae.message, ae.code)),
        },
        other => StoreError::Unavailable(format!("{kind} '{name}': {other}")),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn resolve(&self, gvk: &GroupVersionKind) -> Result<ApiResource, StoreError> {
        let api_version = gvk.api_version();
        match kube::discovery::pinned_kind(&self.client, gvk).await {
            Ok((resource, _capabilities)) => {
                debug!(
                    api_version = %api_version,
                    kind = %gvk.kind,
                    plural = %resource.plural,
                    "Resolved kind through discovery"
                );
                Ok(resource)
            }
            Err(kube::Error::Api(ae)) => match ae.code {
                404 => Err(StoreError::Unresolvable {
                    api_version,
                    kind: gvk.kind.clone(),
                }),
                429 | 500..=599 => Err(StoreError::Unavailable(format!(
                    "discovery of {api_version}: {}",
                    ae.message
                ))),
                _ => Err(StoreError::Invalid(format!(
                    "discovery of {api_version} failed: {} ({})",
                    ae.message, ae.code
                ))),
            },
            Err(kube::Error::Discovery(_)) => Err(StoreError::Unresolvable {
                api_version,
                kind: gvk.kind.clone(),
            }),
            Err(other) => Err(StoreError::Unavailable(format!(
                "discovery of {api_version}: {other}"
            ))),
        }
    }

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, StoreError> {
        self.api(resource, namespace)
            .get_opt(name)
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, name, false))
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        let list = self
            .api(resource, namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, "*", false))?;
        Ok(list.items)
    }

    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let name = object.name_any();
        let params = PostParams {
            field_manager: Some(field_manager.to_string()),
            ..Default::default()
        };
        self.api(resource, object.metadata.namespace.as_deref())
            .create(&params, object)
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, &name, true))
    }

    async fn replace(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let name = object.name_any();
        let params = PostParams {
            field_manager: Some(field_manager.to_string()),
            ..Default::default()
        };
        self.api(resource, object.metadata.namespace.as_deref())
            .replace(&name, &params, object)
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, &name, false))
    }

    async fn apply(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let name = object.name_any();
        self.api(resource, object.metadata.namespace.as_deref())
            .patch(
                &name,
                &PatchParams::apply(field_manager).force(),
                &Patch::Apply(object),
            )
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, &name, false))
    }

    async fn patch_status(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        status: &serde_json::Value,
        field_manager: &str,
    ) -> Result<(), StoreError> {
        let patch = json!({ "status": status });
        let params = PatchParams {
            field_manager: Some(field_manager.to_string()),
            ..Default::default()
        };
        self.api(resource, namespace)
            .patch_status(name, &params, &Patch::Merge(&patch))
            .await
            .map_err(|e| map_kube_error(e, &resource.kind, name, false))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "kube_store_tests.rs"]
mod kube_store_tests;
