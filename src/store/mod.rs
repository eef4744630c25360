// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The declarative store as seen by the reconcilers.
//!
//! Reconcilers never hold a `kube::Client`. They get a [`ResourceStore`], which
//! exposes exactly the operations the engine needs: discovery, read, list,
//! create, replace, force-apply and status patch. Every operation is addressed by
//! an [`ApiResource`] so that derived kinds unknown at compile time are handled
//! the same way as the Gateway API kinds.
//!
//! - [`KubeStore`] talks to a Kubernetes API server.
//! - [`MemoryStore`] keeps objects in process and backs the tests.

use async_trait::async_trait;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::from_dynamic;
use crate::errors::StoreError;

pub mod kube_store;
pub mod memory;

pub use kube_store::KubeStore;
pub use memory::MemoryStore;

/// Read/write capability over the declarative store.
///
/// `namespace` is `None` for cluster-scoped kinds (and for cluster-wide lists).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Map an apiVersion/kind to the collection that serves it.
    async fn resolve(&self, gvk: &GroupVersionKind) -> Result<ApiResource, StoreError>;

    /// Read an object by identity. A missing object is `Ok(None)`.
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, StoreError>;

    /// List every object of a kind, optionally restricted to one namespace.
    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError>;

    /// Create a new object. Fails with [`StoreError::AlreadyExists`] on collision.
    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError>;

    /// Replace an object. The object's `resourceVersion` is the precondition;
    /// a stale version fails with [`StoreError::Conflict`].
    async fn replace(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError>;

    /// Server-side apply with `force`, claiming every field in `object` for `field_manager`.
    async fn apply(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError>;

    /// Overwrite the `status` subresource of an object.
    async fn patch_status(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        status: &serde_json::Value,
        field_manager: &str,
    ) -> Result<(), StoreError>;
}

/// Read a kind the engine knows natively and convert it.
///
/// # Errors
///
/// Returns store errors as-is, and [`StoreError::Invalid`] if the stored object
/// does not match `K`'s schema.
pub async fn get_typed<K>(
    store: &dyn ResourceStore,
    namespace: Option<&str>,
    name: &str,
) -> Result<Option<K>, StoreError>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    let resource = ApiResource::erase::<K>(&());
    match store.get(&resource, namespace, name).await? {
        Some(object) => from_dynamic(object).map(Some),
        None => Ok(None),
    }
}

/// List a kind the engine knows natively and convert every item.
///
/// # Errors
///
/// Returns store errors as-is, and [`StoreError::Invalid`] if any item does not
/// match `K`'s schema.
pub async fn list_typed<K>(
    store: &dyn ResourceStore,
    namespace: Option<&str>,
) -> Result<Vec<K>, StoreError>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    let resource = ApiResource::erase::<K>(&());
    store
        .list(&resource, namespace)
        .await?
        .into_iter()
        .map(from_dynamic)
        .collect()
}

/// Overwrite the status of a natively-known kind.
///
/// # Errors
///
/// Returns store errors as-is, and [`StoreError::Invalid`] if `status` does not serialize.
pub async fn patch_status_typed<K, S>(
    store: &dyn ResourceStore,
    namespace: Option<&str>,
    name: &str,
    status: &S,
    field_manager: &str,
) -> Result<(), StoreError>
where
    K: Resource<DynamicType = ()>,
    S: Serialize,
{
    let resource = ApiResource::erase::<K>(&());
    let value = serde_json::to_value(status)
        .map_err(|e| StoreError::Invalid(format!("cannot serialize status: {e}")))?;
    store
        .patch_status(&resource, namespace, name, &value, field_manager)
        .await
}

