// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-process [`ResourceStore`].
//!
//! Behaves like an API server for the operations the engine uses: resource
//! versions are assigned on every write and checked on replace, creates collide
//! with `AlreadyExists`, apply merges into the stored object and prunes fields
//! the same field manager applied before but no longer sends, and kinds must be
//! registered before they can be resolved. Every write is recorded so tests can
//! assert on the exact number of writes a reconcile performed. Failures can be
//! queued per operation to exercise retry and error paths.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind, TypeMeta};
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde_json::Value;

use super::ResourceStore;
use crate::crd::{Gateway, GatewayClass, HTTPRoute};
use crate::document::to_dynamic;
use crate::errors::StoreError;

/// Store operation, used to target failure injection and to label the write log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Resolve,
    Get,
    List,
    Create,
    Replace,
    Apply,
    PatchStatus,
}

/// One write that reached the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub op: StoreOp,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct ObjectKey {
    group: String,
    plural: String,
    namespace: Option<String>,
    name: String,
}

impl ObjectKey {
    fn new(resource: &ApiResource, namespace: Option<&str>, name: &str) -> Self {
        Self {
            group: resource.group.clone(),
            plural: resource.plural.clone(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    fn same_collection(&self, resource: &ApiResource) -> bool {
        self.group == resource.group && self.plural == resource.plural
    }
}

#[derive(Default)]
struct Inner {
    kinds: Vec<ApiResource>,
    objects: BTreeMap<ObjectKey, DynamicObject>,
    next_version: u64,
    writes: Vec<WriteRecord>,
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
    create_races: VecDeque<DynamicObject>,
    /// Last payload applied per object and field manager.
    applied: HashMap<(ObjectKey, String), Value>,
}

impl Inner {
    fn take_failure(&mut self, op: StoreOp) -> Result<(), StoreError> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    /// Stamp store-owned metadata and insert.
    fn store(&mut self, resource: &ApiResource, mut object: DynamicObject) -> DynamicObject {
        let name = object.name_any();
        let key = ObjectKey::new(resource, object.metadata.namespace.as_deref(), &name);
        object.types = Some(TypeMeta {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
        });

        let previous = self.objects.get(&key);
        let uid = previous
            .and_then(|p| p.metadata.uid.clone())
            .or_else(|| object.metadata.uid.clone())
            .unwrap_or_else(|| format!("uid-{}", self.next_version + 1));
        let generation = match previous {
            Some(p) if p.data.get("spec") == object.data.get("spec") => p.metadata.generation,
            Some(p) => p.metadata.generation.map(|g| g + 1),
            None => Some(1),
        };

        object.metadata.uid = Some(uid);
        object.metadata.generation = generation;
        object.metadata.resource_version = Some(self.bump_version());
        self.objects.insert(key, object.clone());
        object
    }

    fn record(&mut self, op: StoreOp, resource: &ApiResource, namespace: Option<&str>, name: &str) {
        self.writes.push(WriteRecord {
            op,
            kind: resource.kind.clone(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        });
    }
}

/// In-memory store with discovery, optimistic concurrency and a write log.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Empty store with no registered kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that can resolve the Gateway API kinds, `ConfigMap`, `Ingress`
    /// and cert-manager `Certificate`.
    #[must_use]
    pub fn with_gateway_api() -> Self {
        let store = Self::new();
        store.register_kind(ApiResource::erase::<Gateway>(&()));
        store.register_kind(ApiResource::erase::<GatewayClass>(&()));
        store.register_kind(ApiResource::erase::<HTTPRoute>(&()));
        store.register_kind(ApiResource::erase::<ConfigMap>(&()));
        store.register_kind(ApiResource::erase::<Ingress>(&()));
        store.register_kind(ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk("cert-manager.io", "v1", "Certificate"),
            "certificates",
        ));
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a kind resolvable.
    pub fn register_kind(&self, resource: ApiResource) {
        self.lock().kinds.push(resource);
    }

    /// Seed an object without recording a write.
    pub fn insert(&self, resource: &ApiResource, object: DynamicObject) -> DynamicObject {
        self.lock().store(resource, object)
    }

    /// Seed a natively-known object without recording a write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the object does not serialize.
    pub fn insert_typed<K>(&self, object: &K) -> Result<DynamicObject, StoreError>
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let resource = ApiResource::erase::<K>(&());
        Ok(self.insert(&resource, to_dynamic(object)?))
    }

    /// Current copy of an object.
    #[must_use]
    pub fn object(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<DynamicObject> {
        self.lock()
            .objects
            .get(&ObjectKey::new(resource, namespace, name))
            .cloned()
    }

    /// Every stored object of a kind.
    #[must_use]
    pub fn objects(&self, resource: &ApiResource) -> Vec<DynamicObject> {
        self.lock()
            .objects
            .iter()
            .filter(|(key, _)| key.same_collection(resource))
            .map(|(_, object)| object.clone())
            .collect()
    }

    /// Writes performed since creation or the last [`clear_writes`](Self::clear_writes).
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Fail the next call of `op` with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Simulate another writer creating `object` just before the next create:
    /// the object is stored and that create fails with `AlreadyExists`.
    pub fn race_next_create(&self, object: DynamicObject) {
        self.lock().create_races.push_back(object);
    }
}

/// Remove from `target` the fields present in `previous` but missing from `incoming`.
fn prune_released(target: &mut Value, previous: &Value, incoming: &Value) {
    let (Value::Object(target), Value::Object(previous)) = (target, previous) else {
        return;
    };
    for (key, old) in previous {
        match incoming.get(key) {
            None => {
                target.remove(key);
            }
            Some(new) => {
                if let Some(slot) = target.get_mut(key) {
                    prune_released(slot, old, new);
                }
            }
        }
    }
}

/// Merge `patch` into `target`: objects merge key by key, everything else is replaced.
fn merge_values(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn to_value(object: &DynamicObject) -> Result<Value, StoreError> {
    serde_json::to_value(object).map_err(|e| StoreError::Invalid(e.to_string()))
}

fn from_value(value: Value) -> Result<DynamicObject, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Invalid(e.to_string()))
}

fn require_name(resource: &ApiResource, object: &DynamicObject) -> Result<String, StoreError> {
    object
        .metadata
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StoreError::Invalid(format!("{} has no metadata.name", resource.kind)))
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn resolve(&self, gvk: &GroupVersionKind) -> Result<ApiResource, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::Resolve)?;
        inner
            .kinds
            .iter()
            .find(|r| r.group == gvk.group && r.version == gvk.version && r.kind == gvk.kind)
            .cloned()
            .ok_or_else(|| StoreError::Unresolvable {
                api_version: gvk.api_version(),
                kind: gvk.kind.clone(),
            })
    }

    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::Get)?;
        Ok(inner
            .objects
            .get(&ObjectKey::new(resource, namespace, name))
            .cloned())
    }

    async fn list(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::List)?;
        Ok(inner
            .objects
            .iter()
            .filter(|(key, _)| key.same_collection(resource))
            .filter(|(key, _)| namespace.is_none() || key.namespace.as_deref() == namespace)
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn create(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        _field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::Create)?;
        let name = require_name(resource, object)?;
        let namespace = object.metadata.namespace.clone();

        if let Some(racer) = inner.create_races.pop_front() {
            inner.store(resource, racer);
        }

        let key = ObjectKey::new(resource, namespace.as_deref(), &name);
        if inner.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: resource.kind.clone(),
                name,
            });
        }

        let mut fresh = object.clone();
        fresh.metadata.resource_version = None;
        fresh.metadata.uid = None;
        inner.record(StoreOp::Create, resource, namespace.as_deref(), &name);
        Ok(inner.store(resource, fresh))
    }

    async fn replace(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        _field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::Replace)?;
        let name = require_name(resource, object)?;
        let namespace = object.metadata.namespace.clone();
        let key = ObjectKey::new(resource, namespace.as_deref(), &name);

        let current = inner
            .objects
            .get(&key)
            .ok_or_else(|| StoreError::NotFound {
                kind: resource.kind.clone(),
                name: name.clone(),
            })?;
        if object.metadata.resource_version.is_some()
            && object.metadata.resource_version != current.metadata.resource_version
        {
            return Err(StoreError::Conflict {
                kind: resource.kind.clone(),
                name,
                message: "the object has been modified; please apply your changes to the latest version and try again".to_string(),
            });
        }

        let mut replacement = object.clone();
        replacement.metadata.uid = current.metadata.uid.clone();
        inner.record(StoreOp::Replace, resource, namespace.as_deref(), &name);
        Ok(inner.store(resource, replacement))
    }

    async fn apply(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
        field_manager: &str,
    ) -> Result<DynamicObject, StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::Apply)?;
        let name = require_name(resource, object)?;
        let namespace = object.metadata.namespace.clone();
        let key = ObjectKey::new(resource, namespace.as_deref(), &name);

        let mut patch = to_value(object)?;
        if let Some(metadata) = patch.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.remove("resourceVersion");
            metadata.remove("uid");
        }

        let applied_key = (key.clone(), field_manager.to_string());
        let merged = match inner.objects.get(&key) {
            Some(current) => {
                let mut base = to_value(current)?;
                if let Some(previous) = inner.applied.get(&applied_key) {
                    prune_released(&mut base, previous, &patch);
                }
                // Owner references are a list: apply replaces rather than merges them.
                if let Some(owners) = patch.pointer("/metadata/ownerReferences").cloned() {
                    if let Some(slot) = base.pointer_mut("/metadata/ownerReferences") {
                        *slot = owners;
                    }
                }
                merge_values(&mut base, &patch);
                from_value(base)?
            }
            None => from_value(patch.clone())?,
        };
        inner.applied.insert(applied_key, patch);

        inner.record(StoreOp::Apply, resource, namespace.as_deref(), &name);
        Ok(inner.store(resource, merged))
    }

    async fn patch_status(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
        status: &Value,
        _field_manager: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.take_failure(StoreOp::PatchStatus)?;
        let key = ObjectKey::new(resource, namespace, name);

        let mut object = inner
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: resource.kind.clone(),
                name: name.to_string(),
            })?;
        if let Value::Object(data) = &mut object.data {
            data.insert("status".to_string(), status.clone());
        }

        inner.record(StoreOp::PatchStatus, resource, namespace, name);
        inner.store(resource, object);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
