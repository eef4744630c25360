// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resolution of apiVersion/kind pairs to the collection that serves them.
//!
//! The plural collection name is server-defined (`Ingress` is `ingresses`,
//! `Gateway` is `gateways`), so it always comes from the store's discovery and
//! is never guessed from the kind.

use kube::core::{ApiResource, GroupVersionKind};
use tracing::debug;

use crate::document::split_api_version;
use crate::errors::ReconcileError;
use crate::store::ResourceStore;

/// Parse `group/version` or `version` together with a kind.
///
/// # Errors
///
/// Returns [`ReconcileError::Resolution`] for an empty version or kind.
pub fn parse_gvk(api_version: &str, kind: &str) -> Result<GroupVersionKind, ReconcileError> {
    let (group, version) = split_api_version(api_version);
    if version.is_empty() || kind.is_empty() || group.contains('/') || version.contains('/') {
        return Err(ReconcileError::Resolution {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        });
    }
    Ok(GroupVersionKind::gvk(group, version, kind))
}

/// Resolve the collection for `api_version`/`kind` through the store's discovery.
///
/// # Errors
///
/// - [`ReconcileError::Resolution`] if no collection serves the kind
/// - [`ReconcileError::StoreUnavailable`] if discovery could not be reached
pub async fn resolve_api_resource(
    store: &dyn ResourceStore,
    api_version: &str,
    kind: &str,
) -> Result<ApiResource, ReconcileError> {
    let gvk = parse_gvk(api_version, kind)?;
    let resource = store.resolve(&gvk).await?;
    debug!(
        api_version = %api_version,
        kind = %kind,
        plural = %resource.plural,
        "Resolved collection"
    );
    Ok(resource)
}
