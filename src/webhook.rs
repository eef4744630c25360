// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP surface: health probes, Prometheus metrics and the `/sync` webhook.
//!
//! `/sync` answers composite-controller style requests. The request carries the
//! parent `Gateway` and the children observed for it; the response lists the
//! desired children, which is the parent's shadow gateway.
//!
//! ```text
//! POST /sync?secondaryClass=istio
//! {"parent": {...Gateway...}, "children": {"Gateway.v1beta1": {"foo-gateway-istio": {...}}}}
//!
//! 200 {"status": {"succeeded": 1}, "children": [{...Gateway...}]}
//! ```

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::constants::{DEFAULT_WEBHOOK_SECONDARY_CLASS, METRICS_SERVER_PATH};
use crate::crd::Gateway;
use crate::metrics::gather_metrics;
use crate::reconcilers::builder::shadow_gateway_for;

/// Children observed for the parent, keyed by `<Kind>.<version>` then name.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservedChildren {
    #[serde(rename = "Gateway.v1beta1", default)]
    pub gateways: BTreeMap<String, Gateway>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SyncRequest {
    pub parent: Gateway,
    #[serde(default)]
    pub children: ObservedChildren,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    /// Desired children that were already observed.
    pub succeeded: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub children: Vec<Gateway>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncParams {
    secondary_class: Option<String>,
}

/// Compute the desired children of `request.parent`.
#[must_use]
pub fn sync(request: &SyncRequest, secondary_class: &str) -> SyncResponse {
    let shadow = shadow_gateway_for(&request.parent, secondary_class);
    let succeeded = usize::from(
        request
            .children
            .gateways
            .contains_key(&shadow.name_any()),
    );
    SyncResponse {
        status: SyncStatus { succeeded },
        children: vec![shadow],
    }
}

async fn sync_handler(Query(params): Query<SyncParams>, body: Bytes) -> Response {
    let request: SyncRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed sync request");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let secondary_class = params
        .secondary_class
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_WEBHOOK_SECONDARY_CLASS.to_string());

    debug!(
        gateway = %request.parent.name_any(),
        secondary_class = %secondary_class,
        observed = request.children.gateways.len(),
        "Handling sync request"
    );
    Json(sync(&request, &secondary_class)).into_response()
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn ok() -> &'static str {
    "ok"
}

/// Router serving `/healthz`, `/readyz`, `/metrics` and `/sync`.
pub fn build_router() -> Router {
    Router::new()
        .route("/healthz", get(ok))
        .route("/readyz", get(ok))
        .route(METRICS_SERVER_PATH, get(metrics_handler))
        .route("/sync", post(sync_handler))
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
