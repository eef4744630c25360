// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `webhook.rs`

#[cfg(test)]
mod tests {
    use crate::webhook::{build_router, SyncResponse};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn parent() -> serde_json::Value {
        json!({
            "apiVersion": "gateway.networking.k8s.io/v1beta1",
            "kind": "Gateway",
            "metadata": {"name": "foo-gateway", "namespace": "foo-ns", "uid": "abc"},
            "spec": {
                "gatewayClassName": "default",
                "listeners": [{"name": "prod-web", "port": 80, "protocol": "HTTP"}]
            }
        })
    }

    async fn post_sync(uri: &str, body: String) -> (StatusCode, Vec<u8>) {
        let response = build_router()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for path in ["/healthz", "/readyz"] {
            let response = build_router()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"ok");
        }
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        crate::metrics::record_reconciliation_success("Gateway", std::time::Duration::from_millis(5));

        let response = build_router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("cloud_gateway_reconciliations_total"));
    }

    #[tokio::test]
    async fn test_sync_returns_shadow_gateway() {
        let request = json!({"parent": parent(), "children": {}});

        let (status, body) = post_sync("/sync", request.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let response: SyncResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.status.succeeded, 0);
        assert_eq!(response.children.len(), 1);
        let shadow = &response.children[0];
        assert_eq!(shadow.metadata.name.as_deref(), Some("foo-gateway-istio"));
        assert_eq!(shadow.spec.gateway_class_name, "istio");
        assert!(shadow.metadata.uid.is_none());
        assert!(shadow.metadata.owner_references.is_none());
    }

    #[tokio::test]
    async fn test_sync_honours_secondary_class_and_observed_children() {
        let mut observed = parent();
        observed["metadata"]["name"] = json!("foo-gateway-envoy");
        let request = json!({
            "parent": parent(),
            "children": {"Gateway.v1beta1": {"foo-gateway-envoy": observed}}
        });

        let (status, body) = post_sync("/sync?secondaryClass=envoy", request.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let response: SyncResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.status.succeeded, 1);
        assert_eq!(response.children[0].spec.gateway_class_name, "envoy");
    }

    #[tokio::test]
    async fn test_malformed_sync_request_is_bad_request() {
        let (status, _) = post_sync("/sync", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_sync("/sync", json!({"children": {}}).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
