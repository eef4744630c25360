// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use cloud_gateway_controller::config::EngineConfig;
use cloud_gateway_controller::context::Context;
use cloud_gateway_controller::crd::{
    Gateway, GatewayClass, GatewayClassSpec, GatewaySpec, HTTPRoute, HTTPRouteSpec, Listener,
    ParametersReference, ParentReference,
};
use cloud_gateway_controller::store::{MemoryStore, ResourceStore};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const CONTROLLER: &str = "example.com/cloud-gateway";
pub const NAMESPACE: &str = "foo-ns";

pub const ALB_TEMPLATE: &str = r"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: {{ parent.metadata.name }}-alb
  annotations:
    alb.ingress.kubernetes.io/scheme: internet-facing
spec:
  ingressClassName: alb
  defaultBackend:
    service:
      name: {{ gateway.metadata.name }}
      port:
        number: {{ parent.spec.listeners[0].port }}
";

pub const CERTIFICATE_TEMPLATE: &str = r"apiVersion: cert-manager.io/v1
kind: Certificate
metadata:
  name: {{ parent.metadata.name }}-cert
spec:
  secretName: {{ parent.metadata.name }}-tls
  dnsNames:
{% for listener in parent.spec.listeners %}
  - {{ listener.hostname }}
{% endfor %}
  issuerRef:
    kind: ClusterIssuer
    name: {{ config.issuer }}
";

/// Context over `store` claiming classes for [`CONTROLLER`].
pub fn context(store: &Arc<MemoryStore>) -> Context {
    let store: Arc<dyn ResourceStore> = store.clone();
    Context::new(store, EngineConfig::new(CONTROLLER))
}

pub fn gateway_class(name: &str, controller: &str, config_map: Option<&str>) -> GatewayClass {
    let mut class = GatewayClass::new(
        name,
        GatewayClassSpec {
            controller_name: controller.to_string(),
            parameters_ref: config_map.map(|cm| ParametersReference {
                group: String::new(),
                kind: "ConfigMap".to_string(),
                name: cm.to_string(),
                namespace: Some(NAMESPACE.to_string()),
            }),
            description: None,
        },
    );
    class.metadata.generation = Some(1);
    class
}

pub fn gateway(name: &str, class: &str) -> Gateway {
    let mut gateway = Gateway::new(
        name,
        GatewaySpec {
            gateway_class_name: class.to_string(),
            listeners: vec![Listener {
                name: "prod-web".to_string(),
                hostname: Some("example.com".to_string()),
                port: 443,
                protocol: "HTTPS".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    gateway.metadata.namespace = Some(NAMESPACE.to_string());
    gateway
}

pub fn config_map(name: &str, entries: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    }
}

pub fn http_route(name: &str, gateway: &str) -> HTTPRoute {
    let mut route = HTTPRoute::new(
        name,
        HTTPRouteSpec {
            parent_refs: vec![ParentReference {
                name: gateway.to_string(),
                ..Default::default()
            }],
            hostnames: vec!["example.com".to_string()],
            rules: vec![serde_json::json!({
                "matches": [{"path": {"type": "PathPrefix", "value": "/"}}],
                "backendRefs": [{"name": "foo-svc", "port": 8080}]
            })],
            ..Default::default()
        },
    );
    route.metadata.namespace = Some(NAMESPACE.to_string());
    route
}

/// Store with class `default` (claimed), its configuration and `foo-gateway`.
pub fn scenario_store(config: &[(&str, &str)]) -> Arc<MemoryStore> {
    let store = MemoryStore::with_gateway_api();
    store
        .insert_typed(&gateway_class("default", CONTROLLER, Some("default-config")))
        .expect("class serializes");
    store
        .insert_typed(&config_map("default-config", config))
        .expect("config map serializes");
    store
        .insert_typed(&gateway("foo-gateway", "default"))
        .expect("gateway serializes");
    Arc::new(store)
}
