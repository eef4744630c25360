// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared objects for reconciler unit tests.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;

use crate::crd::{
    Gateway, GatewayClass, GatewayClassSpec, GatewaySpec, HTTPRoute, HTTPRouteSpec, Listener,
    ParametersReference, ParentReference,
};
use crate::store::MemoryStore;

pub const CONTROLLER: &str = "github.com/pixelperfekt-dk/cloud-gateway-controller";
pub const OTHER_CONTROLLER: &str = "istio.io/gateway-controller";
pub const NAMESPACE: &str = "foo-ns";

pub const ALB_TEMPLATE: &str = r"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: {{ parent.metadata.name }}-alb
spec:
  ingressClassName: alb
  defaultBackend:
    service:
      name: {{ gateway.metadata.name }}
      port:
        number: 80
";

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
    class.metadata.uid = Some(format!("{name}-class-uid"));
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
                port: 80,
                protocol: "HTTP".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    gateway.metadata.namespace = Some(NAMESPACE.to_string());
    gateway.metadata.uid = Some(format!("{name}-uid"));
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
                "backendRefs": [{"name": "foo-svc", "port": 8080}]
            })],
            ..Default::default()
        },
    );
    route.metadata.namespace = Some(NAMESPACE.to_string());
    route.metadata.uid = Some(format!("{name}-uid"));
    route
}

/// Store holding `foo-gateway` (class `default`), the claimed class `default`
/// and its configuration with an ALB template.
pub fn claimed_store() -> MemoryStore {
    let store = MemoryStore::with_gateway_api();
    store
        .insert_typed(&gateway_class("default", CONTROLLER, Some("default-config")))
        .unwrap();
    store
        .insert_typed(&config_map(
            "default-config",
            &[("tier2GatewayClass", "istio"), ("albTemplate", ALB_TEMPLATE)],
        ))
        .unwrap();
    store
        .insert_typed(&gateway("foo-gateway", "default"))
        .unwrap();
    store
}
