// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{Gateway, GatewayClass, HTTPRoute, ParentReference};
    use kube::core::ApiResource;
    use kube::Resource;
    use serde_json::json;

    const GATEWAY_MANIFEST: &str = r"
apiVersion: gateway.networking.k8s.io/v1beta1
kind: Gateway
metadata:
  name: foo-gateway
  namespace: foo-gateway-ns
spec:
  gatewayClassName: default
  infrastructure:
    labels:
      team: edge
  listeners:
  - name: prod-web
    port: 80
    protocol: HTTP
    hostname: example.com
";

    #[test]
    fn test_gateway_parses_manifest() {
        let gateway: Gateway = serde_yaml::from_str(GATEWAY_MANIFEST).unwrap();

        assert_eq!(gateway.metadata.name.as_deref(), Some("foo-gateway"));
        assert_eq!(gateway.spec.gateway_class_name, "default");
        assert_eq!(gateway.spec.listeners.len(), 1);
        assert_eq!(gateway.spec.listeners[0].port, 80);
        assert_eq!(
            gateway.spec.listeners[0].hostname.as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn test_gateway_preserves_unmodelled_spec_fields() {
        let gateway: Gateway = serde_yaml::from_str(GATEWAY_MANIFEST).unwrap();

        assert_eq!(
            gateway.spec.extra.get("infrastructure"),
            Some(&json!({"labels": {"team": "edge"}}))
        );

        let round_trip = serde_json::to_value(&gateway).unwrap();
        assert_eq!(
            round_trip["spec"]["infrastructure"]["labels"]["team"],
            json!("edge")
        );
        assert_eq!(round_trip["spec"]["gatewayClassName"], json!("default"));
    }

    #[test]
    fn test_gateway_class_parameters_ref() {
        let class: GatewayClass = serde_json::from_value(json!({
            "apiVersion": "gateway.networking.k8s.io/v1beta1",
            "kind": "GatewayClass",
            "metadata": {"name": "default"},
            "spec": {
                "controllerName": "example.com/controller",
                "parametersRef": {
                    "group": "",
                    "kind": "ConfigMap",
                    "name": "default-gateway-class",
                    "namespace": "default"
                }
            }
        }))
        .unwrap();

        let params = class.spec.parameters_ref.unwrap();
        assert_eq!(params.kind, "ConfigMap");
        assert_eq!(params.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn test_api_resources_use_gateway_api_group() {
        let gateway = ApiResource::erase::<Gateway>(&());
        assert_eq!(gateway.group, "gateway.networking.k8s.io");
        assert_eq!(gateway.plural, "gateways");

        let class = ApiResource::erase::<GatewayClass>(&());
        assert_eq!(class.plural, "gatewayclasses");

        assert_eq!(HTTPRoute::kind(&()), "HTTPRoute");
    }

    #[test]
    fn test_parent_reference_defaults_to_gateway() {
        let reference = ParentReference {
            name: "foo-gateway".to_string(),
            ..Default::default()
        };
        assert!(reference.targets_gateway());
        assert_eq!(reference.namespace_or("routes"), "routes");
    }

    #[test]
    fn test_parent_reference_other_kind_is_not_gateway() {
        let reference = ParentReference {
            kind: Some("Service".to_string()),
            group: Some(String::new()),
            namespace: Some("other".to_string()),
            name: "svc".to_string(),
            ..Default::default()
        };
        assert!(!reference.targets_gateway());
        assert_eq!(reference.namespace_or("routes"), "other");
    }

    #[test]
    fn test_resources_compare_by_value() {
        let gateway: Gateway = serde_yaml::from_str(GATEWAY_MANIFEST).unwrap();
        let mut changed = gateway.clone();
        assert_eq!(changed, gateway);

        changed.spec.listeners[0].hostname = None;
        assert_ne!(changed, gateway);

        let class = GatewayClass::new("default", Default::default());
        assert_eq!(class.clone(), class);
        let route = HTTPRoute::new("foo-route", Default::default());
        assert_eq!(route.clone(), route);
    }
}
