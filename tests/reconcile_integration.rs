// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end reconcile scenarios against the in-memory store.
//!
//! Each test drives the public reconcilers the way the dispatcher would and
//! checks the resulting store contents.
//!
//! Run with: cargo test --test reconcile_integration

mod common;

use common::{
    config_map, context, gateway, gateway_class, http_route, scenario_store, ALB_TEMPLATE,
    CERTIFICATE_TEMPLATE, CONTROLLER, NAMESPACE,
};
use cloud_gateway_controller::crd::{Gateway, GatewayClass, HTTPRoute};
use cloud_gateway_controller::errors::ReconcileError;
use cloud_gateway_controller::reconcilers::{
    reconcile_gateway, reconcile_gatewayclass, reconcile_httproute, ReconcileOutcome, SkipReason,
};
use cloud_gateway_controller::store::{get_typed, MemoryStore};
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::{ApiResource, GroupVersionKind};
use serde_json::json;
use std::sync::Arc;

fn certificates() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("cert-manager.io", "v1", "Certificate"),
        "certificates",
    )
}

async fn accepted_status(store: &MemoryStore) -> Option<String> {
    let class: GatewayClass = get_typed(store, None, "default").await.ok()??;
    class
        .status?
        .conditions
        .into_iter()
        .find(|c| c.r#type == "Accepted")
        .map(|c| c.status)
}

#[tokio::test]
async fn test_claimed_gateway_produces_shadow_and_load_balancer() {
    let store = scenario_store(&[("tier2GatewayClass", "istio"), ("albTemplate", ALB_TEMPLATE)]);
    let ctx = context(&store);

    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway")
        .await
        .expect("reconcile succeeds");

    let shadow: Gateway = get_typed(&*store, Some(NAMESPACE), "foo-gateway-istio")
        .await
        .unwrap()
        .expect("shadow gateway created");
    assert_eq!(shadow.spec.gateway_class_name, "istio");
    assert_eq!(
        shadow
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get("networking.istio.io/service-type"))
            .map(String::as_str),
        Some("ClusterIP")
    );

    let alb: Ingress = get_typed(&*store, Some(NAMESPACE), "foo-gateway-alb")
        .await
        .unwrap()
        .expect("load balancer created");
    let owner = &alb.metadata.owner_references.expect("owned")[0];
    assert_eq!(owner.kind, "Gateway");
    assert_eq!(owner.name, "foo-gateway");
    assert_eq!(accepted_status(&store).await.as_deref(), Some("True"));
}

#[tokio::test]
async fn test_secondary_class_name_alias_is_honoured() {
    let store = scenario_store(&[("secondaryClassName", "istio")]);

    reconcile_gateway(&context(&store), NAMESPACE, "foo-gateway")
        .await
        .unwrap();

    let shadow: Option<Gateway> = get_typed(&*store, Some(NAMESPACE), "foo-gateway-istio")
        .await
        .unwrap();
    assert!(shadow.is_some());
}

#[tokio::test]
async fn test_certificate_template_uses_listeners_and_config() {
    let store = scenario_store(&[
        ("tier2GatewayClass", "istio"),
        ("certificateTemplate", CERTIFICATE_TEMPLATE),
        ("issuer", "letsencrypt"),
    ]);

    reconcile_gateway(&context(&store), NAMESPACE, "foo-gateway")
        .await
        .unwrap();

    let cert = store
        .object(&certificates(), Some(NAMESPACE), "foo-gateway-cert")
        .expect("certificate created");
    assert_eq!(cert.data["spec"]["dnsNames"], json!(["example.com"]));
    assert_eq!(cert.data["spec"]["issuerRef"]["name"], json!("letsencrypt"));
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let store = scenario_store(&[
        ("tier2GatewayClass", "istio"),
        ("albTemplate", ALB_TEMPLATE),
        ("certificateTemplate", CERTIFICATE_TEMPLATE),
        ("issuer", "letsencrypt"),
    ]);
    store
        .insert_typed(&http_route("foo-route", "foo-gateway"))
        .unwrap();
    let ctx = context(&store);

    reconcile_gatewayclass(&ctx, "default").await.unwrap();
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();
    reconcile_httproute(&ctx, NAMESPACE, "foo-route").await.unwrap();
    assert!(!store.writes().is_empty());
    store.clear_writes();

    reconcile_gatewayclass(&ctx, "default").await.unwrap();
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();
    reconcile_httproute(&ctx, NAMESPACE, "foo-route").await.unwrap();

    assert!(store.writes().is_empty(), "second pass wrote {:?}", store.writes());
}

#[tokio::test]
async fn test_parent_change_propagates_to_shadow() {
    let store = scenario_store(&[("tier2GatewayClass", "istio")]);
    let ctx = context(&store);
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();

    let mut parent: Gateway = get_typed(&*store, Some(NAMESPACE), "foo-gateway")
        .await
        .unwrap()
        .unwrap();
    parent.spec.listeners[0].port = 8443;
    store.insert_typed(&parent).unwrap();

    let outcome = reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();
    let ReconcileOutcome::Applied(summary) = outcome else {
        panic!("expected Applied, got {outcome:?}");
    };
    assert_eq!(summary.updated, 1);

    let shadow: Gateway = get_typed(&*store, Some(NAMESPACE), "foo-gateway-istio")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shadow.spec.listeners[0].port, 8443);
}

#[tokio::test]
async fn test_removed_parent_field_is_removed_from_shadow() {
    let store = scenario_store(&[("tier2GatewayClass", "istio")]);
    let ctx = context(&store);
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();

    let mut parent: Gateway = get_typed(&*store, Some(NAMESPACE), "foo-gateway")
        .await
        .unwrap()
        .unwrap();
    parent.spec.listeners[0].hostname = None;
    store.insert_typed(&parent).unwrap();

    let outcome = reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();
    let ReconcileOutcome::Applied(summary) = outcome else {
        panic!("expected Applied, got {outcome:?}");
    };
    assert_eq!(summary.updated, 1);

    let shadow: Gateway = get_typed(&*store, Some(NAMESPACE), "foo-gateway-istio")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shadow.spec.listeners[0].hostname, None);
}

#[tokio::test]
async fn test_field_removed_from_template_is_removed_from_child() {
    let store = scenario_store(&[("tier2GatewayClass", "istio"), ("albTemplate", ALB_TEMPLATE)]);
    let ctx = context(&store);
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();

    let trimmed = ALB_TEMPLATE.replace("  ingressClassName: alb\n", "");
    store
        .insert_typed(&config_map(
            "default-config",
            &[("tier2GatewayClass", "istio"), ("albTemplate", &trimmed)],
        ))
        .unwrap();
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();

    let alb: Ingress = get_typed(&*store, Some(NAMESPACE), "foo-gateway-alb")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alb.spec.unwrap().ingress_class_name, None);
}

#[tokio::test]
async fn test_foreign_controller_produces_nothing() {
    let store = Arc::new(MemoryStore::with_gateway_api());
    store
        .insert_typed(&gateway_class("default", "istio.io/gateway-controller", Some("default-config")))
        .unwrap();
    store
        .insert_typed(&gateway("foo-gateway", "default"))
        .unwrap();
    store
        .insert_typed(&http_route("foo-route", "foo-gateway"))
        .unwrap();
    let ctx = context(&store);

    assert_eq!(
        reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap(),
        ReconcileOutcome::Skipped(SkipReason::NotOurs)
    );
    assert_eq!(
        reconcile_httproute(&ctx, NAMESPACE, "foo-route").await.unwrap(),
        ReconcileOutcome::Skipped(SkipReason::NoClaimedParent)
    );
    assert_eq!(
        reconcile_gatewayclass(&ctx, "default").await.unwrap(),
        ReconcileOutcome::Skipped(SkipReason::NotOurs)
    );
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_missing_configuration_fails_and_marks_class() {
    let store = Arc::new(MemoryStore::with_gateway_api());
    store
        .insert_typed(&gateway_class("default", CONTROLLER, Some("default-config")))
        .unwrap();
    store
        .insert_typed(&gateway("foo-gateway", "default"))
        .unwrap();

    let err = reconcile_gateway(&context(&store), NAMESPACE, "foo-gateway")
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::ConfigBinding { .. }));
    assert!(!err.is_transient());
    assert_eq!(accepted_status(&store).await.as_deref(), Some("False"));
    let shadow: Option<Gateway> = get_typed(&*store, Some(NAMESPACE), "foo-gateway-istio")
        .await
        .unwrap();
    assert!(shadow.is_none());
    let ingresses = store.objects(&ApiResource::erase::<Ingress>(&()));
    assert!(ingresses.is_empty());
}

#[tokio::test]
async fn test_route_reparenting_stops_after_one_copy() {
    let store = scenario_store(&[("tier2GatewayClass", "istio")]);
    store
        .insert_typed(&http_route("foo-route", "foo-gateway"))
        .unwrap();
    let ctx = context(&store);
    reconcile_gateway(&ctx, NAMESPACE, "foo-gateway").await.unwrap();

    reconcile_httproute(&ctx, NAMESPACE, "foo-route").await.unwrap();
    let outcome = reconcile_httproute(&ctx, NAMESPACE, "foo-route-istio")
        .await
        .unwrap();

    assert!(matches!(outcome, ReconcileOutcome::Skipped(_)));
    let routes = store.objects(&ApiResource::erase::<HTTPRoute>(&()));
    let mut names: Vec<String> = routes
        .into_iter()
        .filter_map(|r| r.metadata.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["foo-route".to_string(), "foo-route-istio".to_string()]);
}
