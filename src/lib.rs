// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Cloud Gateway Controller - Gateway API derivation for Kubernetes
//!
//! A Kubernetes controller that claims `Gateway` objects through their
//! `GatewayClass` and derives the resources that implement them.
//!
//! ## Overview
//!
//! For every `Gateway` whose class names this controller, the controller:
//!
//! - Creates a shadow `Gateway` named `<gateway>-<secondaryClass>`, handed to the
//!   secondary class (e.g. Istio) with a `ClusterIP` service
//! - Renders the templates of the class `ConfigMap` (load balancer, certificate)
//!   into children owned by the `Gateway`
//! - Copies each attached `HTTPRoute` onto the shadow gateway
//! - Reports configuration problems as an `Accepted` condition on the class
//!
//! ## Modules
//!
//! - [`crd`] - Gateway API resource types
//! - [`store`] - Store capability, backed by the API server or by memory
//! - [`reconcilers`] - Reconciliation logic for each resource type
//! - [`context`] - Shared context handed to the reconcilers
//! - [`webhook`] - Health, metrics and the composite-controller `/sync` endpoint
//!
//! ## Example
//!
//! ```rust
//! use cloud_gateway_controller::crd::{Gateway, GatewaySpec};
//! use cloud_gateway_controller::reconcilers::builder::shadow_gateway_for;
//!
//! let parent = Gateway::new(
//!     "foo-gateway",
//!     GatewaySpec {
//!         gateway_class_name: "default".to_string(),
//!         ..Default::default()
//!     },
//! );
//! let shadow = shadow_gateway_for(&parent, "istio");
//! assert_eq!(shadow.metadata.name.as_deref(), Some("foo-gateway-istio"));
//! assert_eq!(shadow.spec.gateway_class_name, "istio");
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod document;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod status_reasons;
pub mod store;
pub mod webhook;
