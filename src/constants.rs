// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the cloud gateway controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the Gateway API kinds
pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";

/// Kind name for `Gateway` resource
pub const KIND_GATEWAY: &str = "Gateway";

/// Kind name for `GatewayClass` resource
pub const KIND_GATEWAY_CLASS: &str = "GatewayClass";

/// Kind name for `HTTPRoute` resource
pub const KIND_HTTP_ROUTE: &str = "HTTPRoute";

/// Kind name for `ConfigMap` resource
pub const KIND_CONFIG_MAP: &str = "ConfigMap";

// ============================================================================
// Engine Identity Constants
// ============================================================================

/// Default controller name written into `GatewayClass.spec.controllerName`
pub const DEFAULT_CONTROLLER_NAME: &str = "github.com/pixelperfekt-dk/cloud-gateway-controller";

// ============================================================================
// Class Configuration Keys (ConfigMap data)
// ============================================================================

/// Secondary gateway class the shadow gateway is re-targeted at
pub const CONFIG_KEY_TIER2_GATEWAY_CLASS: &str = "tier2GatewayClass";

/// Alias accepted for [`CONFIG_KEY_TIER2_GATEWAY_CLASS`]
pub const CONFIG_KEY_SECONDARY_CLASS_NAME: &str = "secondaryClassName";

/// Template body for the load-balancer front-end child
pub const CONFIG_KEY_ALB_TEMPLATE: &str = "albTemplate";

/// Template body for the TLS certificate child
pub const CONFIG_KEY_CERTIFICATE_TEMPLATE: &str = "certificateTemplate";

// ============================================================================
// Condition Constants
// ============================================================================

/// Condition type reported on `GatewayClass` status
pub const CONDITION_TYPE_ACCEPTED: &str = "Accepted";

/// Condition status value for a satisfied condition
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition status value for an unsatisfied condition
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Default per-invocation reconcile deadline (30 seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for a single optimistic-concurrency write
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Requeue duration after a successful reconcile (5 minutes)
pub const RESYNC_REQUEUE_DURATION_SECS: u64 = 300;

/// Requeue duration for transient controller errors (5 seconds)
pub const TRANSIENT_ERROR_REQUEUE_DURATION_SECS: u64 = 5;

/// Requeue duration for persistent controller errors (60 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 60;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// HTTP Server Constants
// ============================================================================

/// Default bind address for the health, metrics and webhook server
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Secondary class used by the `/sync` webhook when the request names none
pub const DEFAULT_WEBHOOK_SECONDARY_CLASS: &str = "istio";
