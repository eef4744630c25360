// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{ReconcileError, RenderError, StoreError};
    use crate::status_reasons::{
        REASON_INVALID_PARAMETERS, REASON_KIND_UNRESOLVABLE, REASON_TEMPLATE_RENDER_FAILED,
    };
    use std::time::Duration;

    #[test]
    fn test_store_conflict_maps_to_write_conflict() {
        let err: ReconcileError = StoreError::Conflict {
            kind: "Gateway".to_string(),
            name: "foo-gateway-istio".to_string(),
            message: "the object has been modified".to_string(),
        }
        .into();

        assert_eq!(
            err,
            ReconcileError::WriteConflict {
                kind: "Gateway".to_string(),
                name: "foo-gateway-istio".to_string(),
            }
        );
        assert!(err.is_transient());
    }

    #[test]
    fn test_store_unresolvable_maps_to_resolution() {
        let err: ReconcileError = StoreError::Unresolvable {
            api_version: "example.com/v1".to_string(),
            kind: "LoadBalancer".to_string(),
        }
        .into();

        assert!(matches!(err, ReconcileError::Resolution { .. }));
        assert!(!err.is_transient());
        assert_eq!(err.reason(), REASON_KIND_UNRESOLVABLE);
    }

    #[test]
    fn test_store_unavailable_is_transient() {
        let err: ReconcileError = StoreError::Unavailable("connection refused".to_string()).into();
        assert!(err.is_transient());
        assert!(!err.is_class_visible());
    }

    #[test]
    fn test_render_errors_are_class_visible_and_persistent() {
        let err: ReconcileError = RenderError::Execution {
            key: "albTemplate".to_string(),
            message: "undefined value".to_string(),
        }
        .into();

        assert!(err.is_class_visible());
        assert!(!err.is_transient());
        assert_eq!(err.reason(), REASON_TEMPLATE_RENDER_FAILED);
        assert!(err.to_string().contains("albTemplate"));
    }

    #[test]
    fn test_config_binding_reason() {
        let err = ReconcileError::ConfigBinding {
            class: "default".to_string(),
            message: "ConfigMap default/params not found".to_string(),
        };
        assert!(err.is_class_visible());
        assert_eq!(err.reason(), REASON_INVALID_PARAMETERS);
    }

    #[test]
    fn test_cancelled_is_transient() {
        let err = ReconcileError::Cancelled(Duration::from_secs(30));
        assert!(err.is_transient());
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_render_error_variants_are_distinguishable() {
        let syntax = RenderError::Syntax {
            key: "k".to_string(),
            message: "m".to_string(),
        };
        let parse = RenderError::Parse {
            key: "k".to_string(),
            message: "m".to_string(),
        };
        assert_ne!(syntax, parse);
        assert!(syntax.to_string().contains("syntax"));
        assert!(parse.to_string().contains("does not parse"));
    }
}
