// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `kube_store.rs`

#[cfg(test)]
mod tests {
    use super::super::map_kube_error;
    use crate::errors::StoreError;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(
            kube::core::Status::failure(&format!("request failed: {reason}"), reason)
                .with_code(code)
                .boxed(),
        )
    }

    #[test]
    fn test_404_is_not_found() {
        let err = map_kube_error(api_error(404, "NotFound"), "Gateway", "foo-gateway", false);
        assert_eq!(
            err,
            StoreError::NotFound {
                kind: "Gateway".to_string(),
                name: "foo-gateway".to_string(),
            }
        );
    }

    #[test]
    fn test_409_depends_on_operation() {
        let on_create = map_kube_error(api_error(409, "AlreadyExists"), "Gateway", "gw", true);
        assert!(matches!(on_create, StoreError::AlreadyExists { .. }));

        let on_update = map_kube_error(api_error(409, "Conflict"), "Gateway", "gw", false);
        assert!(matches!(on_update, StoreError::Conflict { ref message, .. } if message.contains("Conflict")));
    }

    #[test]
    fn test_throttling_and_server_errors_are_unavailable() {
        for code in [429, 500, 503, 599] {
            let err = map_kube_error(api_error(code, "ServerError"), "Ingress", "alb", false);
            assert!(matches!(err, StoreError::Unavailable(_)), "code {code}: {err:?}");
        }
    }

    #[test]
    fn test_other_client_errors_are_invalid() {
        for code in [400, 403, 422] {
            let err = map_kube_error(api_error(code, "Invalid"), "Ingress", "alb", false);
            assert!(matches!(err, StoreError::Invalid(_)), "code {code}: {err:?}");
        }
    }
}
