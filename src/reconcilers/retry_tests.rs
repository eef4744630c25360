// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{retry_on_conflict, ConflictBackoff};
    use crate::errors::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn conflict() -> StoreError {
        StoreError::Conflict {
            kind: "Gateway".to_string(),
            name: "foo-gateway-istio".to_string(),
            message: "the object has been modified".to_string(),
        }
    }

    #[test]
    fn test_backoff_starts_at_50ms_and_doubles() {
        let mut backoff = ConflictBackoff::default();
        assert_eq!(backoff.upcoming(), Duration::from_millis(50));

        let first = backoff.next_delay();
        assert!(first >= Duration::from_millis(45) && first <= Duration::from_millis(55));
        assert_eq!(backoff.upcoming(), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_is_capped_at_one_second() {
        let mut backoff = ConflictBackoff::default();
        for _ in 0..10 {
            backoff.next_delay();
        }

        assert_eq!(backoff.upcoming(), Duration::from_secs(1));
        assert!(backoff.next_delay() <= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_is_retried_until_success() {
        let calls = &AtomicU32::new(0);

        let result = retry_on_conflict(
            3,
            || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(conflict())
                } else {
                    Ok("written")
                }
            },
            "replace gateway",
        )
        .await;

        assert_eq!(result.unwrap(), "written");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_exhaustion_returns_conflict() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = retry_on_conflict(
            3,
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(conflict())
            },
            "replace gateway",
        )
        .await;

        assert_eq!(result.unwrap_err(), conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = retry_on_conflict(
            3,
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("connection refused".to_string()))
            },
            "replace gateway",
        )
        .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
