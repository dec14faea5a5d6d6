//! Partial-failure fan-out
//!
//! Aggregating DAOs (Compute Optimizer across its resource families)
//! launch one sub-fetch per family and merge whatever succeeded. A
//! failure never cancels sibling in-flight calls; the merge only
//! becomes a total failure when every sub-call failed.

use super::error::{Error, Result};
use futures::future;
use std::future::Future;

/// Decision rule for when individual sub-call failures become a total
/// failure: only when nothing succeeded at all.
pub fn total_failure(ok_count: usize, failures: &[Error]) -> bool {
    ok_count == 0 && !failures.is_empty()
}

/// Await all sub-fetches and merge the successful results.
///
/// Individual failures are logged and dropped; when every sub-call
/// fails the joined error is returned instead. Result ordering follows
/// task order, not completion order; callers wanting a display order
/// still apply their own deterministic sort.
pub async fn merge_partial<T, F>(label: &str, tasks: Vec<F>) -> Result<Vec<T>>
where
    F: Future<Output = Result<Vec<T>>>,
{
    let results = future::join_all(tasks).await;

    let mut merged = Vec::new();
    let mut failures = Vec::new();
    let mut ok_count = 0usize;

    for result in results {
        match result {
            Ok(items) => {
                ok_count += 1;
                merged.extend(items);
            }
            Err(e) => {
                tracing::warn!("{}: sub-fetch failed: {}", label, e);
                failures.push(e);
            }
        }
    }

    if total_failure(ok_count, &failures) {
        let joined = failures
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Api {
            operation: label.to_string(),
            message: format!("all {} sub-requests failed: {}", failures.len(), joined),
        });
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;

    type Task = Pin<Box<dyn Future<Output = Result<Vec<u32>>>>>;

    async fn ok(items: Vec<u32>) -> Result<Vec<u32>> {
        Ok(items)
    }

    async fn fail(msg: &str) -> Result<Vec<u32>> {
        Err(Error::Api {
            operation: "sub".into(),
            message: msg.to_string(),
        })
    }

    #[tokio::test]
    async fn partial_failure_returns_union_of_successes() {
        let tasks: Vec<Task> = vec![
            Box::pin(ok(vec![1, 2])),
            Box::pin(fail("family down")),
            Box::pin(ok(vec![3])),
        ];
        let merged = merge_partial("recommendations", tasks).await.unwrap();
        assert_eq!(merged, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn all_failed_joins_every_error() {
        let tasks: Vec<Task> = vec![Box::pin(fail("one")), Box::pin(fail("two"))];
        let err = merge_partial("recommendations", tasks).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("one"));
        assert!(message.contains("two"));
    }

    #[tokio::test]
    async fn empty_success_is_not_a_failure() {
        let tasks: Vec<Task> = vec![Box::pin(ok(vec![])), Box::pin(fail("family down"))];
        let merged = merge_partial("recommendations", tasks).await.unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn total_failure_rule() {
        assert!(!total_failure(0, &[]));
        assert!(!total_failure(1, &[Error::ReadOnlyDenied]));
        assert!(total_failure(0, &[Error::ReadOnlyDenied]));
    }
}
