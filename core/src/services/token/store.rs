//! Time-bounded session store calls

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::errors::DomainError;

/// Run a store call, failing with `StoreTimeout` if it outlives `timeout`
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(operation, timeout_ms, "Session store call timed out");
            Err(DomainError::StoreTimeout {
                operation: operation.to_string(),
                timeout_ms,
            })
        }
    }
}
