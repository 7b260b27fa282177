//! Execution controls: per-attempt timeout and retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::client::ExecutionClient;
use crate::config::ExecutionConfig;
use crate::domain::{Code, ExecutionResult, Result, VerifierError};

/// Upper bound on a single backoff sleep.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay before retry number `attempt` (1-based): `backoff_base_ms * 2^(attempt-1)`,
/// saturating and capped at [`MAX_BACKOFF_MS`].
pub fn backoff_delay(config: &ExecutionConfig, attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let ms = config.backoff_base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

/// Run `op` under `config`'s timeout, retrying transient failures.
///
/// Only [`VerifierError::is_transient`] errors are retried. When attempts are
/// exhausted the last error is returned.
pub async fn execute_with_controls<F, Fut, T>(
    config: &ExecutionConfig,
    operation: &str,
    op: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_retries.saturating_add(1);
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut attempt = 1;

    loop {
        let error = match tokio::time::timeout(timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_elapsed) => VerifierError::Timeout {
                operation: operation.to_string(),
                limit_ms: config.timeout_ms,
            },
        };

        if !error.is_transient() || attempt >= max_attempts {
            return Err(error);
        }

        let delay = backoff_delay(config, attempt);
        warn!(
            event = "execution.retry",
            operation = %operation,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Wraps an [`ExecutionClient`] with [`execute_with_controls`].
#[derive(Debug, Clone)]
pub struct ControlledClient<C> {
    inner: C,
    config: ExecutionConfig,
}

impl<C> ControlledClient<C> {
    pub fn new(inner: C, config: ExecutionConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ExecutionClient> ExecutionClient for ControlledClient<C> {
    async fn execute(&self, code: &Code) -> Result<ExecutionResult> {
        execute_with_controls(&self.config, "execute snippet", || self.inner.execute(code)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(timeout_ms: u64, max_retries: u32) -> ExecutionConfig {
        ExecutionConfig {
            timeout_ms,
            max_retries,
            backoff_base_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let value = execute_with_controls(&config(1000, 2), "op", || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Ok(42)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let counter = Arc::new(AtomicU32::new(0));
        let value = execute_with_controls(&config(1000, 2), "op", || {
            let c = counter.clone();
            async move {
                let n = c.fetch_add(1, Ordering::Relaxed);
                if n < 2 {
                    Err(VerifierError::Transport("connection reset".into()))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let err = execute_with_controls(&config(1000, 1), "op", || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Err::<(), _>(VerifierError::Transport("down".into()))
            }
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("down"));
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let err = execute_with_controls(&config(1000, 3), "op", || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Err::<(), _>(VerifierError::InvalidConfig("bad".into()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, VerifierError::InvalidConfig(_)));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let cfg = ExecutionConfig {
            timeout_ms: 1000,
            max_retries: 2,
            backoff_base_ms: 500,
        };
        assert_eq!(backoff_delay(&cfg, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(&cfg, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&cfg, 30), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(&cfg, 70), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(&cfg, u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[tokio::test]
    async fn test_many_retries_do_not_overflow() {
        let counter = Arc::new(AtomicU32::new(0));
        let cfg = ExecutionConfig {
            timeout_ms: 1000,
            max_retries: 70,
            backoff_base_ms: 0,
        };
        let err = execute_with_controls(&cfg, "op", || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Err::<(), _>(VerifierError::Transport("down".into()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, VerifierError::Transport(_)));
        assert_eq!(counter.load(Ordering::Relaxed), 71);
    }

    #[tokio::test]
    async fn test_timeout_becomes_timeout_error() {
        let err = execute_with_controls(&config(50, 0), "slow op", || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        match err {
            VerifierError::Timeout {
                operation,
                limit_ms,
            } => {
                assert_eq!(operation, "slow op");
                assert_eq!(limit_ms, 50);
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}
