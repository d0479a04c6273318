//! Saga step actions.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A forward action or a compensation.
#[async_trait]
pub trait SagaAction: Send + Sync {
    async fn execute(&self) -> Result<()>;
}

struct FnAction<F>(F);

#[async_trait]
impl<F, Fut> SagaAction for FnAction<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn execute(&self) -> Result<()> {
        (self.0)().await
    }
}

/// Wrap an async closure as a saga action. Called once per attempt.
pub fn action_fn<F, Fut>(f: F) -> Arc<dyn SagaAction>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnAction(f))
}

/// Action that does nothing and always succeeds.
pub fn noop() -> Arc<dyn SagaAction> {
    action_fn(|| async { Ok(()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhasegateError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_action_fn_runs_each_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let action = action_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        action.execute().await.unwrap();
        action.execute().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_action_fn_propagates_error() {
        let action = action_fn(|| async { Err(PhasegateError::SagaStep("lock held".into())) });
        assert!(action.execute().await.is_err());
    }

    #[tokio::test]
    async fn test_noop() {
        assert!(noop().execute().await.is_ok());
    }
}
