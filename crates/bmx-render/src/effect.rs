//! How helper work is executed.
//!
//! The evaluator hands every helper result to an `Effect` before using
//! it. Ordinary helpers produce a ready result; effect helpers produce a
//! future. `Pure` refuses to wait for futures, so a pure render never
//! suspends and can be driven to completion without an executor. `Async`
//! awaits them.

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::function::FunctionError;

/// A helper's result, either already computed or still in flight.
pub enum Action<'a, T> {
    Ready(Result<T, FunctionError>),
    Suspend(BoxFuture<'a, Result<T, FunctionError>>),
}

pub trait Effect: Sync {
    fn run<'a, T: Send + 'a>(&self, action: Action<'a, T>) -> BoxFuture<'a, Result<T, FunctionError>>;
}

/// Synchronous execution. Suspending actions fail with
/// `FunctionError::Suspended` without being polled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pure;

impl Effect for Pure {
    fn run<'a, T: Send + 'a>(&self, action: Action<'a, T>) -> BoxFuture<'a, Result<T, FunctionError>> {
        let result = match action {
            Action::Ready(result) => result,
            Action::Suspend(_) => Err(FunctionError::Suspended),
        };
        future::ready(result).boxed()
    }
}

/// Asynchronous execution: suspending actions are awaited.
#[derive(Debug, Clone, Copy, Default)]
pub struct Async;

impl Effect for Async {
    fn run<'a, T: Send + 'a>(&self, action: Action<'a, T>) -> BoxFuture<'a, Result<T, FunctionError>> {
        match action {
            Action::Ready(result) => future::ready(result).boxed(),
            Action::Suspend(pending) => pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pending() -> Action<'static, i64> {
        Action::Suspend(async { Ok(7) }.boxed())
    }

    #[test]
    fn test_pure_passes_ready_results() {
        let result = Pure.run(Action::Ready(Ok(3))).now_or_never();
        assert_eq!(result, Some(Ok(3)));
    }

    #[test]
    fn test_pure_refuses_to_suspend() {
        let result = Pure.run(pending()).now_or_never();
        assert_eq!(result, Some(Err(FunctionError::Suspended)));
    }

    #[tokio::test]
    async fn test_async_awaits_suspended_actions() {
        let result = Async
            .run(Action::Suspend(
                async {
                    tokio::task::yield_now().await;
                    Ok(7)
                }
                .boxed(),
            ))
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(Async.run(pending()).await, Ok(7));
    }
}
