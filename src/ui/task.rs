//! Deferred work returned from `update` functions.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

/// A batch of futures, each producing at most one follow-up message.
///
/// Tasks are inert until handed to the [`Runtime`](super::runtime::Runtime).
#[must_use = "tasks do nothing unless handed to the runtime"]
pub struct Task<M> {
    futures: Vec<BoxFuture<'static, Option<M>>>,
}

impl<M: Send + 'static> Task<M> {
    pub fn none() -> Self {
        Self { futures: Vec::new() }
    }

    pub fn done(message: M) -> Self {
        Self::future(async move { message })
    }

    pub fn future(future: impl Future<Output = M> + Send + 'static) -> Self {
        Self {
            futures: vec![future.map(Some).boxed()],
        }
    }

    /// Runs `future` and turns its output into a message with `f`.
    pub fn perform<T>(future: impl Future<Output = T> + Send + 'static, f: impl FnOnce(T) -> M + Send + 'static) -> Self {
        Self::future(future.map(f))
    }

    /// Runs a future purely for its side effects.
    pub fn consume(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Self {
            futures: vec![future.map(|()| None).boxed()],
        }
    }

    pub fn batch(tasks: impl IntoIterator<Item = Task<M>>) -> Self {
        Self {
            futures: tasks.into_iter().flat_map(|t| t.futures).collect(),
        }
    }

    pub fn map<N: Send + 'static>(self, f: impl Fn(M) -> N + Send + Sync + 'static) -> Task<N> {
        let f = Arc::new(f);
        Task {
            futures: self
                .futures
                .into_iter()
                .map(|future| {
                    let f = f.clone();
                    future.map(move |message| message.map(|m| (*f)(m))).boxed()
                })
                .collect(),
        }
    }

    pub fn into_futures(self) -> Vec<BoxFuture<'static, Option<M>>> {
        self.futures
    }
}

impl<M> std::fmt::Debug for Task<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("futures", &self.futures.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect<M: Send + 'static>(task: Task<M>) -> Vec<Option<M>> {
        futures::future::join_all(task.into_futures()).await
    }

    #[tokio::test]
    async fn batch_then_map_keeps_every_future() {
        let task = Task::batch([Task::done(1), Task::none(), Task::perform(async { 2 }, |n| n * 10)]).map(|n| n + 1);
        assert_eq!(collect(task).await, vec![Some(2), Some(21)]);
    }

    #[tokio::test]
    async fn consume_produces_no_message() {
        let task: Task<u8> = Task::batch([Task::consume(async {}), Task::done(7)]);
        assert_eq!(collect(task).await, vec![None, Some(7)]);
    }
}
