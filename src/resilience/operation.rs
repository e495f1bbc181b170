//! Protected operation capability.
//!
//! # Responsibilities
//! - Give the executor one uniform way to start an attempt
//! - Hand each attempt a cancellation token
//!
//! # Design Decisions
//! - The caller picks the adapter: [`NonBlocking`] futures are awaited inline,
//!   [`Blocking`] closures are dispatched to Tokio's blocking pool
//! - Non-blocking attempts are dropped when their deadline fires
//! - Blocking attempts cannot be preempted; they should poll the token,
//!   otherwise they run to completion and their result is discarded

use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A named dependency call that can be attempted repeatedly.
pub trait Operation: Send + Sync {
    type Output: Send + 'static;
    type Error: Send + 'static;

    /// Start one attempt. `cancel` fires when the attempt's deadline passes.
    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<Self::Output, Self::Error>>;
}

/// Adapter for async operations, awaited on the caller's task.
#[derive(Debug, Clone)]
pub struct NonBlocking<F> {
    f: F,
}

impl<F> NonBlocking<F> {
    pub fn new<Fut, T, E>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        Self { f }
    }
}

impl<F, Fut, T, E> Operation for NonBlocking<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<T, E>> {
        (self.f)(cancel).boxed()
    }
}

/// Adapter for blocking operations, run on a dedicated blocking thread.
#[derive(Debug)]
pub struct Blocking<F> {
    f: Arc<F>,
}

impl<F> Blocking<F> {
    pub fn new<T, E>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Result<T, E>,
    {
        Self { f: Arc::new(f) }
    }
}

impl<F> Clone for Blocking<F> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<F, T, E> Operation for Blocking<F>
where
    F: Fn(CancellationToken) -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<T, E>> {
        let f = Arc::clone(&self.f);
        async move {
            match tokio::task::spawn_blocking(move || f(cancel)).await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                // Runtime is shutting down; let the attempt deadline resolve the call.
                Err(_) => std::future::pending().await,
            }
        }
        .boxed()
    }
}

/// Wrap an async closure as an [`Operation`].
pub fn non_blocking<F, Fut, T, E>(f: F) -> NonBlocking<F>
where
    F: Fn(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    NonBlocking::new(f)
}

/// Wrap a blocking closure as an [`Operation`].
pub fn blocking<F, T, E>(f: F) -> Blocking<F>
where
    F: Fn(CancellationToken) -> Result<T, E>,
{
    Blocking::new(f)
}
