//! Remote side of a repository

use async_trait::async_trait;
use futures::future::Map;
use futures::FutureExt;
use std::future::Future;
use tether_core::{Failure, Outcome};

/// Fetches a fresh copy of the payload from its source of truth.
///
/// Any `Fn() -> impl Future<Output = Outcome<T>>` closure is a fetcher; use
/// [`fallible`] to adapt functions that return `Result`.
#[async_trait]
pub trait RemoteFetch<T>: Send + Sync {
    async fn fetch(&self) -> Outcome<T>;
}

#[async_trait]
impl<T, F, Fut> RemoteFetch<T> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<T>> + Send,
    T: Send + 'static,
{
    async fn fetch(&self) -> Outcome<T> {
        self().await
    }
}

fn into_outcome<T, E: Into<Failure>>(result: Result<T, E>) -> Outcome<T> {
    Outcome::from(result)
}

/// Adapt a `Result`-returning async function into a fetcher
pub fn fallible<F, Fut, T, E>(
    fetch: F,
) -> impl Fn() -> Map<Fut, fn(Result<T, E>) -> Outcome<T>> + Send + Sync
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Failure>,
{
    move || fetch().map(into_outcome::<T, E> as fn(Result<T, E>) -> Outcome<T>)
}
