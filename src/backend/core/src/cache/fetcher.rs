//! Fetch strategies that produce the per-identity snapshot on a cache miss.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::authz::UserId;
use crate::error::Result;

/// Produces a fresh snapshot for one user.
///
/// Implementations own every upstream concern (timeouts, retries, fan-out
/// over engines). The cache calls `fetch` at most once per key at a time and
/// passes errors through to the caller untouched.
#[async_trait]
pub trait AuthorizationFetcher<T>: Send + Sync {
    async fn fetch(&self, user_id: &UserId) -> Result<T>;
}

#[async_trait]
impl<T, F> AuthorizationFetcher<T> for Arc<F>
where
    F: AuthorizationFetcher<T> + ?Sized,
    T: Send + 'static,
{
    async fn fetch(&self, user_id: &UserId) -> Result<T> {
        (**self).fetch(user_id).await
    }
}

/// Adapts an async closure into a fetcher.
pub struct FetchFn<F>(F);

impl<F> FetchFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<T, F, Fut> AuthorizationFetcher<T> for FetchFn<F>
where
    F: Fn(UserId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
    T: Send + 'static,
{
    async fn fetch(&self, user_id: &UserId) -> Result<T> {
        (self.0)(user_id.clone()).await
    }
}
