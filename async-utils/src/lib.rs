//! Small async helpers shared by the log window crates.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Returned when a future lost the race against its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Drive `self` to completion unless `token` fires first.
    ///
    /// A token that is already cancelled wins even if `self` is immediately
    /// ready, so callers can rely on "cancelled means nothing ran".
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Cancelled),
            output = self => Ok(output),
        }
    }
}

/// Sleep for `duration`, returning early with `Err(Cancelled)` when `token` fires.
pub async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> Result<(), Cancelled> {
    tokio::time::sleep(duration).or_cancel(token).await
}
