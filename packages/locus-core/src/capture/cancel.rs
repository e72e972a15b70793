//! Cancellation for the position fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cloneable handle that cancels an in-flight capture's position fetch.
///
/// Cancelling is sticky: once cancelled, every current and future
/// waiter on [`cancelled`](Self::cancelled) completes immediately.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every operation watching this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Completes once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel
            // cannot slip between the check and the await.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Cancel this token when the returned guard is dropped
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: self.clone(),
        }
    }
}

/// Cancels its token on drop, see [`CancelToken::drop_guard`]
#[derive(Debug)]
pub struct CancelOnDrop {
    token: CancelToken,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_already_cancelled_completes_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());

        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("cancelled() should complete");
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiter_on_clone() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[test]
    fn test_drop_guard_cancels() {
        let token = CancelToken::new();
        let guard = token.drop_guard();
        assert!(!token.is_cancelled());

        drop(guard);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_uncancelled_token_stays_pending() {
        let token = CancelToken::new();
        let result = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(result.is_err());
    }
}
