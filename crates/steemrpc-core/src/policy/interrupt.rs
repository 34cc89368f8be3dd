//! Caller-side interruption of connect and call loops.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::RpcError;

/// Cloneable handle that aborts a client's retry loops.
///
/// Once [`trigger`](Self::trigger)ed, every pending backoff sleep and
/// in-flight send of the owning client returns [`RpcError::Interrupted`],
/// and so does every later attempt until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: Arc<Mutex<CancellationToken>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the current generation. A cancelled token stays cancelled,
    /// so [`reset`](Self::reset) swaps in a fresh one for every clone.
    fn current(&self) -> CancellationToken {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Signal interruption to every clone of this handle.
    pub fn trigger(&self) {
        self.current().cancel();
    }

    /// Clear the signal so the client can be used again.
    pub fn reset(&self) {
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.current().is_cancelled()
    }

    /// Fail fast if the signal is already set.
    pub fn check(&self) -> Result<(), RpcError> {
        if self.is_triggered() {
            Err(RpcError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Run `fut` to completion unless the signal fires first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, RpcError> {
        let token = self.current();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(RpcError::Interrupted),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `delay` unless the signal fires first.
    pub async fn sleep(&self, delay: Duration) -> Result<(), RpcError> {
        self.guard(tokio::time::sleep(delay)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_reflects_state() {
        let interrupt = Interrupt::new();
        assert!(interrupt.check().is_ok());
        interrupt.clone().trigger();
        assert!(matches!(interrupt.check(), Err(RpcError::Interrupted)));
        interrupt.reset();
        assert!(!interrupt.is_triggered());
    }

    #[test]
    fn reset_reaches_every_clone() {
        let interrupt = Interrupt::new();
        let other = interrupt.clone();
        other.trigger();
        interrupt.reset();
        assert!(!other.is_triggered());
        interrupt.trigger();
        assert!(other.is_triggered());
    }

    #[tokio::test]
    async fn sleep_completes_when_not_triggered() {
        let interrupt = Interrupt::new();
        assert!(interrupt.sleep(Duration::from_millis(5)).await.is_ok());
    }

    #[tokio::test]
    async fn trigger_aborts_long_sleep() {
        let interrupt = Interrupt::new();
        let remote = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remote.trigger();
        });
        let started = std::time::Instant::now();
        let result = interrupt.sleep(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(RpcError::Interrupted)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn guard_passes_output_through() {
        let interrupt = Interrupt::new();
        let out = interrupt.guard(async { 41 + 1 }).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn guard_prefers_interrupt_when_already_set() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let out = interrupt.guard(async { 1 }).await;
        assert!(matches!(out, Err(RpcError::Interrupted)));
    }

    #[tokio::test]
    async fn reset_after_trigger_allows_sleep() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        interrupt.reset();
        assert!(interrupt.sleep(Duration::from_millis(1)).await.is_ok());
    }
}
