//! One-shot load completion
//!
//! A reload hands the caller a [`LoadFuture`] and keeps the matching
//! [`LoadCompleter`]. Dropping the completer without resolving it aborts the
//! load.

use crate::MediaError;
use futures::channel::oneshot;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolves to `Ok(())` once the surface can play, or the load failure
#[derive(Debug)]
pub struct LoadFuture {
    surface: String,
    rx: oneshot::Receiver<Result<(), MediaError>>,
}

/// Surface-side half of a pending load
#[derive(Debug)]
pub struct LoadCompleter {
    surface: String,
    tx: oneshot::Sender<Result<(), MediaError>>,
}

impl LoadFuture {
    /// Create a pending load for `surface`
    pub fn pending(surface: impl Into<String>) -> (LoadCompleter, LoadFuture) {
        let surface = surface.into();
        let (tx, rx) = oneshot::channel();
        (
            LoadCompleter {
                surface: surface.clone(),
                tx,
            },
            LoadFuture { surface, rx },
        )
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Poll once without a runtime; `None` while the load is still pending
    pub fn poll_now(&mut self) -> Option<Result<(), MediaError>> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        match self.poll_unpin(&mut cx) {
            Poll::Ready(result) => Some(result),
            Poll::Pending => None,
        }
    }
}

impl Future for LoadFuture {
    type Output = Result<(), MediaError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(MediaError::LoadAborted {
                surface: self.surface.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl LoadCompleter {
    /// Signal that the surface can play
    pub fn resolve(self) {
        self.complete(Ok(()));
    }

    /// Signal a load failure
    pub fn fail(self, reason: impl Into<String>) {
        let error = MediaError::LoadFailed {
            surface: self.surface.clone(),
            reason: reason.into(),
        };
        self.complete(Err(error));
    }

    fn complete(self, result: Result<(), MediaError>) {
        // The waiting side may already have given up.
        let _ = self.tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_resolved() {
        let (completer, mut future) = LoadFuture::pending("response");
        assert!(future.poll_now().is_none());

        completer.resolve();
        assert_eq!(future.poll_now(), Some(Ok(())));
    }

    #[test]
    fn test_failure_carries_surface_name() {
        let (completer, mut future) = LoadFuture::pending("response");
        completer.fail("network error");

        match future.poll_now() {
            Some(Err(MediaError::LoadFailed { surface, reason })) => {
                assert_eq!(surface, "response");
                assert_eq!(reason, "network error");
            }
            other => panic!("unexpected poll result: {:?}", other),
        }
    }

    #[test]
    fn test_dropped_completer_aborts() {
        let (completer, mut future) = LoadFuture::pending("response");
        drop(completer);

        assert!(matches!(
            future.poll_now(),
            Some(Err(MediaError::LoadAborted { .. }))
        ));
    }

    #[tokio::test]
    async fn test_awaitable_on_runtime() {
        let (completer, future) = LoadFuture::pending("response");
        tokio::spawn(async move { completer.resolve() });
        assert_eq!(future.await, Ok(()));
    }
}
