//! Bridging completion callbacks into futures.
//!
//! Callback-style asynchronous APIs report their outcome by invoking a
//! callback once. [`completion_channel`] produces a [`Completer`] to hand to
//! such an API and a [`Completion`] future that settles with whatever the
//! completer delivers.
//!
//! ```
//! use trellis_core::CompletionDropped;
//! use trellis_core::completion::completion_channel;
//!
//! let (completer, completion) = completion_channel::<u32, CompletionDropped>();
//! std::thread::spawn(move || completer.complete(Ok(7)));
//! assert_eq!(completion.blocking_wait(), Ok(7));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::CompletionDropped;

/// The sending half of a completion channel.
///
/// Consuming [`complete`](Self::complete) guarantees a single settlement.
/// Dropping the completer without completing settles the paired
/// [`Completion`] with [`CompletionDropped`].
#[derive(Debug)]
pub struct Completer<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Completer<T, E> {
    /// Settle the paired completion with `result`.
    ///
    /// Does nothing if the completion was already dropped.
    pub fn complete(self, result: Result<T, E>) {
        let _ = self.sender.send(result);
    }

    /// Returns true if nobody is waiting for the result anymore.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A future that resolves once the paired [`Completer`] settles.
#[derive(Debug)]
#[must_use = "a completion does nothing unless awaited or waited on"]
pub struct Completion<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E: From<CompletionDropped>> Completion<T, E> {
    /// Wait for the result, blocking the current thread.
    ///
    /// # Warning
    ///
    /// Do not call this from within an async context.
    pub fn blocking_wait(self) -> Result<T, E> {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(E::from(CompletionDropped)))
    }
}

impl<T, E: From<CompletionDropped>> Future for Completion<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(E::from(CompletionDropped))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create a connected [`Completer`]/[`Completion`] pair.
pub fn completion_channel<T, E>() -> (Completer<T, E>, Completion<T, E>) {
    let (sender, receiver) = oneshot::channel();
    (Completer { sender }, Completion { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Failed(&'static str),
        Dropped,
    }

    impl From<CompletionDropped> for TestError {
        fn from(_: CompletionDropped) -> Self {
            TestError::Dropped
        }
    }

    #[tokio::test]
    async fn test_completion_resolves() {
        let (completer, completion) = completion_channel::<String, TestError>();
        completer.complete(Ok("done".to_string()));
        assert_eq!(completion.await, Ok("done".to_string()));
    }

    #[tokio::test]
    async fn test_completion_rejects() {
        let (completer, completion) = completion_channel::<(), TestError>();
        completer.complete(Err(TestError::Failed("disk")));
        assert_eq!(completion.await, Err(TestError::Failed("disk")));
    }

    #[tokio::test]
    async fn test_dropped_completer_settles() {
        let (completer, completion) = completion_channel::<(), TestError>();
        drop(completer);
        assert_eq!(completion.await, Err(TestError::Dropped));
    }

    #[tokio::test]
    async fn test_completion_from_another_thread() {
        let (completer, completion) = completion_channel::<u32, TestError>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            completer.complete(Ok(5));
        });
        assert_eq!(completion.await, Ok(5));
    }

    #[test]
    fn test_blocking_wait() {
        let (completer, completion) = completion_channel::<u32, TestError>();
        std::thread::spawn(move || completer.complete(Ok(9)));
        assert_eq!(completion.blocking_wait(), Ok(9));
    }

    #[test]
    fn test_is_abandoned() {
        let (completer, completion) = completion_channel::<u32, TestError>();
        assert!(!completer.is_abandoned());
        drop(completion);
        assert!(completer.is_abandoned());
    }
}
