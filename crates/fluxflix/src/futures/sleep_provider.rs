use crate::Result;
use core::{future::Future, time::Duration};

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
///
/// This allows the event stream to be generic over runtimes like `Tokio` or
/// `Smol`, and lets tests substitute a timer that completes instantly.
pub trait SleepProvider {
    /// We require `Send` so that the future can be safely moved across threads
    type Sleep: Future<Output = ()> + Send;

    fn sleep_for(&self, dur: Duration) -> Self::Sleep;

    /// Checks that the timer backing this provider can be used from the
    /// calling context.
    ///
    /// Called once when a stream is opened, before any other resource is
    /// allocated for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// when no timer is available.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}
