use crate::SleepProvider;
use core::time::Duration;
use pin_project_lite::pin_project;
use smol::Timer;
use std::{
    pin::Pin,
    task::{Context, Poll},
};

/// An implementation of [`SleepProvider`] using Smol's timer.
///
/// This is the default provider for use in async applications built on Smol.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmolSleep;

impl SleepProvider for SmolSleep {
    type Sleep = SmolSleepFuture;

    fn sleep_for(&self, dur: Duration) -> Self::Sleep {
        SmolSleepFuture {
            timer: Timer::after(dur),
        }
    }
}

pin_project! {
    /// Future returned by [`SmolSleep::sleep_for`].
    ///
    /// This type wraps a [`smol::Timer`] and implements [`Future`] with `Output
    /// = ()`, discarding the timer's `Instant` result.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct SmolSleepFuture {
        #[pin]
        timer: Timer,
    }
}

impl Future for SmolSleepFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.project().timer.poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}
