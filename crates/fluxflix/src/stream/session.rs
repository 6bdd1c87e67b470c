use super::Cadence;
use crate::{MovieEvent, SleepProvider, TimeSource};
use core::{
    fmt,
    pin::Pin,
    task::{Context, Poll, ready},
    time::Duration,
};
use futures::{Stream, stream::FusedStream};
use pin_project_lite::pin_project;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

pin_project! {
    /// One live event stream session for a single subscriber.
    ///
    /// Produced by [`EventStreamGenerator::open_stream`](crate::EventStreamGenerator::open_stream).
    /// Nothing happens until the stream is polled: each call to `poll_next`
    /// either emits the next event immediately, when the cadence since the
    /// previous emission has already elapsed, or arms the session's timer for
    /// the remainder and resolves once it fires. At most one event is ever in
    /// preparation, so a slow consumer leaves the session idle rather than
    /// queueing work.
    ///
    /// Timestamps are sampled from the clock at emission time. A reading that
    /// lags behind the schedule (for instance after the wall clock stepped
    /// backwards) is raised to the due time, which keeps timestamps
    /// non-decreasing and at least one cadence apart.
    ///
    /// The stream never completes on its own. It yields `None` once it has
    /// been cancelled, either through [`EventStream::cancel`], a clone of its
    /// [`cancellation_token`](EventStream::cancellation_token), or generator
    /// shutdown. Dropping the stream releases its timer as well.
    #[must_use = "streams do nothing unless polled"]
    pub struct EventStream<T, S>
    where
        S: SleepProvider,
    {
        movie_id: String,
        cadence: Cadence,
        cadence_ms: u64,
        clock: T,
        sleeper: S,
        token: CancellationToken,
        #[pin]
        cancelled: WaitForCancellationFutureOwned,
        #[pin]
        sleep: Option<S::Sleep>,
        next_due: Option<u64>,
        emitted: u64,
        terminated: bool,
    }
}

impl<T, S> EventStream<T, S>
where
    T: TimeSource<u64>,
    S: SleepProvider,
{
    pub(crate) fn new(
        movie_id: String,
        cadence: Cadence,
        clock: T,
        sleeper: S,
        token: CancellationToken,
    ) -> Self {
        Self {
            movie_id,
            cadence_ms: cadence.as_millis_ceil(),
            cadence,
            clock,
            sleeper,
            cancelled: token.clone().cancelled_owned(),
            token,
            sleep: None,
            next_due: None,
            emitted: 0,
            terminated: false,
        }
    }

    pub fn movie_id(&self) -> &str {
        &self.movie_id
    }

    pub const fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Number of events emitted so far.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// A handle that cancels this session when triggered, usable from any
    /// task or thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Requests cancellation. No event is emitted afterwards.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<T, S> fmt::Debug for EventStream<T, S>
where
    S: SleepProvider,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("movie_id", &self.movie_id)
            .field("cadence", &self.cadence)
            .field("next_due", &self.next_due)
            .field("emitted", &self.emitted)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl<T, S> Stream for EventStream<T, S>
where
    T: TimeSource<u64>,
    S: SleepProvider,
{
    type Item = MovieEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        // Polled every time so a cancel during a pending wait wakes this task.
        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.sleep.set(None);
            *this.terminated = true;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                movie_id = %this.movie_id,
                emitted = *this.emitted,
                "Event stream cancelled"
            );
            return Poll::Ready(None);
        }

        let observed_at = loop {
            if let Some(sleep) = this.sleep.as_mut().as_pin_mut() {
                ready!(sleep.poll(cx));
                this.sleep.set(None);
                let due = this.next_due.unwrap_or_default();
                break this.clock.current_millis().max(due);
            }

            let now = this.clock.current_millis();
            match *this.next_due {
                Some(due) if now < due => {
                    // Capped so a clock that jumped backwards cannot stall the
                    // stream for longer than one tick.
                    let wait = (due - now).min(*this.cadence_ms);
                    this.sleep
                        .set(Some(this.sleeper.sleep_for(Duration::from_millis(wait))));
                }
                _ => break now,
            }
        };

        if this.token.is_cancelled() {
            *this.terminated = true;
            return Poll::Ready(None);
        }

        *this.next_due = Some(observed_at.saturating_add(*this.cadence_ms));
        *this.emitted += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(movie_id = %this.movie_id, observed_at, "Emitting movie event");

        Poll::Ready(Some(MovieEvent::new(this.movie_id.clone(), observed_at)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.terminated {
            (0, Some(0))
        } else {
            (usize::MAX, None)
        }
    }
}

impl<T, S> FusedStream for EventStream<T, S>
where
    T: TimeSource<u64>,
    S: SleepProvider,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
