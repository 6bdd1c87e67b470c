use super::{Cadence, EventStream};
use crate::{Result, SleepProvider, TimeSource};
use core::time::Duration;
use tokio_util::sync::CancellationToken;

/// Opens [`EventStream`] sessions that share a clock, a timer and a shutdown
/// signal, and nothing else.
///
/// The generator keeps no per-session state. Every session owns its own
/// cadence timer and a cancellation token derived from the generator's
/// shutdown token, so [`EventStreamGenerator::shutdown`] ends all of them at
/// once while cancelling one session leaves the others untouched.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "async-tokio")]
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> fluxflix::Result<()> {
/// use core::time::Duration;
/// use fluxflix::{EventStreamGenerator, SystemClock, TokioSleep};
/// use futures::StreamExt;
///
/// let generator = EventStreamGenerator::new(SystemClock, TokioSleep);
/// let mut events = Box::pin(generator.open_stream("abc123", Duration::from_millis(10))?);
///
/// let first = events.next().await.expect("streams are infinite");
/// assert_eq!(first.movie_id(), "abc123");
///
/// events.cancel();
/// assert!(events.next().await.is_none());
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "async-tokio"))]
/// # fn main() {}
/// ```
#[derive(Clone, Debug)]
pub struct EventStreamGenerator<T, S> {
    clock: T,
    sleeper: S,
    shutdown: CancellationToken,
}

impl<T, S> EventStreamGenerator<T, S>
where
    T: TimeSource<u64> + Clone,
    S: SleepProvider + Clone,
{
    pub fn new(clock: T, sleeper: S) -> Self {
        Self {
            clock,
            sleeper,
            shutdown: CancellationToken::new(),
        }
    }

    /// Opens a new, independently-timed event stream for `movie_id`.
    ///
    /// The id is opaque and is not checked against any store: a stream for an
    /// unknown movie ticks like any other. The first event is produced as soon
    /// as the stream is polled; each later one once `cadence` has elapsed
    /// since its predecessor and the consumer asks for it.
    ///
    /// Opening a stream after [`shutdown`](Self::shutdown) succeeds, but the
    /// returned stream is already cancelled.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
    ///   if `cadence` is zero. Nothing is allocated in that case.
    /// - [`Error::ResourceExhausted`](crate::Error::ResourceExhausted) if the
    ///   timer cannot be used from the calling context.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(cadence_ms = cadence.as_millis() as u64)))]
    pub fn open_stream(
        &self,
        movie_id: impl Into<String>,
        cadence: Duration,
    ) -> Result<EventStream<T, S>> {
        let cadence = Cadence::new(cadence)?;
        self.sleeper.ensure_available()?;

        let movie_id = movie_id.into();
        #[cfg(feature = "tracing")]
        tracing::debug!(%movie_id, "Opening event stream");

        Ok(EventStream::new(
            movie_id,
            cadence,
            self.clock.clone(),
            self.sleeper.clone(),
            self.shutdown.child_token(),
        ))
    }

    /// Cancels every stream opened by this generator, including its clones.
    ///
    /// Pending waits are woken so each session ends within one poll.
    pub fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling all event streams");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
