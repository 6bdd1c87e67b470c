use crate::{Error, Result, SleepProvider};
use core::time::Duration;
use std::panic;

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on Tokio.
/// Streams must be opened from within a Tokio runtime that has its time
/// driver enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleep;

impl SleepProvider for TokioSleep {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(&self, dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }

    fn ensure_available(&self) -> Result<()> {
        tokio::runtime::Handle::try_current().map_err(|e| Error::ResourceExhausted {
            resource: format!("tokio timer: {e}"),
        })?;

        // Tokio only reports a disabled time driver by panicking when a
        // timer is registered.
        panic::catch_unwind(|| drop(tokio::time::sleep(Duration::ZERO))).map_err(|_| {
            Error::ResourceExhausted {
                resource: "tokio timer: time driver is not enabled on this runtime".to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn unavailable_outside_a_runtime() {
        let err = TokioSleep.ensure_available().unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { .. }));
    }

    #[test]
    fn unavailable_without_a_time_driver() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let err = rt.block_on(async { TokioSleep.ensure_available() }).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { .. }));
    }

    #[test]
    fn opening_a_stream_without_a_time_driver_fails() {
        use crate::{EventStreamGenerator, SystemClock};

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let generator = EventStreamGenerator::new(SystemClock, TokioSleep);
        let err = rt
            .block_on(async { generator.open_stream("abc123", Duration::from_millis(10)) })
            .unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { .. }));
    }

    #[tokio::test]
    async fn sleeps_for_the_requested_duration() {
        TokioSleep.ensure_available().unwrap();

        let start = Instant::now();
        TokioSleep.sleep_for(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
