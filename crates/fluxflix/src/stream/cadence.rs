use crate::{Error, Result};
use core::time::Duration;

/// Default spacing between two events of the same stream.
pub const DEFAULT_CADENCE: Cadence = Cadence(Duration::from_secs(1));

/// The minimum interval enforced between successive emissions of a stream.
///
/// A cadence is always strictly positive; the constructors reject anything
/// else with [`Error::InvalidConfiguration`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cadence(Duration);

impl Cadence {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidConfiguration {
                reason: "cadence must be greater than 0".to_string(),
            });
        }
        Ok(Self(interval))
    }

    /// Builds a cadence from a signed millisecond count, as received from
    /// configuration or query strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `millis` is zero or
    /// negative.
    pub fn from_millis(millis: i64) -> Result<Self> {
        if millis <= 0 {
            return Err(Error::InvalidConfiguration {
                reason: format!("cadence must be greater than 0 ms, got {millis} ms"),
            });
        }
        Ok(Self(Duration::from_millis(millis as u64)))
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// The cadence rounded up to whole milliseconds, the resolution of
    /// [`TimeSource`](crate::TimeSource). Never less than `1`.
    pub fn as_millis_ceil(self) -> u64 {
        let millis = self.0.as_millis();
        let rounded = if self.0.subsec_nanos() % 1_000_000 == 0 {
            millis
        } else {
            millis + 1
        };
        u64::try_from(rounded).unwrap_or(u64::MAX).max(1)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        DEFAULT_CADENCE
    }
}

impl TryFrom<Duration> for Cadence {
    type Error = Error;

    fn try_from(interval: Duration) -> Result<Self> {
        Self::new(interval)
    }
}

impl From<Cadence> for Duration {
    fn from(cadence: Cadence) -> Self {
        cadence.0
    }
}
