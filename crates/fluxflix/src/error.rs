//! Error types for the movie catalog and the event stream generator.
//!
//! Every variant is reported synchronously at the call that caused it. A
//! running [`EventStream`](crate::EventStream) never fails: cancellation ends
//! the stream and is not represented here.
//!
//! ## Error Cases
//! - `InvalidConfiguration`: a stream was opened with a non-positive cadence.
//! - `ResourceExhausted`: the timer backing a stream could not be obtained.
//! - `MissingTitle`: a movie draft with a blank title was saved.

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `fluxflix` can produce.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The stream configuration was rejected before any resource was
    /// allocated.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The timer or scheduling resource needed by a stream is unavailable.
    #[error("Resource exhausted: {resource}")]
    ResourceExhausted { resource: String },

    /// A movie must carry a non-blank title to be stored.
    #[error("Movie title must be present")]
    MissingTitle,
}
