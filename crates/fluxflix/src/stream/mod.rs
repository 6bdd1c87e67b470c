//! Lazily-paced movie event streams.
//!
//! An [`EventStreamGenerator`] opens independent [`EventStream`] sessions,
//! one per subscriber. Each session is an infinite, pull-driven
//! [`Stream`](futures::Stream) of [`MovieEvent`](crate::MovieEvent)s spaced
//! by at least its [`Cadence`]. A session ends only when it is cancelled,
//! dropped, or the generator is shut down.

mod cadence;
mod generator;
mod session;
#[cfg(test)]
mod tests;

pub use cadence::*;
pub use generator::*;
pub use session::*;
