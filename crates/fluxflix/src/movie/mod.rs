//! Movie documents, their store, and the read-side query service.

mod document;
mod seed;
mod service;
mod store;

pub use document::*;
pub use seed::*;
pub use service::*;
pub use store::*;
