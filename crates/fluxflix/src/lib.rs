#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod event;
mod futures;
mod movie;
mod stream;
mod time;

pub use crate::error::*;
pub use crate::event::*;
pub use crate::futures::*;
pub use crate::movie::*;
pub use crate::stream::*;
pub use crate::time::*;
