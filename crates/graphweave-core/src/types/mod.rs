//! Core types for graphweave.

mod attribute;
mod chunk;
mod message;
mod record;

pub use attribute::*;
pub use chunk::*;
pub use message::*;
pub use record::*;
