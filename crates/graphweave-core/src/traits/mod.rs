//! Core traits for graphweave providers.

mod extractor;
mod llm;

pub use extractor::*;
pub use llm::*;
