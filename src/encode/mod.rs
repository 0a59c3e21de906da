//! Serialization of pipeline results into the layered text encoding.

// Submodule declarations
mod writer;

// Re-exports
pub(crate) use writer::{EncodeInput, encode};
