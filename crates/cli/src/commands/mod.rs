//! CLI command implementations

pub mod export;
pub mod probe;
pub mod sync;
