//! # TerraSync Domain
//!
//! Business domain types and models for TerraSync.
//!
//! This crate contains:
//! - Property-assessment record types and remote-entry snapshots
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on `terrasync-common` (retry classification trait)
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
