//! # TerraSync Core
//!
//! Business logic for property-assessment record exchange: the record
//! codec, connectivity gating, the export pipeline and the orchestrator
//! that sequences a full synchronization run.
//!
//! The core never talks to a socket or the filesystem hierarchy directly;
//! it depends on the capability traits in [`ports`], satisfied by the
//! infra adapters in production and by the in-memory doubles in
//! [`testing`] under test.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod codec;
pub mod connectivity;
pub mod export;
pub mod orchestrator;
pub mod ports;
pub mod testing;

pub use codec::RecordCodec;
pub use connectivity::wait_until_reachable;
pub use export::export_records;
pub use orchestrator::{RunPhase, SyncOrchestrator};
pub use ports::{Connectivity, PropertyStore, TransferClient};
