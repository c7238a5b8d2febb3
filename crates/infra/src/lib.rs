//! # TerraSync Infra
//!
//! Infrastructure adapters behind the core port interfaces: the TCP
//! connectivity probe, the FTP transfer client, the JSON-file property
//! store, and the configuration loader.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod fsutil;
pub mod ftp;
pub mod net;
pub mod storage;

pub use ftp::FtpTransferClient;
pub use net::TcpProbe;
pub use storage::JsonPropertyStore;
