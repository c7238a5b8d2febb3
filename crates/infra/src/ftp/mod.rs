//! FTP transfer adapter

mod client;

pub use client::FtpTransferClient;
