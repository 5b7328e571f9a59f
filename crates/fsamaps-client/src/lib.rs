//! Typed client for the FSA Maps Business Query Service.

pub mod client;
pub mod error;

pub use client::FsaClient;
pub use error::ClientError;
