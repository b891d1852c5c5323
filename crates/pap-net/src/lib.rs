// Single-connection request/response client for the remote store.

pub mod client;
pub mod error;

pub use client::{ConnectionOptions, Framing, ProtocolClient, Transport};
pub use error::NetError;
