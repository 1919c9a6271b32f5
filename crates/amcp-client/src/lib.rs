//! TCP transport, protocol engine, typed client and CLI
//!
//! This crate provides the `amcp` command-line interface and the async
//! [`CasparClient`] it is built on.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod transport;

pub use cli::Cli;
pub use client::CasparClient;
pub use connection::{Connection, ConnectionOptions};
pub use error::{ClientError, ClientResult};
pub use transport::Transport;
