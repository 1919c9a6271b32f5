//! Subcommand implementations.

pub mod cg;
pub mod config;
pub mod data;
pub mod query;

use std::fmt::Debug;

use serde::Serialize;
use tracing::info;

use crate::client::CasparClient;
use crate::config::ServerSettings;
use crate::error::ClientResult;

/// Opens a client using the effective server settings.
pub async fn connect(settings: &ServerSettings) -> ClientResult<CasparClient> {
    let client =
        CasparClient::connect(&settings.host, settings.port, settings.connection_options()).await?;
    info!(host = %settings.host, port = settings.port, "connected to server");
    Ok(client)
}

/// Prints a structured value as JSON or as its debug rendering.
pub(crate) fn print_value<T: Serialize + Debug>(value: &T, json: bool) -> ClientResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{:#?}", value);
    }
    Ok(())
}

/// Prints payload lines one per line, or as a JSON array.
pub(crate) fn print_lines(lines: &[String], json: bool) -> ClientResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(lines)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}
