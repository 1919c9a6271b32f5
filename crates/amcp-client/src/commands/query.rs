//! Read-only queries: templates, server configuration, paths, versions.

use serde_json::json;

use crate::client::CasparClient;
use crate::error::ClientResult;

use super::{print_lines, print_value};

/// Send a raw line and print the status and payload.
pub async fn send(client: &CasparClient, line: &[String], json: bool) -> ClientResult<()> {
    let response = client.send(&line.join(" ")).await?;
    if json {
        return print_value(&response, true);
    }
    println!("{}", response.status);
    print_lines(&response.lines, false)
}

pub async fn templates(client: &CasparClient, json: bool) -> ClientResult<()> {
    print_lines(&client.templates().await?, json)
}

pub async fn template(client: &CasparClient, name: &str, json: bool) -> ClientResult<()> {
    let template = client.template(name).await?;
    for warning in &template.warnings {
        tracing::warn!(?warning, "template descriptor is inconsistent");
    }
    print_value(&template, json)
}

pub async fn server_config(client: &CasparClient, json: bool) -> ClientResult<()> {
    print_value(&client.server_config().await?, json)
}

pub async fn paths(client: &CasparClient, json: bool) -> ClientResult<()> {
    let paths = client.paths().await?;
    if json {
        return print_value(&paths, true);
    }
    for (kind, path) in paths.iter() {
        println!("{}: {}", kind, path);
    }
    Ok(())
}

pub async fn system(client: &CasparClient, json: bool) -> ClientResult<()> {
    print_value(&client.system_info().await?, json)
}

pub async fn version(client: &CasparClient, component: Option<&str>, json: bool) -> ClientResult<()> {
    let version = client.version(component).await?;
    if json {
        return print_value(&json!({ "component": component, "version": version }), true);
    }
    println!("{}", version);
    Ok(())
}

pub async fn info(
    client: &CasparClient,
    channel: Option<u32>,
    layer: Option<u32>,
    json: bool,
) -> ClientResult<()> {
    print_lines(&client.info(channel, layer).await?, json)
}
