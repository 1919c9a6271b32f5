//! amcp CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use amcp_client::cli::{Cli, Command, ConfigAction};
use amcp_client::commands;
use amcp_client::config::ClientConfig;
use amcp_client::error::{ClientError, ClientResult};
use amcp_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing
    let tracing_config = if config.debug && cli.verbose == 0 {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default().with_verbosity(cli.verbose)
    };
    if let Err(e) = init_tracing(tracing_config.with_format(cli.log_format.into())) {
        eprintln!("error: failed to initialize logging: {}", e);
    }

    // Run the command
    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Reads the config file and applies command-line overrides.
fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    let mut config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(timeout) = cli.timeout {
        config.server.timeout = timeout;
    }
    Ok(config)
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    let json = cli.json;

    // Commands that do not talk to the server
    let command = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Dump => commands::config::dump(&config),
                ConfigAction::Path => commands::config::path(),
            };
        }
        other => other,
    };

    let client = commands::connect(&config.server).await?;
    let result = match &command {
        Command::Send { line } => commands::query::send(&client, line, json).await,
        Command::Tls => commands::query::templates(&client, json).await,
        Command::Template { name } => commands::query::template(&client, name, json).await,
        Command::ConfigInfo => commands::query::server_config(&client, json).await,
        Command::Paths => commands::query::paths(&client, json).await,
        Command::System => commands::query::system(&client, json).await,
        Command::Version { component } => {
            commands::query::version(&client, component.as_deref(), json).await
        }
        Command::Info { channel, layer } => {
            commands::query::info(&client, *channel, *layer, json).await
        }
        Command::Data { action } => commands::data::run(&client, action, json).await,
        Command::Cg { action } => commands::cg::run(&client, action, json).await,
        Command::Config { .. } => Ok(()),
    };

    if let Err(e) = client.bye().await {
        tracing::debug!(error = %e, "BYE failed");
    }
    result
}
