//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use amcp_core::{TemplateData, TracingOutputFormat};
use amcp_protocol::{Address, Payload};

use crate::error::{ClientError, ClientResult};

/// amcp - Talk to a CasparCG server over AMCP
#[derive(Debug, Parser)]
#[command(name = "amcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "AMCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long, env = "AMCP_HOST")]
    pub host: Option<String>,

    /// Server port (overrides config)
    #[arg(long, short, env = "AMCP_PORT")]
    pub port: Option<u16>,

    /// Timeout in seconds, 0 to wait forever (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => Self::Compact,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a raw AMCP command line and print the response
    Send {
        /// The command line, e.g. `INFO 1-10`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// List templates on the server
    Tls,

    /// Describe a template
    Template {
        /// Template path relative to the template folder
        name: String,
    },

    /// Show the server's configuration
    ConfigInfo,

    /// Show the server's folders
    Paths,

    /// Show system and component information
    System,

    /// Show the server version, or a component's
    Version {
        /// Component name (`flash`, `templatehost`)
        component: Option<String>,
    },

    /// Show server, channel or layer information
    Info {
        channel: Option<u32>,
        layer: Option<u32>,
    },

    /// Dataset commands
    Data {
        #[command(subcommand)]
        action: DataAction,
    },

    /// Template graphics commands
    Cg {
        #[command(subcommand)]
        action: CgAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Dataset actions.
#[derive(Debug, Subcommand)]
pub enum DataAction {
    /// List stored datasets
    List,

    /// Print a stored dataset
    Retrieve { name: String },

    /// Store a dataset
    Store {
        name: String,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Remove a stored dataset
    Remove { name: String },
}

/// Template graphics actions. Addresses are `channel-layer`.
#[derive(Debug, Subcommand)]
pub enum CgAction {
    /// Load a template onto a cg layer
    Add {
        address: Address,
        cg_layer: u32,
        template: String,
        /// Start playing as soon as the template is loaded
        #[arg(long)]
        play: bool,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Play a loaded template
    Play { address: Address, cg_layer: u32 },

    /// Stop a template
    Stop { address: Address, cg_layer: u32 },

    /// Advance a template to its next step
    Next { address: Address, cg_layer: u32 },

    /// Remove a template
    Remove { address: Address, cg_layer: u32 },

    /// Remove every template on a layer
    Clear { address: Address },

    /// Send new data to a template
    Update {
        address: Address,
        cg_layer: u32,
        #[command(flatten)]
        data: DataArgs,
    },

    /// Call a method on a template
    Invoke {
        address: Address,
        cg_layer: u32,
        method: String,
    },

    /// Show template information for a layer or one cg layer
    Info {
        address: Address,
        cg_layer: Option<u32>,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

/// Template data, given in one of several forms.
#[derive(Debug, Default, Args)]
pub struct DataArgs {
    /// Set a text field, as `instance=text` (can be repeated)
    #[arg(long = "field", value_name = "INSTANCE=TEXT", action = clap::ArgAction::Append)]
    pub fields: Vec<String>,

    /// Raw data string
    #[arg(long, conflicts_with_all = ["fields", "data_json", "dataset"])]
    pub text: Option<String>,

    /// JSON data
    #[arg(long, value_name = "JSON", conflicts_with_all = ["fields", "dataset"])]
    pub data_json: Option<String>,

    /// Name of a stored dataset
    #[arg(long, conflicts_with = "fields")]
    pub dataset: Option<String>,
}

impl DataArgs {
    /// Builds the payload, or `None` when no data was given.
    pub fn payload(&self) -> ClientResult<Option<Payload>> {
        if let Some(ref text) = self.text {
            return Ok(Some(Payload::Text(text.clone())));
        }
        if let Some(ref json) = self.data_json {
            let value = serde_json::from_str(json)
                .map_err(|e| ClientError::Config(format!("invalid --data-json: {}", e)))?;
            return Ok(Some(Payload::Json(value)));
        }
        if let Some(ref dataset) = self.dataset {
            return Ok(Some(Payload::Dataset(dataset.clone())));
        }
        if self.fields.is_empty() {
            return Ok(None);
        }

        let mut data = TemplateData::new();
        for field in &self.fields {
            let (instance, text) = field.split_once('=').ok_or_else(|| {
                ClientError::Config(format!("invalid --field {:?}, expected INSTANCE=TEXT", field))
            })?;
            data = data.with_text(instance, text);
        }
        Ok(Some(Payload::TemplateData(data)))
    }

    /// Like [`DataArgs::payload`], for commands that need data.
    pub fn required_payload(&self) -> ClientResult<Payload> {
        self.payload()?.ok_or_else(|| {
            ClientError::Config(
                "no data given; use --field, --text, --data-json or --dataset".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("amcp").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cg_add() {
        let cli = parse(&["--host", "playout", "cg", "add", "1-20", "0", "strap", "--play", "--field", "f0=Hi"]);
        assert_eq!(cli.host.as_deref(), Some("playout"));
        match cli.command {
            Command::Cg {
                action:
                    CgAction::Add {
                        address,
                        cg_layer,
                        template,
                        play,
                        data,
                    },
            } => {
                assert_eq!(address, Address::new(1, 20).unwrap());
                assert_eq!(cg_layer, 0);
                assert_eq!(template, "strap");
                assert!(play);
                let Some(Payload::TemplateData(data)) = data.payload().unwrap() else {
                    panic!("expected template data");
                };
                assert!(!data.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_channel_zero() {
        let result = Cli::try_parse_from(["amcp", "cg", "play", "0-10", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn send_joins_words() {
        let cli = parse(&["send", "INFO", "1-10"]);
        let Command::Send { line } = cli.command else {
            panic!("expected send");
        };
        assert_eq!(line.join(" "), "INFO 1-10");
    }

    #[test]
    fn verbosity_counts() {
        let cli = parse(&["-vv", "tls"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn data_args_forms() {
        let text = DataArgs {
            text: Some("hello".into()),
            ..DataArgs::default()
        };
        assert_eq!(text.payload().unwrap(), Some(Payload::Text("hello".into())));

        let json = DataArgs {
            data_json: Some(r#"{"f0":"x"}"#.into()),
            ..DataArgs::default()
        };
        assert!(matches!(json.payload().unwrap(), Some(Payload::Json(_))));

        let bad = DataArgs {
            fields: vec!["no-equals".into()],
            ..DataArgs::default()
        };
        assert!(bad.payload().is_err());

        assert_eq!(DataArgs::default().payload().unwrap(), None);
        assert!(DataArgs::default().required_payload().is_err());
    }
}
