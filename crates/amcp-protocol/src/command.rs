//! AMCP request lines.
//!
//! A [`Command`] is one complete request: a single line terminated by
//! `\r\n`. Commands are built by the constructors below, which validate
//! their arguments but never touch a connection.
//!
//! ```rust
//! use amcp_protocol::{Address, Command};
//!
//! let addr = Address::new(1, 10).unwrap();
//! let cmd = Command::cg_add(addr, 0, "lower-third", true, None).unwrap();
//! assert_eq!(cmd.line(), "CG 1-10 ADD 0 lower-third 1");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{AmcpError, AmcpResult};
use crate::payload::{Payload, quote};

/// Line terminator appended to every request.
pub const TERMINATOR: &str = "\r\n";

/// A channel and layer on the server, written `channel-layer`.
///
/// Channels are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    channel: u32,
    layer: u32,
}

impl Address {
    pub fn new(channel: u32, layer: u32) -> AmcpResult<Self> {
        check_channel(channel)?;
        Ok(Self { channel, layer })
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }
}

impl Default for Address {
    /// Channel 1, layer 10.
    fn default() -> Self {
        Self {
            channel: 1,
            layer: 10,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.layer)
    }
}

impl FromStr for Address {
    type Err = AmcpError;

    /// Parses `channel-layer`, or a bare `channel` which selects layer 10.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = |text: &str| {
            text.trim().parse::<u32>().map_err(|_| {
                AmcpError::invalid_argument(format!("invalid address {s:?}, expected channel-layer"))
            })
        };

        match s.split_once('-') {
            Some((channel, layer)) => Self::new(number(channel)?, number(layer)?),
            None => Self::new(number(s)?, Self::default().layer),
        }
    }
}

fn check_channel(channel: u32) -> AmcpResult<()> {
    if channel == 0 {
        return Err(AmcpError::invalid_argument(
            "channel numbers start at 1, got 0",
        ));
    }
    Ok(())
}

/// Renders a name argument, quoting it if it contains whitespace.
fn name_token(kind: &str, name: &str) -> AmcpResult<String> {
    if name.trim().is_empty() {
        return Err(AmcpError::invalid_argument(format!("{kind} must not be empty")));
    }
    if name.contains(['\r', '\n']) {
        return Err(AmcpError::invalid_argument(format!(
            "{kind} {name:?} must not contain line breaks"
        )));
    }
    if name.chars().any(char::is_whitespace) || name.starts_with('"') {
        quote(name)
    } else {
        Ok(name.to_string())
    }
}

/// A complete, immutable request line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    /// Always ends with [`TERMINATOR`].
    wire: String,
}

impl Command {
    /// Wraps a raw line, appending the terminator if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty line or one with embedded
    /// line breaks.
    pub fn raw(line: impl Into<String>) -> AmcpResult<Self> {
        let mut line = line.into();
        if line.ends_with(TERMINATOR) {
            line.truncate(line.len() - TERMINATOR.len());
        }
        if line.trim().is_empty() {
            return Err(AmcpError::invalid_argument("command line is empty"));
        }
        if line.contains(['\r', '\n']) {
            return Err(AmcpError::invalid_argument(
                "command line must not contain line breaks",
            ));
        }
        Ok(Self::from_parts(&[line.as_str()]))
    }

    fn from_parts(parts: &[&str]) -> Self {
        let mut wire = parts.join(" ");
        wire.push_str(TERMINATOR);
        Self { wire }
    }

    /// The request line without its terminator.
    pub fn line(&self) -> &str {
        &self.wire[..self.wire.len() - TERMINATOR.len()]
    }

    /// The exact bytes to send.
    pub fn as_bytes(&self) -> &[u8] {
        self.wire.as_bytes()
    }

    /// The first token, e.g. `CG` or `INFO`.
    pub fn verb(&self) -> String {
        self.tokens().into_iter().next().unwrap_or_default()
    }

    /// Every token after the verb.
    pub fn arguments(&self) -> Vec<String> {
        self.tokens().into_iter().skip(1).collect()
    }

    /// Splits the line on spaces. A double-quoted token with backslash
    /// escapes is one token and is returned unquoted.
    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut chars = self.line().char_indices().peekable();
        let line = self.line();

        while let Some(&(start, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            if c == '"' {
                chars.next();
                let mut end = line.len();
                let mut escaped = false;
                for (i, c) in chars.by_ref() {
                    match c {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        '"' => {
                            end = i + 1;
                            break;
                        }
                        _ => {}
                    }
                }
                let quoted = &line[start..end];
                tokens.push(
                    serde_json::from_str::<String>(quoted)
                        .unwrap_or_else(|_| quoted.trim_matches('"').to_string()),
                );
            } else {
                let mut end = line.len();
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                tokens.push(line[start..end].to_string());
            }
        }

        tokens
    }

    // Query commands

    /// `TLS`: lists the templates on the server.
    pub fn tls() -> Self {
        Self::from_parts(&["TLS"])
    }

    /// `VERSION [component]`
    pub fn version(component: Option<&str>) -> AmcpResult<Self> {
        match component {
            Some(component) => Ok(Self::from_parts(&[
                "VERSION",
                &name_token("component", component)?,
            ])),
            None => Ok(Self::from_parts(&["VERSION"])),
        }
    }

    /// `INFO`, `INFO channel` or `INFO channel-layer`.
    pub fn info(channel: Option<u32>, layer: Option<u32>) -> AmcpResult<Self> {
        match (channel, layer) {
            (None, None) => Ok(Self::from_parts(&["INFO"])),
            (Some(channel), None) => {
                check_channel(channel)?;
                Ok(Self::from_parts(&["INFO", &channel.to_string()]))
            }
            (Some(channel), Some(layer)) => {
                let addr = Address::new(channel, layer)?;
                Ok(Self::from_parts(&["INFO", &addr.to_string()]))
            }
            (None, Some(_)) => Err(AmcpError::invalid_argument(
                "a layer can only be queried together with its channel",
            )),
        }
    }

    /// `INFO TEMPLATE name`
    pub fn info_template(template: &str) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "INFO",
            "TEMPLATE",
            &name_token("template name", template)?,
        ]))
    }

    pub fn info_config() -> Self {
        Self::from_parts(&["INFO", "CONFIG"])
    }

    pub fn info_paths() -> Self {
        Self::from_parts(&["INFO", "PATHS"])
    }

    pub fn info_system() -> Self {
        Self::from_parts(&["INFO", "SYSTEM"])
    }

    pub fn info_server() -> Self {
        Self::from_parts(&["INFO", "SERVER"])
    }

    // Connection commands

    /// `BYE`: ends the session.
    pub fn bye() -> Self {
        Self::from_parts(&["BYE"])
    }

    /// `KILL`: shuts the server down.
    pub fn kill() -> Self {
        Self::from_parts(&["KILL"])
    }

    // Data commands

    /// `DATA STORE name data`
    pub fn data_store(name: &str, data: &Payload) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "DATA",
            "STORE",
            &name_token("dataset name", name)?,
            &data.to_argument()?,
        ]))
    }

    /// `DATA RETRIEVE name`
    pub fn data_retrieve(name: &str) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "DATA",
            "RETRIEVE",
            &name_token("dataset name", name)?,
        ]))
    }

    pub fn data_list() -> Self {
        Self::from_parts(&["DATA", "LIST"])
    }

    /// `DATA REMOVE name`
    pub fn data_remove(name: &str) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "DATA",
            "REMOVE",
            &name_token("dataset name", name)?,
        ]))
    }

    // Template graphics commands

    /// `CG addr ADD cg_layer template play_on_load [data]`
    ///
    /// `play_on_load` is sent as `1` or `0`. The data argument is left out
    /// when `data` is `None`.
    pub fn cg_add(
        addr: Address,
        cg_layer: u32,
        template: &str,
        play_on_load: bool,
        data: Option<&Payload>,
    ) -> AmcpResult<Self> {
        let addr = addr.to_string();
        let cg_layer = cg_layer.to_string();
        let template = name_token("template name", template)?;
        let play = if play_on_load { "1" } else { "0" };

        match data {
            Some(data) => Ok(Self::from_parts(&[
                "CG",
                &addr,
                "ADD",
                &cg_layer,
                &template,
                play,
                &data.to_argument()?,
            ])),
            None => Ok(Self::from_parts(&[
                "CG", &addr, "ADD", &cg_layer, &template, play,
            ])),
        }
    }

    fn cg_layer_command(addr: Address, verb: &str, cg_layer: u32) -> Self {
        Self::from_parts(&["CG", &addr.to_string(), verb, &cg_layer.to_string()])
    }

    /// `CG addr PLAY cg_layer`
    pub fn cg_play(addr: Address, cg_layer: u32) -> Self {
        Self::cg_layer_command(addr, "PLAY", cg_layer)
    }

    /// `CG addr STOP cg_layer`
    pub fn cg_stop(addr: Address, cg_layer: u32) -> Self {
        Self::cg_layer_command(addr, "STOP", cg_layer)
    }

    /// `CG addr NEXT cg_layer`
    pub fn cg_next(addr: Address, cg_layer: u32) -> Self {
        Self::cg_layer_command(addr, "NEXT", cg_layer)
    }

    /// `CG addr REMOVE cg_layer`
    pub fn cg_remove(addr: Address, cg_layer: u32) -> Self {
        Self::cg_layer_command(addr, "REMOVE", cg_layer)
    }

    /// `CG addr CLEAR`: removes every template on the layer.
    pub fn cg_clear(addr: Address) -> Self {
        Self::from_parts(&["CG", &addr.to_string(), "CLEAR"])
    }

    /// `CG addr UPDATE cg_layer data`
    pub fn cg_update(addr: Address, cg_layer: u32, data: &Payload) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "CG",
            &addr.to_string(),
            "UPDATE",
            &cg_layer.to_string(),
            &data.to_argument()?,
        ]))
    }

    /// `CG addr INVOKE cg_layer method`
    pub fn cg_invoke(addr: Address, cg_layer: u32, method: &str) -> AmcpResult<Self> {
        Ok(Self::from_parts(&[
            "CG",
            &addr.to_string(),
            "INVOKE",
            &cg_layer.to_string(),
            &name_token("method", method)?,
        ]))
    }

    /// `CG addr INFO [cg_layer]`
    pub fn cg_info(addr: Address, cg_layer: Option<u32>) -> Self {
        match cg_layer {
            Some(cg_layer) => Self::cg_layer_command(addr, "INFO", cg_layer),
            None => Self::from_parts(&["CG", &addr.to_string(), "INFO"]),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.line())
    }
}

impl FromStr for Command {
    type Err = AmcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::raw(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_core::TemplateData;

    fn addr() -> Address {
        Address::new(1, 10).unwrap()
    }

    #[test]
    fn cg_add_round_trips_through_tokens() {
        let cmd = Command::cg_add(addr(), 0, "foo", false, None).unwrap();
        assert_eq!(cmd.as_bytes(), b"CG 1-10 ADD 0 foo 0\r\n");
        assert_eq!(cmd.verb(), "CG");
        assert_eq!(cmd.arguments(), vec!["1-10", "ADD", "0", "foo", "0"]);
    }

    #[test]
    fn cg_add_with_template_data() {
        let data = Payload::from(TemplateData::new().with_text("f0", "Hello world"));
        let cmd = Command::cg_add(addr(), 1, "folder/lower third", true, Some(&data)).unwrap();

        assert!(cmd.line().starts_with("CG 1-10 ADD 1 \"folder/lower third\" 1 \"<templateData>"));
        let args = cmd.arguments();
        assert_eq!(args.len(), 6);
        assert_eq!(args[3], "folder/lower third");
        assert_eq!(
            args[5],
            "<templateData><componentData id=\"f0\"><data id=\"text\" value=\"Hello world\"/></componentData></templateData>"
        );
    }

    #[test]
    fn channel_zero_is_rejected() {
        assert!(matches!(Address::new(0, 10), Err(AmcpError::InvalidArgument(_))));
        assert!(Command::info(Some(0), None).is_err());
        assert!("0-1".parse::<Address>().is_err());
    }

    #[test]
    fn address_parsing() {
        assert_eq!("2-20".parse::<Address>().unwrap(), Address::new(2, 20).unwrap());
        assert_eq!("3".parse::<Address>().unwrap().layer(), 10);
        assert!("one-two".parse::<Address>().is_err());
    }

    #[test]
    fn query_commands() {
        assert_eq!(Command::tls().line(), "TLS");
        assert_eq!(Command::version(None).unwrap().line(), "VERSION");
        assert_eq!(Command::version(Some("flash")).unwrap().line(), "VERSION flash");
        assert_eq!(Command::info(None, None).unwrap().line(), "INFO");
        assert_eq!(Command::info(Some(2), None).unwrap().line(), "INFO 2");
        assert_eq!(Command::info(Some(2), Some(5)).unwrap().line(), "INFO 2-5");
        assert!(Command::info(None, Some(5)).is_err());
        assert_eq!(Command::info_config().line(), "INFO CONFIG");
        assert_eq!(Command::info_paths().line(), "INFO PATHS");
        assert_eq!(Command::info_system().line(), "INFO SYSTEM");
        assert_eq!(Command::info_server().line(), "INFO SERVER");
        assert_eq!(
            Command::info_template("news/strap").unwrap().line(),
            "INFO TEMPLATE news/strap"
        );
    }

    #[test]
    fn data_commands() {
        let text = Payload::Text("a \"quoted\" value".into());
        assert_eq!(
            Command::data_store("scores", &text).unwrap().line(),
            r#"DATA STORE scores "a \"quoted\" value""#
        );
        assert_eq!(Command::data_retrieve("scores").unwrap().line(), "DATA RETRIEVE scores");
        assert_eq!(Command::data_list().line(), "DATA LIST");
        assert_eq!(Command::data_remove("scores").unwrap().line(), "DATA REMOVE scores");
        assert!(Command::data_retrieve("").is_err());
    }

    #[test]
    fn cg_layer_commands() {
        let a = addr();
        assert_eq!(Command::cg_play(a, 1).line(), "CG 1-10 PLAY 1");
        assert_eq!(Command::cg_stop(a, 1).line(), "CG 1-10 STOP 1");
        assert_eq!(Command::cg_next(a, 1).line(), "CG 1-10 NEXT 1");
        assert_eq!(Command::cg_remove(a, 1).line(), "CG 1-10 REMOVE 1");
        assert_eq!(Command::cg_clear(a).line(), "CG 1-10 CLEAR");
        assert_eq!(Command::cg_info(a, None).line(), "CG 1-10 INFO");
        assert_eq!(Command::cg_info(a, Some(2)).line(), "CG 1-10 INFO 2");
        assert_eq!(
            Command::cg_invoke(a, 1, "leftTab").unwrap().line(),
            "CG 1-10 INVOKE 1 leftTab"
        );
        assert_eq!(
            Command::cg_update(a, 1, &Payload::Dataset("scores".into()))
                .unwrap()
                .line(),
            "CG 1-10 UPDATE 1 scores"
        );
    }

    #[test]
    fn raw_commands_get_a_terminator() {
        let cmd = Command::raw("PLAY 1-10 AMB").unwrap();
        assert_eq!(cmd.as_bytes(), b"PLAY 1-10 AMB\r\n");
        assert_eq!(Command::raw("PLAY 1-10 AMB\r\n").unwrap(), cmd);
        assert!(Command::raw("").is_err());
        assert!(Command::raw("PLAY\r\nSTOP").is_err());
    }

    #[test]
    fn names_with_line_breaks_are_rejected() {
        assert!(Command::info_template("bad\nname").is_err());
    }
}
