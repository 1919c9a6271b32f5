//! Typed AMCP operations over a shared connection.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use amcp_core::{ServerConfig, ServerPaths, SystemInfo, Template};
use amcp_protocol::xml::{
    parse_server_config, parse_server_paths, parse_system_info, parse_template,
    parse_template_listing,
};
use amcp_protocol::{AmcpError, AmcpResult, Address, Command, Payload, ResponseEnvelope};

use crate::connection::{Connection, ConnectionOptions};

/// Client for one CasparCG server.
///
/// Clones share the connection. Concurrent calls queue on it, each holding
/// the lock for a full command/response cycle.
#[derive(Debug)]
pub struct CasparClient<S = TcpStream> {
    connection: Arc<Mutex<Connection<S>>>,
}

impl<S> Clone for CasparClient<S> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
        }
    }
}

impl CasparClient<TcpStream> {
    /// Connects to the server at `host:port`.
    pub async fn connect(host: &str, port: u16, options: ConnectionOptions) -> AmcpResult<Self> {
        Ok(Self::new(Connection::connect(host, port, options).await?))
    }
}

impl<S> CasparClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(connection: Connection<S>) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// Runs one command and returns the raw response.
    pub async fn execute(&self, command: &Command) -> AmcpResult<ResponseEnvelope> {
        let mut connection = self.connection.lock().await;
        connection.execute(command).await
    }

    /// Sends a raw command line.
    pub async fn send(&self, line: &str) -> AmcpResult<ResponseEnvelope> {
        self.execute(&Command::raw(line)?).await
    }

    async fn lines(&self, command: Command) -> AmcpResult<Vec<String>> {
        Ok(self.execute(&command).await?.into_lines())
    }

    async fn ok(&self, command: Command) -> AmcpResult<()> {
        self.execute(&command).await.map(|_| ())
    }

    // --- Query commands ---

    /// Lists the templates known to the server.
    pub async fn templates(&self) -> AmcpResult<Vec<String>> {
        let names = parse_template_listing(&self.lines(Command::tls()).await?);
        debug!(count = names.len(), "listed templates");
        Ok(names)
    }

    /// Describes one template.
    pub async fn template(&self, name: &str) -> AmcpResult<Template> {
        let command = Command::info_template(name)?;
        let lines = self.lines(command.clone()).await?;
        parse_template(name, &lines).map_err(|e| e.for_command(command.line()))
    }

    /// Reads the server's configuration file.
    pub async fn server_config(&self) -> AmcpResult<ServerConfig> {
        let command = Command::info_config();
        let lines = self.lines(command.clone()).await?;
        parse_server_config(&lines).map_err(|e| e.for_command(command.line()))
    }

    pub async fn paths(&self) -> AmcpResult<ServerPaths> {
        let command = Command::info_paths();
        let lines = self.lines(command.clone()).await?;
        parse_server_paths(&lines).map_err(|e| e.for_command(command.line()))
    }

    pub async fn system_info(&self) -> AmcpResult<SystemInfo> {
        let command = Command::info_system();
        let lines = self.lines(command.clone()).await?;
        parse_system_info(&lines).map_err(|e| e.for_command(command.line()))
    }

    /// Version of the server, or of one of its components (`flash`,
    /// `templatehost`).
    pub async fn version(&self, component: Option<&str>) -> AmcpResult<String> {
        let response = self.execute(&Command::version(component)?).await?;
        Ok(response
            .first_line()
            .unwrap_or_else(|| response.status.reason())
            .to_string())
    }

    /// `INFO` for the server, a channel or a layer.
    pub async fn info(&self, channel: Option<u32>, layer: Option<u32>) -> AmcpResult<Vec<String>> {
        self.lines(Command::info(channel, layer)?).await
    }

    /// Raw `INFO SERVER` payload.
    pub async fn server_info(&self) -> AmcpResult<Vec<String>> {
        self.lines(Command::info_server()).await
    }

    // --- Data commands ---

    pub async fn data_store(&self, name: &str, data: &Payload) -> AmcpResult<()> {
        self.ok(Command::data_store(name, data)?).await
    }

    /// Returns the stored dataset, one payload line per element.
    pub async fn data_retrieve(&self, name: &str) -> AmcpResult<Vec<String>> {
        self.lines(Command::data_retrieve(name)?).await
    }

    pub async fn data_list(&self) -> AmcpResult<Vec<String>> {
        self.lines(Command::data_list()).await
    }

    pub async fn data_remove(&self, name: &str) -> AmcpResult<()> {
        self.ok(Command::data_remove(name)?).await
    }

    // --- Template graphics commands ---

    pub async fn cg_add(
        &self,
        addr: Address,
        cg_layer: u32,
        template: &str,
        play_on_load: bool,
        data: Option<&Payload>,
    ) -> AmcpResult<()> {
        self.ok(Command::cg_add(addr, cg_layer, template, play_on_load, data)?)
            .await
    }

    pub async fn cg_play(&self, addr: Address, cg_layer: u32) -> AmcpResult<()> {
        self.ok(Command::cg_play(addr, cg_layer)).await
    }

    pub async fn cg_stop(&self, addr: Address, cg_layer: u32) -> AmcpResult<()> {
        self.ok(Command::cg_stop(addr, cg_layer)).await
    }

    pub async fn cg_next(&self, addr: Address, cg_layer: u32) -> AmcpResult<()> {
        self.ok(Command::cg_next(addr, cg_layer)).await
    }

    pub async fn cg_remove(&self, addr: Address, cg_layer: u32) -> AmcpResult<()> {
        self.ok(Command::cg_remove(addr, cg_layer)).await
    }

    pub async fn cg_clear(&self, addr: Address) -> AmcpResult<()> {
        self.ok(Command::cg_clear(addr)).await
    }

    pub async fn cg_update(&self, addr: Address, cg_layer: u32, data: &Payload) -> AmcpResult<()> {
        self.ok(Command::cg_update(addr, cg_layer, data)?).await
    }

    /// Calls a method on a running template and returns its reply, if any.
    pub async fn cg_invoke(
        &self,
        addr: Address,
        cg_layer: u32,
        method: &str,
    ) -> AmcpResult<Vec<String>> {
        self.lines(Command::cg_invoke(addr, cg_layer, method)?).await
    }

    pub async fn cg_info(&self, addr: Address, cg_layer: Option<u32>) -> AmcpResult<Vec<String>> {
        self.lines(Command::cg_info(addr, cg_layer)).await
    }

    // --- Session commands ---

    /// Ends the session. The server may close the stream instead of
    /// answering, which counts as success.
    pub async fn bye(&self) -> AmcpResult<()> {
        match self.execute(&Command::bye()).await {
            Ok(_) | Err(AmcpError::PrematureClose { received: 0 }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Shuts the server down.
    pub async fn kill(&self) -> AmcpResult<()> {
        match self.execute(&Command::kill()).await {
            Ok(_) | Err(AmcpError::PrematureClose { received: 0 }) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_core::{Slot, TemplateData, ValueType};
    use amcp_protocol::ClientErrorKind;
    use tokio_test::io::Builder;

    fn client(mock: tokio_test::io::Mock) -> CasparClient<tokio_test::io::Mock> {
        CasparClient::new(Connection::from_stream(mock, ConnectionOptions::default()))
    }

    #[tokio::test]
    async fn lists_templates() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .read(b"200 TLS OK\r\n\"NEWS/STRAP\" 6145 20240301120000\r\n\"LOGO\" 10 20240301120000\r\n\r\n")
            .build();
        let names = client(mock).templates().await.unwrap();
        assert_eq!(names, vec!["NEWS/STRAP", "LOGO"]);
    }

    #[tokio::test]
    async fn describes_template() {
        let mock = Builder::new()
            .write(b"INFO TEMPLATE strap\r\n")
            .read(b"201 INFO OK\r\n")
            .read(
                b"<template version=\"1.8.0\" authorName=\"A\" authorEmail=\"a@b\" templateInfo=\"\" \
                  originalWidth=\"1920\" originalHeight=\"1080\" originalFrameRate=\"25\">\
                  <components><component name=\"CasparTextField\">\
                  <property name=\"text\" type=\"string\" info=\"String data\"/>\
                  </component></components><keyframes/>\
                  <instances><instance name=\"f1\" type=\"CasparTextField\"/></instances>\
                  <parameters/></template>\r\n",
            )
            .build();

        let template = client(mock).template("strap").await.unwrap();
        assert_eq!(template.instances["f1"], "CasparTextField");
        assert_eq!(
            template.components["CasparTextField"]["text"].value_type(),
            ValueType::String
        );
    }

    #[tokio::test]
    async fn version_reads_single_line() {
        let mock = Builder::new()
            .write(b"VERSION flash\r\n")
            .read(b"201 VERSION OK\r\n11.8.800.94\r\n")
            .build();
        let version = client(mock).version(Some("flash")).await.unwrap();
        assert_eq!(version, "11.8.800.94");
    }

    #[tokio::test]
    async fn cg_add_with_template_data() {
        let data = Payload::from(TemplateData::new().with_text("f0", "Hello"));
        let expected = format!(
            "CG 1-20 ADD 1 strap 1 {}\r\n",
            data.to_argument().unwrap()
        );
        let mock = Builder::new()
            .write(expected.as_bytes())
            .read(b"202 CG OK\r\n")
            .build();

        let addr = Address::new(1, 20).unwrap();
        client(mock)
            .cg_add(addr, 1, "strap", true, Some(&data))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn data_remove_missing_dataset() {
        let mock = Builder::new()
            .write(b"DATA REMOVE gone\r\n")
            .read(b"404 DATA REMOVE ERROR\r\n")
            .build();
        let err = client(mock).data_remove("gone").await.unwrap_err();
        assert!(matches!(
            err,
            AmcpError::Client {
                kind: ClientErrorKind::MediaNotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bye_accepts_closed_stream() {
        let mock = Builder::new().write(b"BYE\r\n").build();
        client(mock).bye().await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_one_connection() {
        let mock = Builder::new()
            .write(b"CG 1-10 PLAY 0\r\n")
            .read(b"202 CG OK\r\n")
            .write(b"CG 1-10 STOP 0\r\n")
            .read(b"202 CG OK\r\n")
            .build();
        let first = client(mock);
        let second = first.clone();

        first.cg_play(Address::default(), 0).await.unwrap();
        second.cg_stop(Address::default(), 0).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_config_reports_command() {
        let mock = Builder::new()
            .write(b"INFO CONFIG\r\n")
            .read(b"201 INFO OK\r\n<paths/>\r\n")
            .build();
        let err = client(mock).server_config().await.unwrap_err();
        assert_eq!(err.command(), Some("INFO CONFIG"));
    }
}
