//! One AMCP connection and its request/response cycle.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use amcp_protocol::{
    AmcpError, AmcpResult, Command, DEFAULT_MAX_FRAME_BYTES, ProtocolErrorKind, ResponseEnvelope,
    ResponseShape, StatusLine, Terminator,
};

use crate::transport::{Transport, within};

/// Connection settings shared by every command on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Deadline for connecting and for every single read or write.
    pub timeout: Option<Duration>,
    pub max_frame_bytes: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// A connection to one AMCP server.
///
/// `execute` takes `&mut self`, so a connection never has more than one
/// command in flight. A cycle that does not finish (a timeout, a dropped
/// future, a broken stream) leaves the rest of its reply unread, after
/// which the connection refuses further commands.
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    transport: Transport<S>,
    /// Set while a cycle is in progress and left set if it failed midway.
    out_of_sync: bool,
}

impl Connection<TcpStream> {
    /// Opens a TCP connection to `host:port`.
    pub async fn connect(host: &str, port: u16, options: ConnectionOptions) -> AmcpResult<Self> {
        debug!(host, port, "connecting");
        let stream = within(options.timeout, "connect", TcpStream::connect((host, port))).await?;
        stream.set_nodelay(true)?;
        debug!(host, port, "connected");
        Ok(Self::from_stream(stream, options))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already connected stream.
    pub fn from_stream(stream: S, options: ConnectionOptions) -> Self {
        Self {
            transport: Transport::new(stream, options.timeout, options.max_frame_bytes),
            out_of_sync: false,
        }
    }

    /// Returns true once a cycle has failed midway. Such a connection
    /// rejects every further command; open a new one.
    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Sends `command` and reads its complete response.
    ///
    /// # Errors
    ///
    /// Error status codes become `Client`, `Server` or `Protocol` errors
    /// carrying the command line. Transport failures are returned as-is and
    /// leave the connection out of sync, so later calls fail with a
    /// `Connection` error without touching the stream.
    pub async fn execute(&mut self, command: &Command) -> AmcpResult<ResponseEnvelope> {
        if self.out_of_sync {
            return Err(AmcpError::Connection(io::Error::new(
                io::ErrorKind::NotConnected,
                "an earlier command did not complete; reconnect to continue",
            )));
        }

        self.out_of_sync = true;
        let result = self.exchange(command).await;
        match result {
            Ok(_) => self.out_of_sync = false,
            Err(ref e) if e.is_status_error() => self.out_of_sync = false,
            Err(ref e) => {
                warn!(command = %command.line(), error = %e, "exchange failed, connection is out of sync");
            }
        }
        result
    }

    async fn exchange(&mut self, command: &Command) -> AmcpResult<ResponseEnvelope> {
        let line = command.line();
        debug!(command = %line, "sending command");
        self.transport.write(command.as_bytes()).await?;

        let status = self.read_status().await.map_err(|e| e.for_command(line))?;
        let shape = status.shape();
        debug!(code = status.code(), reason = status.reason(), "status received");

        let lines = match shape {
            ResponseShape::NoData => Vec::new(),
            ResponseShape::SingleLine => self.read_payload(Terminator::Line, line).await?,
            ResponseShape::MultiLine(terminator) => self.read_payload(terminator, line).await?,
            ResponseShape::ClientError(kind) => {
                return Err(AmcpError::Client {
                    kind,
                    command: line.to_string(),
                });
            }
            ResponseShape::ServerError(kind) => {
                return Err(AmcpError::Server {
                    kind,
                    command: line.to_string(),
                });
            }
            ResponseShape::Unimplemented => {
                return Err(AmcpError::Protocol {
                    kind: ProtocolErrorKind::Unimplemented,
                    command: line.to_string(),
                });
            }
            ResponseShape::Unknown(code) => {
                return Err(AmcpError::Protocol {
                    kind: ProtocolErrorKind::UnknownCode(code),
                    command: line.to_string(),
                });
            }
        };

        trace!(lines = lines.len(), "payload received");
        Ok(ResponseEnvelope::new(status, lines))
    }

    /// Skips blank lines and parses the first non-empty one.
    async fn read_status(&mut self) -> AmcpResult<StatusLine> {
        loop {
            let lines = self.transport.read_until(Terminator::Line.delimiter()).await?;
            if let Some(first) = lines.first() {
                return StatusLine::parse(first);
            }
            trace!("skipping blank line before status");
        }
    }

    async fn read_payload(&mut self, terminator: Terminator, line: &str) -> AmcpResult<Vec<String>> {
        self.transport
            .read_until(terminator.delimiter())
            .await
            .map_err(|e| e.for_command(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_protocol::{Address, ClientErrorKind, ServerErrorKind};
    use tokio_test::io::Builder;

    fn connection(mock: tokio_test::io::Mock) -> Connection<tokio_test::io::Mock> {
        Connection::from_stream(mock, ConnectionOptions::default())
    }

    #[tokio::test]
    async fn no_data_response() {
        let mock = Builder::new()
            .write(b"CG 1-10 PLAY 0\r\n")
            .read(b"202 CG OK\r\n")
            .build();
        let mut conn = connection(mock);

        let response = conn
            .execute(&Command::cg_play(Address::default(), 0))
            .await
            .unwrap();
        assert_eq!(response.code(), "202");
        assert_eq!(response.status.reason(), "CG OK");
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn block_response_keeps_non_empty_lines() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .read(b"200 TLS OK\r\n\"A\" 1 2\r\n\"B\" 3 4\r\n\r\n")
            .build();
        let mut conn = connection(mock);

        let response = conn.execute(&Command::tls()).await.unwrap();
        assert_eq!(response.lines, vec!["\"A\" 1 2", "\"B\" 3 4"]);
    }

    #[tokio::test]
    async fn empty_block_does_not_wait() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .read(b"200 TLS OK\r\n\r\n")
            .build();
        let mut conn = connection(mock);

        let response = conn.execute(&Command::tls()).await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn single_line_response() {
        let mock = Builder::new()
            .write(b"VERSION\r\n")
            .read(b"201 VERSION OK\r\n2.0.7.e9fc25a Stable\r\n")
            .build();
        let mut conn = connection(mock);

        let response = conn.execute(&Command::version(None).unwrap()).await.unwrap();
        assert_eq!(response.first_line(), Some("2.0.7.e9fc25a Stable"));
    }

    #[tokio::test]
    async fn skips_blank_lines_before_status() {
        let mock = Builder::new()
            .write(b"BYE\r\n")
            .read(b"\r\n\r\n202 BYE OK\r\n")
            .build();
        let mut conn = connection(mock);

        let response = conn.execute(&Command::bye()).await.unwrap();
        assert_eq!(response.code(), "202");
    }

    #[tokio::test]
    async fn client_error_carries_command() {
        // Nothing follows the status line; a continuation read would hit EOF.
        let mock = Builder::new()
            .write(b"CG 1-10 ADD 0 missing 1\r\n")
            .read(b"404 CG ERROR\r\n")
            .build();
        let mut conn = connection(mock);

        let command = Command::cg_add(Address::default(), 0, "missing", true, None).unwrap();
        let err = conn.execute(&command).await.unwrap_err();
        match err {
            AmcpError::Client { kind, command } => {
                assert_eq!(kind, ClientErrorKind::MediaNotFound);
                assert_eq!(command, "CG 1-10 ADD 0 missing 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn server_and_protocol_errors() {
        let mock = Builder::new()
            .write(b"INFO CONFIG\r\n")
            .read(b"502 INFO ERROR\r\n")
            .write(b"INFO SERVER\r\n")
            .read(b"600 INFO FAILED\r\n")
            .write(b"TLS\r\n")
            .read(b"999 ???\r\n")
            .build();
        let mut conn = connection(mock);

        let err = conn.execute(&Command::info_config()).await.unwrap_err();
        assert!(matches!(
            err,
            AmcpError::Server {
                kind: ServerErrorKind::MediaUnreadable,
                ..
            }
        ));

        let err = conn.execute(&Command::info_server()).await.unwrap_err();
        assert!(matches!(
            err,
            AmcpError::Protocol {
                kind: ProtocolErrorKind::Unimplemented,
                ..
            }
        ));

        let err = conn.execute(&Command::tls()).await.unwrap_err();
        assert!(matches!(
            err,
            AmcpError::Protocol { kind: ProtocolErrorKind::UnknownCode(ref code), .. } if code == "999"
        ));
        assert_eq!(err.command(), Some("TLS"));
    }

    #[tokio::test]
    async fn malformed_status_carries_command() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .read(b"hello\r\n")
            .build();
        let mut conn = connection(mock);

        let err = conn.execute(&Command::tls()).await.unwrap_err();
        assert!(matches!(
            err,
            AmcpError::Protocol {
                kind: ProtocolErrorKind::MalformedFrame(_),
                ..
            }
        ));
        assert_eq!(err.command(), Some("TLS"));
    }

    #[tokio::test]
    async fn consecutive_commands_share_the_stream() {
        let mock = Builder::new()
            .write(b"CG 1-10 CLEAR\r\n")
            .read(b"202 CG OK\r\n201 DATA RETRIEVE OK\r\n")
            .write(b"DATA RETRIEVE news\r\n")
            .read(b"<templateData/>\r\n")
            .build();
        let mut conn = connection(mock);

        conn.execute(&Command::cg_clear(Address::default()))
            .await
            .unwrap();
        let response = conn
            .execute(&Command::data_retrieve("news").unwrap())
            .await
            .unwrap();
        assert_eq!(response.first_line(), Some("<templateData/>"));
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_is_not_taken_for_the_next_command() {
        // The reply to PLAY arrives after the deadline; nothing else may be written.
        let mock = Builder::new()
            .write(b"CG 1-10 PLAY 0\r\n")
            .wait(Duration::from_secs(3))
            .build();
        let mut conn = Connection::from_stream(
            mock,
            ConnectionOptions {
                timeout: Some(Duration::from_secs(1)),
                ..ConnectionOptions::default()
            },
        );

        let err = conn
            .execute(&Command::cg_play(Address::default(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AmcpError::Timeout { .. }));
        assert!(conn.is_out_of_sync());

        let err = conn
            .execute(&Command::data_retrieve("news").unwrap())
            .await
            .unwrap_err();
        match err {
            AmcpError::Connection(source) => {
                assert_eq!(source.kind(), io::ErrorKind::NotConnected);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_cycle_leaves_connection_out_of_sync() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .wait(Duration::from_secs(3))
            .build();
        let mut conn = connection(mock);

        let cancelled =
            tokio::time::timeout(Duration::from_secs(1), conn.execute(&Command::tls())).await;
        assert!(cancelled.is_err());
        assert!(conn.is_out_of_sync());
        assert!(matches!(
            conn.execute(&Command::tls()).await,
            Err(AmcpError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn malformed_status_leaves_connection_out_of_sync() {
        let mock = Builder::new().write(b"TLS\r\n").read(b"hello\r\n").build();
        let mut conn = connection(mock);

        assert!(conn.execute(&Command::tls()).await.is_err());
        assert!(conn.is_out_of_sync());
    }

    #[tokio::test]
    async fn error_status_keeps_connection_usable() {
        let mock = Builder::new()
            .write(b"DATA REMOVE gone\r\n")
            .read(b"404 DATA REMOVE ERROR\r\n")
            .write(b"TLS\r\n")
            .read(b"200 TLS OK\r\n\r\n")
            .build();
        let mut conn = connection(mock);

        assert!(conn.execute(&Command::data_remove("gone").unwrap()).await.is_err());
        assert!(!conn.is_out_of_sync());
        assert!(conn.execute(&Command::tls()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn premature_close_during_payload() {
        let mock = Builder::new()
            .write(b"TLS\r\n")
            .read(b"200 TLS OK\r\n\"A\" 1 2\r\n")
            .build();
        let mut conn = connection(mock);

        let err = conn.execute(&Command::tls()).await.unwrap_err();
        assert!(matches!(err, AmcpError::PrematureClose { .. }));
    }
}
