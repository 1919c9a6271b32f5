//! Protocol error types.

use std::fmt;

use thiserror::Error;

/// Result type for protocol operations.
pub type AmcpResult<T> = Result<T, AmcpError>;

/// Errors reported by the server for a malformed or unsatisfiable request (4xx).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    /// 400
    CommandNotUnderstood,
    /// 401
    IllegalChannel,
    /// 402
    ParameterMissing,
    /// 403
    IllegalParameter,
    /// 404
    MediaNotFound,
}

impl ClientErrorKind {
    pub fn code(&self) -> u16 {
        match self {
            Self::CommandNotUnderstood => 400,
            Self::IllegalChannel => 401,
            Self::ParameterMissing => 402,
            Self::IllegalParameter => 403,
            Self::MediaNotFound => 404,
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CommandNotUnderstood => "command not understood",
            Self::IllegalChannel => "illegal video channel",
            Self::ParameterMissing => "parameter missing",
            Self::IllegalParameter => "illegal parameter",
            Self::MediaNotFound => "media file not found",
        };
        write!(f, "{} {}", self.code(), text)
    }
}

/// Errors reported by the server while executing a valid request (5xx).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerErrorKind {
    /// 500 or 501
    Internal,
    /// 502
    MediaUnreadable,
}

impl fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("internal server error"),
            Self::MediaUnreadable => f.write_str("502 media file unreadable"),
        }
    }
}

/// Violations of the wire protocol itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// 600: the server does not implement the command.
    Unimplemented,
    /// A status code outside the known table.
    UnknownCode(String),
    /// Bytes that cannot be a valid response, or a payload that does not parse.
    MalformedFrame(String),
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unimplemented => f.write_str("600 command not implemented"),
            Self::UnknownCode(code) => write!(f, "unknown status code {code}"),
            Self::MalformedFrame(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

/// Errors that can occur while talking AMCP.
#[derive(Debug, Error)]
pub enum AmcpError {
    /// The byte stream failed or the peer refused the connection.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// A read or write did not finish within the deadline.
    #[error("timeout during {operation}")]
    Timeout { operation: String },

    /// The peer closed the stream before a delimiter arrived.
    #[error("connection closed mid-response after {received} bytes")]
    PrematureClose { received: usize },

    #[error("{kind}{}", in_response_to(.command))]
    Client {
        kind: ClientErrorKind,
        command: String,
    },

    #[error("{kind}{}", in_response_to(.command))]
    Server {
        kind: ServerErrorKind,
        command: String,
    },

    #[error("{kind}{}", in_response_to(.command))]
    Protocol {
        kind: ProtocolErrorKind,
        command: String,
    },

    /// A command parameter failed validation before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Template data could not be encoded.
    #[error("payload encoding failed: {0}")]
    Payload(String),
}

fn in_response_to(command: &str) -> String {
    if command.is_empty() {
        String::new()
    } else {
        format!(" (in response to `{command}`)")
    }
}

impl AmcpError {
    /// A malformed frame or payload not yet tied to a command.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Protocol {
            kind: ProtocolErrorKind::MalformedFrame(detail.into()),
            command: String::new(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Attaches the command line to an error that does not carry one yet.
    #[must_use]
    pub fn for_command(mut self, line: &str) -> Self {
        match &mut self {
            Self::Client { command, .. }
            | Self::Server { command, .. }
            | Self::Protocol { command, .. }
                if command.is_empty() =>
            {
                *command = line.to_string();
            }
            _ => {}
        }
        self
    }

    /// The command this error was raised for, if known.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Client { command, .. }
            | Self::Server { command, .. }
            | Self::Protocol { command, .. }
                if !command.is_empty() =>
            {
                Some(command)
            }
            _ => None,
        }
    }

    /// Returns true for errors the server reported in a status line.
    pub fn is_status_error(&self) -> bool {
        matches!(
            self,
            Self::Client { .. }
                | Self::Server { .. }
                | Self::Protocol {
                    kind: ProtocolErrorKind::Unimplemented | ProtocolErrorKind::UnknownCode(_),
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_command() {
        let err = AmcpError::Client {
            kind: ClientErrorKind::MediaNotFound,
            command: "CG 1-10 ADD 0 missing 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "404 media file not found (in response to `CG 1-10 ADD 0 missing 0`)"
        );
    }

    #[test]
    fn for_command_fills_only_missing_command() {
        let err = AmcpError::malformed("bad xml").for_command("INFO CONFIG");
        assert_eq!(err.command(), Some("INFO CONFIG"));

        let err = err.for_command("TLS");
        assert_eq!(err.command(), Some("INFO CONFIG"));

        let err = AmcpError::timeout("read").for_command("TLS");
        assert_eq!(err.command(), None);
    }

    #[test]
    fn status_errors() {
        let unimplemented = AmcpError::Protocol {
            kind: ProtocolErrorKind::Unimplemented,
            command: "INFO SERVER".into(),
        };
        assert!(unimplemented.is_status_error());
        assert!(!AmcpError::malformed("x").is_status_error());
        assert!(!AmcpError::PrematureClose { received: 3 }.is_status_error());
    }
}
