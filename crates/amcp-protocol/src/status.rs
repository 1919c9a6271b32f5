//! Status line parsing and response classification.
//!
//! Every AMCP response starts with a line of the form `CODE [reason]`, where
//! `CODE` is three ASCII digits. The code alone decides how much data
//! follows:
//!
//! ```text
//! 100, 202         no data
//! 101, 201         one line, terminated by \r\n
//! 200              a block of lines, terminated by an empty line
//! 4xx, 5xx, 600    error, no data
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::{AmcpError, AmcpResult, ClientErrorKind, ServerErrorKind};

/// The byte sequence that ends a response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// `\r\n`
    Line,
    /// `\r\n\r\n`
    Block,
}

impl Terminator {
    pub fn delimiter(&self) -> &'static [u8] {
        match self {
            Self::Line => b"\r\n",
            Self::Block => b"\r\n\r\n",
        }
    }
}

/// What follows a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    NoData,
    /// Exactly one data line. Equivalent to `MultiLine(Terminator::Line)`.
    SingleLine,
    MultiLine(Terminator),
    ClientError(ClientErrorKind),
    ServerError(ServerErrorKind),
    Unimplemented,
    Unknown(String),
}

impl ResponseShape {
    /// The terminator of the payload that follows, or `None` if nothing follows.
    pub fn payload_terminator(&self) -> Option<Terminator> {
        match self {
            Self::SingleLine => Some(Terminator::Line),
            Self::MultiLine(terminator) => Some(*terminator),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ClientError(_) | Self::ServerError(_) | Self::Unimplemented | Self::Unknown(_)
        )
    }
}

/// Maps a status code to the shape of its response.
pub fn classify(code: &str) -> ResponseShape {
    match code {
        "100" => ResponseShape::NoData,
        "101" => ResponseShape::MultiLine(Terminator::Line),
        "200" => ResponseShape::MultiLine(Terminator::Block),
        "201" => ResponseShape::MultiLine(Terminator::Line),
        "202" => ResponseShape::NoData,
        "400" => ResponseShape::ClientError(ClientErrorKind::CommandNotUnderstood),
        "401" => ResponseShape::ClientError(ClientErrorKind::IllegalChannel),
        "402" => ResponseShape::ClientError(ClientErrorKind::ParameterMissing),
        "403" => ResponseShape::ClientError(ClientErrorKind::IllegalParameter),
        "404" => ResponseShape::ClientError(ClientErrorKind::MediaNotFound),
        "500" | "501" => ResponseShape::ServerError(ServerErrorKind::Internal),
        "502" => ResponseShape::ServerError(ServerErrorKind::MediaUnreadable),
        "600" => ResponseShape::Unimplemented,
        other => ResponseShape::Unknown(other.to_string()),
    }
}

/// The first line of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    code: String,
    reason: String,
}

impl StatusLine {
    /// Parses a status line.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the line does not start with three ASCII
    /// digits followed by whitespace or the end of the line.
    pub fn parse(line: &str) -> AmcpResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let bytes = line.as_bytes();

        let has_code = bytes.len() >= 3
            && bytes[..3].iter().all(u8::is_ascii_digit)
            && bytes.get(3).is_none_or(|b| b.is_ascii_whitespace());
        if !has_code {
            return Err(AmcpError::malformed(format!("invalid status line {line:?}")));
        }

        Ok(Self {
            code: line[..3].to_string(),
            reason: line[3..].trim().to_string(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// The text after the code, e.g. `CG OK` or `ERROR`.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn shape(&self) -> ResponseShape {
        classify(&self.code)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            f.write_str(&self.code)
        } else {
            write!(f, "{} {}", self.code, self.reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_defined_code() {
        use ResponseShape::*;
        let table = [
            ("100", NoData),
            ("101", MultiLine(Terminator::Line)),
            ("200", MultiLine(Terminator::Block)),
            ("201", MultiLine(Terminator::Line)),
            ("202", NoData),
            ("400", ClientError(ClientErrorKind::CommandNotUnderstood)),
            ("401", ClientError(ClientErrorKind::IllegalChannel)),
            ("402", ClientError(ClientErrorKind::ParameterMissing)),
            ("403", ClientError(ClientErrorKind::IllegalParameter)),
            ("404", ClientError(ClientErrorKind::MediaNotFound)),
            ("500", ServerError(ServerErrorKind::Internal)),
            ("501", ServerError(ServerErrorKind::Internal)),
            ("502", ServerError(ServerErrorKind::MediaUnreadable)),
            ("600", Unimplemented),
        ];
        for (code, expected) in table {
            assert_eq!(classify(code), expected, "code {code}");
        }
    }

    #[test]
    fn other_codes_are_unknown() {
        for code in ["000", "102", "203", "405", "503", "601", "999"] {
            assert_eq!(classify(code), ResponseShape::Unknown(code.to_string()));
        }
    }

    #[test]
    fn payload_terminator() {
        assert_eq!(classify("202").payload_terminator(), None);
        assert_eq!(classify("201").payload_terminator(), Some(Terminator::Line));
        assert_eq!(classify("200").payload_terminator(), Some(Terminator::Block));
        assert_eq!(ResponseShape::SingleLine.payload_terminator(), Some(Terminator::Line));
        assert_eq!(classify("404").payload_terminator(), None);
        assert!(classify("404").is_error());
    }

    #[test]
    fn parses_status_line() {
        let status = StatusLine::parse("202 PLAY OK\r\n").unwrap();
        assert_eq!(status.code(), "202");
        assert_eq!(status.reason(), "PLAY OK");
        assert_eq!(status.shape(), ResponseShape::NoData);
        assert_eq!(status.to_string(), "202 PLAY OK");

        let bare = StatusLine::parse("400").unwrap();
        assert_eq!(bare.reason(), "");
    }

    #[test]
    fn rejects_lines_without_code() {
        for line in ["", "OK", "20 OK", "2000 OK", "abc ERROR"] {
            assert!(StatusLine::parse(line).is_err(), "{line:?}");
        }
    }
}
