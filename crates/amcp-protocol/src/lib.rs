//! AMCP framing, status classification, command encoding and XML payload parsing
//!
//! Everything in this crate is free of I/O. The async transport and the
//! request/response engine live in `amcp-client`.

pub mod command;
pub mod error;
pub mod framing;
pub mod payload;
pub mod status;
pub mod xml;

pub use command::{Address, Command, TERMINATOR};
pub use error::{AmcpError, AmcpResult, ClientErrorKind, ProtocolErrorKind, ServerErrorKind};
pub use framing::{DEFAULT_MAX_FRAME_BYTES, FrameBuffer, ResponseEnvelope};
pub use payload::Payload;
pub use status::{ResponseShape, StatusLine, Terminator, classify};

/// Default AMCP port.
pub const DEFAULT_PORT: u16 = 5250;
