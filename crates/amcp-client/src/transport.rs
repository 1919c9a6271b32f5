//! Deadline-bound framed reads and writes over a byte stream.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use amcp_protocol::{AmcpError, AmcpResult, FrameBuffer};

const READ_CHUNK: usize = 4096;

/// A byte stream with a frame buffer in front of it.
///
/// Every read and write runs under the same optional deadline.
#[derive(Debug)]
pub struct Transport<S> {
    stream: S,
    frames: FrameBuffer,
    deadline: Option<Duration>,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, deadline: Option<Duration>, max_frame_bytes: usize) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(max_frame_bytes),
            deadline,
        }
    }

    /// Sends `bytes` and flushes the stream.
    pub async fn write(&mut self, bytes: &[u8]) -> AmcpResult<()> {
        let stream = &mut self.stream;
        within(self.deadline, "write", async move {
            stream.write_all(bytes).await?;
            stream.flush().await
        })
        .await?;
        trace!(bytes = bytes.len(), "wrote request");
        Ok(())
    }

    /// Reads until a frame ending in `delimiter` is complete and returns its
    /// non-empty lines.
    ///
    /// # Errors
    ///
    /// `PrematureClose` if the peer closes first, `Timeout` if a single read
    /// exceeds the deadline, `MalformedFrame` if the frame grows past the
    /// configured maximum.
    pub async fn read_until(&mut self, delimiter: &[u8]) -> AmcpResult<Vec<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(lines) = self.frames.next_frame(delimiter)? {
                return Ok(lines);
            }

            let read = within(self.deadline, "read", self.stream.read(&mut chunk)).await?;
            if read == 0 {
                return Err(AmcpError::PrematureClose {
                    received: self.frames.buffered(),
                });
            }
            trace!(bytes = read, "read chunk");
            self.frames.extend(&chunk[..read]);
        }
    }
}

/// Runs an I/O future under an optional deadline.
pub(crate) async fn within<T>(
    deadline: Option<Duration>,
    operation: &str,
    fut: impl Future<Output = io::Result<T>>,
) -> AmcpResult<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AmcpError::timeout(operation))?
            .map_err(AmcpError::from),
        None => fut.await.map_err(AmcpError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amcp_protocol::DEFAULT_MAX_FRAME_BYTES;
    use tokio_test::io::Builder;

    const LINE: &[u8] = b"\r\n";
    const BLOCK: &[u8] = b"\r\n\r\n";

    fn transport(mock: tokio_test::io::Mock) -> Transport<tokio_test::io::Mock> {
        Transport::new(mock, Some(Duration::from_secs(1)), DEFAULT_MAX_FRAME_BYTES)
    }

    #[tokio::test]
    async fn writes_bytes() {
        let mock = Builder::new().write(b"TLS\r\n").build();
        let mut transport = transport(mock);
        transport.write(b"TLS\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn reads_frames_across_chunks() {
        let mock = Builder::new()
            .read(b"200 TL")
            .read(b"S OK\r\n\"A\" 1 2\r")
            .read(b"\n\"B\" 3 4\r\n\r")
            .read(b"\n")
            .build();
        let mut transport = transport(mock);

        assert_eq!(transport.read_until(LINE).await.unwrap(), vec!["200 TLS OK"]);
        assert_eq!(
            transport.read_until(BLOCK).await.unwrap(),
            vec!["\"A\" 1 2", "\"B\" 3 4"]
        );
    }

    #[tokio::test]
    async fn one_byte_chunks() {
        let input = b"201 DATA RETRIEVE OK\r\n<data/>\r\n";
        let mut builder = Builder::new();
        for byte in input.chunks(1) {
            builder.read(byte);
        }
        let mut transport = transport(builder.build());

        assert_eq!(
            transport.read_until(LINE).await.unwrap(),
            vec!["201 DATA RETRIEVE OK"]
        );
        assert_eq!(transport.read_until(LINE).await.unwrap(), vec!["<data/>"]);
    }

    #[tokio::test]
    async fn peer_close_before_delimiter() {
        let mock = Builder::new().read(b"200 OK\r\npartial").build();
        let mut transport = transport(mock);

        transport.read_until(LINE).await.unwrap();
        let err = transport.read_until(BLOCK).await.unwrap_err();
        assert!(matches!(err, AmcpError::PrematureClose { received: 7 }));
    }

    #[tokio::test]
    async fn read_error_is_connection_error() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut transport = transport(mock);

        let err = transport.read_until(LINE).await.unwrap_err();
        assert!(matches!(err, AmcpError::Connection(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_peer_times_out() {
        let mock = Builder::new().wait(Duration::from_secs(10)).build();
        let mut transport = transport(mock);

        let err = transport.read_until(LINE).await.unwrap_err();
        assert!(matches!(err, AmcpError::Timeout { ref operation } if operation == "read"));
    }

    #[tokio::test(start_paused = true)]
    async fn no_deadline_waits() {
        let mock = Builder::new()
            .wait(Duration::from_secs(60))
            .read(b"202 OK\r\n")
            .build();
        let mut transport = Transport::new(mock, None, DEFAULT_MAX_FRAME_BYTES);

        assert_eq!(transport.read_until(LINE).await.unwrap(), vec!["202 OK"]);
    }
}
