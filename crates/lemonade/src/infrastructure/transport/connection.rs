//! Framed request/reply over a TCP stream.
//!
//! TCP is a stream protocol, so each frame is read in two steps: the fixed
//! [`HEADER_SIZE`] header first, then exactly the payload length it declares.
//! The same helpers are used by the client and by the endpoint.

use lemonade_core::protocol::messages::HEADER_SIZE;
use lemonade_core::{decode_message, encode_message, ProtocolError, RpcMessage};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Errors on an established connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// An I/O error occurred while reading or writing.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The peer closed the connection before replying.
    #[error("connection closed by peer")]
    Closed,
}

/// Reads one message from `reader`.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly between frames.
///
/// # Errors
///
/// Returns [`ConnectionError::Io`] when the stream ends inside a frame and
/// [`ConnectionError::Protocol`] for an invalid header or payload.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<RpcMessage>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut frame = vec![0u8; HEADER_SIZE];
    match reader.read_exact(&mut frame).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = lemonade_core::protocol::payload_len(&frame)?;
    frame.resize(HEADER_SIZE + len, 0);
    if len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..]).await?;
    }

    let (msg, _) = decode_message(&frame)?;
    debug!("received {}", msg.method_name());
    Ok(Some(msg))
}

/// Encodes `msg` and writes it to `writer`.
pub async fn write_message<W>(writer: &mut W, msg: &RpcMessage) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_message(msg)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    debug!("sent {}", msg.method_name());
    Ok(())
}

/// A client connection to an endpoint.
pub struct EndpointConnection {
    stream: TcpStream,
}

impl EndpointConnection {
    /// Dials `host:port`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the endpoint cannot be reached.
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Sends `request` and waits for the reply.
    pub async fn call(&mut self, request: &RpcMessage) -> Result<RpcMessage, ConnectionError> {
        write_message(&mut self.stream, request).await?;
        read_message(&mut self.stream)
            .await?
            .ok_or(ConnectionError::Closed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
