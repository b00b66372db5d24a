use crate::mcp::error::{ErrorCode, RpcError};
use crate::mcp::message::Response;
use crate::mcp::Server;
use futures::{SinkExt, StreamExt};
use std::fmt::{Display, Formatter};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

/// Longest accepted message, in bytes.
pub const MAX_MESSAGE_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub enum TransportError {
    BindFailed(std::io::Error),
    ConnectionFailed(std::io::Error),
    Io(std::io::Error),
    Encode(serde_json::Error),
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TransportError::BindFailed(e) => write!(f, "BindFailed: {}", e),
            TransportError::ConnectionFailed(e) => write!(f, "ConnectionFailed: {}", e),
            TransportError::Io(e) => write!(f, "IoError: {}", e),
            TransportError::Encode(e) => write!(f, "EncodeError: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<LinesCodecError> for TransportError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::Io(e) => TransportError::Io(e),
            LinesCodecError::MaxLineLengthExceeded => TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "line too long",
            )),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Encode(e)
    }
}

/// Span wrapping a single session, stdio or TCP.
pub fn session_span(peer: impl Display) -> tracing::Span {
    let id = uuid::Uuid::new_v4();
    tracing::info_span!("session", id = %id, peer = %peer)
}

/// Runs one MCP session over newline-delimited JSON until the reader hits
/// end of input.
pub async fn serve_lines<R, W>(reader: R, writer: W, server: Server) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_LEN));
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    let mut session = server.session();

    while let Some(line) = lines.next().await {
        let response = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => session.handle_line(&line).await,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::warn!("dropping message over {} bytes", MAX_MESSAGE_LEN);
                Some(Response::failure(
                    None,
                    RpcError::new(ErrorCode::InvalidRequest, "message too large"),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(response) = response {
            sink.send(serde_json::to_string(&response)?).await?;
        }
    }

    tracing::info!("client closed the session");
    Ok(())
}
