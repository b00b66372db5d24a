use crate::mcp::Server;
use crate::transport::{self, TransportError};
use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::task;
use tokio::time::Instant;
use tracing::Instrument;

#[async_trait]
pub trait ToTcpListener {
    async fn to_tcp_listener(self) -> Result<TcpListener, std::io::Error>;
}

#[async_trait]
impl ToTcpListener for TcpListener {
    async fn to_tcp_listener(self) -> Result<TcpListener, std::io::Error> {
        Ok(self)
    }
}

#[async_trait]
impl ToTcpListener for &str {
    async fn to_tcp_listener(self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(self).await
    }
}

#[async_trait]
pub trait SocketHandler {
    async fn handle_connection(&mut self, stream: TcpStream) -> Result<(), TransportError>;
}

/// Each TCP connection is an independent MCP session on the shared server.
#[async_trait]
impl SocketHandler for Server {
    async fn handle_connection(&mut self, stream: TcpStream) -> Result<(), TransportError> {
        let (reader, writer) = stream.into_split();
        transport::serve_lines(reader, writer, self.clone()).await
    }
}

pub async fn run<L, H>(addr: L, handler: H) -> Result<(), TransportError>
where
    L: ToTcpListener,
    H: SocketHandler + Clone + Send + 'static,
{
    let listener = addr
        .to_tcp_listener()
        .await
        .map_err(TransportError::BindFailed)?;
    tracing::info!("MCP server listening on {}", listener.local_addr()?);

    loop {
        let (socket, peer_addr) = listener
            .accept()
            .await
            .map_err(TransportError::ConnectionFailed)?;
        tracing::info!("New connection: {}", peer_addr);

        let mut handler = handler.clone();
        let start = Instant::now();
        let span = transport::session_span(peer_addr);

        task::spawn(
            async move {
                if let Err(e) = handler.handle_connection(socket).await {
                    tracing::error!("failed to handle connection: {}", e);
                }
                tracing::info!("Closing after {} ms", start.elapsed().as_millis());
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::mcp::ServerInfo;
    use crate::stripe::mock::MockStripe;
    use serde_json::Value;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn test_sessions_share_audit_log() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_address = listener.local_addr().unwrap();
        let server = Server::new(
            MockStripe::default(),
            AuditLog::default(),
            ServerInfo {
                name: "mcp-server-stripe".into(),
                version: "0.1.0".into(),
            },
        );
        let audit_view = server.clone();
        tokio::spawn(async move {
            run(listener, server).await.unwrap();
        });

        for (i, email) in ["a@example.com", "b@example.com"].iter().enumerate() {
            let stream = TcpStream::connect(server_address).await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();

            writer
                .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n")
                .await
                .unwrap();
            lines.next_line().await.unwrap().unwrap();

            let call = serde_json::json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "customer_create", "arguments": {"email": email}}
            });
            writer
                .write_all(format!("{}\n", call).as_bytes())
                .await
                .unwrap();
            let response: Value =
                serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(response["result"]["isError"], false);
            assert_eq!(audit_view.audit().len(), i + 1);
        }
    }
}
