use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::types::Result;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Open a WebSocket connection to the given URL
    pub async fn create(url: &str) -> Result<WsStream> {
        tracing::debug!("opening WebSocket connection to {url}");
        let (stream, _response) = connect_async(url).await?;
        Ok(stream)
    }
}
