use futures_util::StreamExt;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::common::ClientError;
use crate::protocol::PUSH;
use crate::status::DefenseStatus;
use crate::transport::{PushSource, PushStream};

/// Opens `ws://<engine>/ws/<game_id>` subscriptions.
#[derive(Debug, Clone)]
pub struct WsPushSource {
    ws_url: String,
}

impl WsPushSource {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Push endpoint for `game_id` under `ws_root`. The id is percent-encoded as a
/// single path segment.
pub fn subscription_url(ws_root: &str, game_id: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(ws_root)
        .map_err(|e| ClientError::Subscription(format!("{}: {}", ws_root, e)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Subscription(format!("{}: not a base URL", ws_root)))?
        .pop_if_empty()
        .push(PUSH)
        .push(game_id);
    Ok(url)
}

#[async_trait::async_trait]
impl PushSource for WsPushSource {
    async fn subscribe(&self, game_id: &str) -> Result<Box<dyn PushStream>, ClientError> {
        let url = subscription_url(&self.ws_url, game_id)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Subscription(format!("{}: {}", url, e)))?;
        log::info!("Push channel open at {}", url);
        Ok(Box::new(WsPushStream { socket }))
    }
}

struct WsPushStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl PushStream for WsPushStream {
    async fn next_status(&mut self) -> Option<Result<DefenseStatus, ClientError>> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).map_err(ClientError::from))
                }
                Ok(Message::Binary(bytes)) => {
                    return Some(serde_json::from_slice(&bytes).map_err(ClientError::from))
                }
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Some(Err(ClientError::Subscription(e.to_string()))),
            }
        }
    }
}
