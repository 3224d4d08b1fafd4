//! WebSocket stream connector
//!
//! Dials the feed, sends the subscription as the first text message and
//! hands back a [`WsSession`] that yields raw frames.

use std::time::Duration;

use bytes::Bytes;
use contracts::{ConnectionManager, ContractError, FeedConfig, FeedSession, SubscriptionRequest};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

use crate::error::{require_scheme, Result};

/// Upper bound for sending our close frame
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket connection manager
#[derive(Debug, Clone)]
pub struct StreamConnector {
    url: String,
    connect_timeout: Duration,
}

impl StreamConnector {
    /// Create a connector for a `ws://` or `wss://` endpoint
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let url = url.into();
        require_scheme(&url, &["ws", "wss"])?;
        Ok(Self {
            url,
            connect_timeout,
        })
    }

    pub fn from_config(feed: &FeedConfig) -> Result<Self> {
        Self::new(feed.url.clone(), feed.connect_timeout())
    }
}

impl ConnectionManager for StreamConnector {
    type Session = WsSession;

    fn endpoint(&self) -> &str {
        &self.url
    }

    #[instrument(name = "stream_acquire", skip(self, request), fields(endpoint = %self.url))]
    async fn acquire(
        &self,
        request: &SubscriptionRequest,
    ) -> std::result::Result<WsSession, ContractError> {
        let dial = connect_async(self.url.as_str());
        let (mut socket, response) = match tokio::time::timeout(self.connect_timeout, dial).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(ContractError::dial_failed(&self.url, e)),
            Err(elapsed) => return Err(ContractError::dial_failed(&self.url, elapsed)),
        };
        debug!(status = %response.status(), "websocket handshake complete");

        let subscription = serde_json::to_string(request)
            .map_err(|e| ContractError::handshake_failed(&self.url, e))?;

        if let Err(e) = socket.send(Message::Text(subscription.into())).await {
            let _ = socket.close(None).await;
            return Err(ContractError::handshake_failed(&self.url, e));
        }

        info!(
            boxes = request.bounding_boxes.len(),
            mmsi_filters = request.filter_mmsi.len(),
            "subscription sent"
        );

        Ok(WsSession {
            socket,
            endpoint: self.url.clone(),
            closed: false,
        })
    }
}

/// Subscribed WebSocket session
pub struct WsSession {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    endpoint: String,
    closed: bool,
}

impl FeedSession for WsSession {
    async fn read_frame(&mut self) -> std::result::Result<Bytes, ContractError> {
        if self.closed {
            return Err(ContractError::stream_closed("session already closed"));
        }

        loop {
            match self.socket.next().await {
                Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => {
                    return Ok(Bytes::from(message.into_data()));
                }
                // tungstenite answers pings on its own
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| {
                            format!("close frame {}: {}", u16::from(f.code), f.reason.as_str())
                        })
                        .unwrap_or_else(|| "close frame".to_string());
                    return Err(ContractError::stream_closed(reason));
                }
                Some(Err(e)) => return Err(ContractError::stream_closed(e.to_string())),
                None => return Err(ContractError::stream_closed("end of stream")),
            }
        }
    }

    #[instrument(name = "stream_close", skip(self), fields(endpoint = %self.endpoint))]
    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match tokio::time::timeout(CLOSE_TIMEOUT, self.socket.close(None)).await {
            Ok(Ok(())) => debug!("websocket closed"),
            Ok(Err(e)) => debug!(error = %e, "websocket close after remote shutdown"),
            Err(_) => warn!("timed out sending close frame"),
        }
    }
}
