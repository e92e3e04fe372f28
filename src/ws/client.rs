//! Reconnecting WebSocket client
//!
//! Channel-based wrapper over `tokio-tungstenite`: the consumer receives
//! [`WsEvent`]s and can send text frames back. Reconnection uses exponential
//! backoff from the configured base delay up to the ceiling, and the delay
//! resets to the base after any successful connect. Each reconnect surfaces
//! a fresh `Connected` event so the consumer can resubscribe and discard
//! anything attributed to the previous session.

use super::types::{WsConfig, WsError, WsEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Reusable WebSocket client with automatic reconnection
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect, returning an event receiver and an outbound text sender
    ///
    /// Spawns a background task owning the connection. The task ends when
    /// the receiver is dropped, the server closes cleanly, or the reconnect
    /// budget is exhausted; a final `Disconnected` event marks the end.
    pub fn connect(&self) -> (mpsc::Receiver<WsEvent>, mpsc::Sender<String>) {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (send_tx, send_rx) = mpsc::channel(256);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = run_connection_loop(config, event_tx, send_rx).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        (event_rx, send_tx)
    }
}

/// Reconnection loop around individual connection attempts
async fn run_connection_loop(
    config: WsConfig,
    tx: mpsc::Sender<WsEvent>,
    mut send_rx: mpsc::Receiver<String>,
) -> Result<(), WsError> {
    let mut attempts = 0u32;
    let mut delay = config.initial_reconnect_delay;

    loop {
        match stream_one_connection(&config, &tx, &mut send_rx).await {
            Ok(ConnectionEnd::Clean) => {
                tracing::info!("WebSocket connection closed cleanly");
                let _ = tx.send(WsEvent::Disconnected).await;
                return Ok(());
            }
            Ok(ConnectionEnd::HadConnected) => {
                // Connection was live before it dropped: backoff starts over
                attempts = 0;
                delay = config.initial_reconnect_delay;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt = attempts + 1, "WebSocket connect failed");
            }
        }

        attempts += 1;
        if config.max_reconnect_attempts > 0 && attempts >= config.max_reconnect_attempts {
            tracing::error!("Max reconnection attempts reached");
            let _ = tx.send(WsEvent::Disconnected).await;
            return Err(WsError::MaxReconnectsExceeded);
        }
        if tx.is_closed() {
            tracing::debug!("Receiver dropped, stopping reconnection");
            return Ok(());
        }

        let _ = tx.send(WsEvent::Reconnecting { attempt: attempts }).await;
        sleep(delay).await;
        delay = (delay * 2).min(config.max_reconnect_delay);
    }
}

/// How a single connection ended
enum ConnectionEnd {
    /// Server closed, or consumer went away: stop for good
    Clean,
    /// Connection was established and later dropped: reconnect
    HadConnected,
}

/// Run one connection until it drops
async fn stream_one_connection(
    config: &WsConfig,
    tx: &mpsc::Sender<WsEvent>,
    send_rx: &mut mpsc::Receiver<String>,
) -> Result<ConnectionEnd, WsError> {
    tracing::info!(url = %config.url, "Connecting to WebSocket");

    let (ws_stream, _response) = connect_async(&config.url)
        .await
        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
    let (mut write, mut read) = ws_stream.split();

    tracing::info!("WebSocket connected");
    if tx.send(WsEvent::Connected).await.is_err() {
        return Ok(ConnectionEnd::Clean);
    }

    let mut ping_interval = tokio::time::interval(config.ping_interval);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(WsEvent::Text(text)).await.is_err() {
                            tracing::debug!("Receiver dropped, closing connection");
                            return Ok(ConnectionEnd::Clean);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if write.send(Message::Pong(data)).await.is_err() {
                            return Ok(ConnectionEnd::HadConnected);
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Received close frame");
                        return Ok(ConnectionEnd::Clean);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket stream error");
                        return Ok(ConnectionEnd::HadConnected);
                    }
                    None => {
                        tracing::warn!("WebSocket stream ended unexpectedly");
                        return Ok(ConnectionEnd::HadConnected);
                    }
                }
            }

            msg = send_rx.recv() => {
                match msg {
                    Some(text) => {
                        write.send(Message::Text(text)).await
                            .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    }
                    None => {
                        // Sender dropped: consumer is gone
                        return Ok(ConnectionEnd::Clean);
                    }
                }
            }

            _ = ping_interval.tick() => {
                if write.send(Message::Ping(vec![])).await.is_err() {
                    return Ok(ConnectionEnd::HadConnected);
                }
            }
        }
    }
}
