//! Socket.IO client for the server's `video_status` push events
//!
//! Only the subset of Engine.IO v4 text framing the server actually uses is
//! understood: the open handshake, heartbeats, the default namespace connect,
//! and event packets. Anything else is logged and skipped.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::{LiveUpdateSource, Subscription};
use crate::error::{FrameError, LiveUpdateError};
use crate::models::StatusEvent;

/// Name of the event carrying `{ "id", "status" }`
pub const STATUS_EVENT: &str = "video_status";

/// Socket.IO connect request for the default namespace
pub const CONNECT_PACKET: &str = "40";

const DEFAULT_CAPACITY: usize = 256;

/// One decoded Engine.IO text frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO handshake; the client must answer with [`CONNECT_PACKET`]
    Open,
    Close,
    /// Heartbeat with its optional payload
    Ping(String),
    Pong,
    /// Namespace connect acknowledged
    Connected,
    Disconnected,
    ConnectError(String),
    Event { name: String, payload: Value },
    /// Well-formed but irrelevant to status updates (noop, upgrade, acks, ...)
    Ignored,
}

/// Decode a websocket text message into an Engine.IO frame
pub fn decode_frame(text: &str) -> Result<Frame, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => Ok(Frame::Open),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping(rest.to_string())),
        '3' => Ok(Frame::Pong),
        '4' => decode_socket_packet(rest),
        '5' | '6' => Ok(Frame::Ignored),
        other => Err(FrameError::UnknownType(other)),
    }
}

fn decode_socket_packet(packet: &str) -> Result<Frame, FrameError> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let body = strip_ack_id(strip_namespace(chars.as_str()));

    match kind {
        '0' => Ok(Frame::Connected),
        '1' => Ok(Frame::Disconnected),
        '2' => decode_event(body),
        '4' => Ok(Frame::ConnectError(body.to_string())),
        '3' | '5' | '6' => Ok(Frame::Ignored),
        other => Err(FrameError::UnknownType(other)),
    }
}

/// `/admin,[...]` carries a namespace before the payload
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn strip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn decode_event(body: &str) -> Result<Frame, FrameError> {
    let Value::Array(mut parts) = serde_json::from_str::<Value>(body)? else {
        return Err(FrameError::MissingEventName);
    };
    if parts.is_empty() {
        return Err(FrameError::MissingEventName);
    }

    let payload = if parts.len() > 1 {
        parts.swap_remove(1)
    } else {
        Value::Null
    };
    match parts.swap_remove(0) {
        Value::String(name) => Ok(Frame::Event { name, payload }),
        _ => Err(FrameError::MissingEventName),
    }
}

/// Build the websocket address of the Socket.IO endpoint under `base`
pub fn socket_url(base: &str) -> Result<Url, LiveUpdateError> {
    let mut url =
        Url::parse(base.trim()).map_err(|e| LiveUpdateError::InvalidUrl(format!("{}: {}", base, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(LiveUpdateError::InvalidUrl(format!(
                "unsupported scheme: {}",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| LiveUpdateError::InvalidUrl(format!("cannot use {} for {}", scheme, base)))?;

    let path = format!("{}/socket.io/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// [`LiveUpdateSource`] backed by the server's Socket.IO endpoint
///
/// A dropped connection ends the subscription; reconnecting is up to the
/// caller.
#[derive(Debug, Clone)]
pub struct SocketIoChannel {
    url: Url,
    capacity: usize,
}

impl SocketIoChannel {
    pub fn new(base_url: &str) -> Result<Self, LiveUpdateError> {
        Ok(Self {
            url: socket_url(base_url)?,
            capacity: DEFAULT_CAPACITY,
        })
    }

    /// Number of events buffered before the connection reader waits
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl LiveUpdateSource for SocketIoChannel {
    async fn subscribe(&self) -> Result<Subscription, LiveUpdateError> {
        info!("Connecting to live updates at {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| LiveUpdateError::Connect(e.to_string()))?;
        info!("Connected to live updates");

        let (sender, events) = mpsc::channel(self.capacity);
        let task = tokio::spawn(run_connection(ws_stream, sender));
        Ok(Subscription::from_parts(events, Some(task)))
    }
}

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn run_connection(ws_stream: SocketStream, events: mpsc::Sender<StatusEvent>) {
    let (mut write, mut read) = ws_stream.split();

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let reply = match decode_frame(text.as_str()) {
                    Ok(Frame::Open) => Some(CONNECT_PACKET.to_string()),
                    Ok(Frame::Ping(payload)) => Some(format!("3{}", payload)),
                    Ok(Frame::Connected) => {
                        debug!("Socket.IO namespace connected");
                        None
                    }
                    Ok(Frame::Event { name, payload }) if name == STATUS_EVENT => {
                        match serde_json::from_value::<StatusEvent>(payload) {
                            Ok(event) => {
                                if events.send(event).await.is_err() {
                                    debug!("Subscription dropped, stopping reader");
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring malformed status event: {}", e),
                        }
                        None
                    }
                    Ok(Frame::Event { name, .. }) => {
                        debug!("Ignoring event: {}", name);
                        None
                    }
                    Ok(Frame::Close) | Ok(Frame::Disconnected) => {
                        info!("Live updates closed by server");
                        break;
                    }
                    Ok(Frame::ConnectError(reason)) => {
                        warn!("Live updates refused: {}", reason);
                        break;
                    }
                    Ok(Frame::Pong) | Ok(Frame::Ignored) => None,
                    Err(e) => {
                        warn!("Skipping malformed frame: {} - {}", e, text.as_str());
                        None
                    }
                };

                if let Some(reply) = reply {
                    if let Err(e) = write.send(Message::text(reply)).await {
                        error!("Failed to answer live update server: {}", e);
                        break;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                if let Err(e) = write.send(Message::Pong(data)).await {
                    error!("Failed to send pong: {}", e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("Live update socket closed by server");
                break;
            }
            Err(e) => {
                error!("Live update socket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    let _ = write.close().await;
}
