use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::ClientError;
use crate::models::WireMessage;

/// How long `close` waits for the writer to flush its Close frame before
/// aborting it.
const CLOSE_DRAIN: Duration = Duration::from_secs(1);

/// Connection lifecycle state, as observed by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Connection tuning knobs.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub connect_timeout: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10) }
    }
}

/// Sending seam between state stores and the live socket.
///
/// Transmission is fire-and-forget: `transmit` never blocks and reports only
/// whether the frame was handed to the connection.
pub trait Outbound {
    /// Queue a frame for transmission. Returns `false` when the frame was
    /// dropped because the connection is not open — the observable degraded
    /// mode, not an error.
    fn transmit(&self, frame: &WireMessage) -> bool;
}

enum Outgoing {
    Frame(WireMessage),
    Shutdown,
}

/// Clonable sending handle for one [`Connection`].
#[derive(Clone)]
pub struct ConnectionSender {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    open: Arc<AtomicBool>,
}

impl Outbound for ConnectionSender {
    fn transmit(&self, frame: &WireMessage) -> bool {
        if !self.open.load(Ordering::SeqCst) {
            debug!("connection not open, dropping outbound {} frame", frame.kind());
            return false;
        }
        self.outgoing.send(Outgoing::Frame(frame.clone())).is_ok()
    }
}

/// One bidirectional, message-oriented link to the server.
///
/// Owned by exactly one view/driver and never shared or pooled. Inbound
/// frames arrive through [`Connection::recv`] in wire order; outbound frames
/// go through the handle returned by [`Connection::outbound`]. Dropping the
/// value stops both socket tasks, so a connection cannot outlive its owner
/// on any exit path. There is no automatic reconnection: once the link
/// drops, this instance stays closed.
pub struct Connection {
    url: Url,
    open: Arc<AtomicBool>,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    incoming: mpsc::UnboundedReceiver<WireMessage>,
    reader_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Dial `url` (ws/wss only) and start the reader and writer tasks.
    pub async fn open(url: &str, config: ConnectConfig) -> Result<Self, ClientError> {
        let parsed = Url::parse(url).map_err(|e| ClientError::InvalidEndpoint {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(ClientError::InvalidEndpoint {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let (stream, _response) = timeout(config.connect_timeout, connect_async(parsed.as_str()))
            .await
            .map_err(|_| ClientError::ConnectTimeout {
                url: parsed.to_string(),
                seconds: config.connect_timeout.as_secs(),
            })?
            .map_err(|e| ClientError::ConnectFailed {
                url: parsed.to_string(),
                message: e.to_string(),
            })?;
        let (mut writer, mut reader) = stream.split();

        let open = Arc::new(AtomicBool::new(true));
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        // ── Writer task: drain the outbound queue onto the socket ─────────────
        let writer_open = Arc::clone(&open);
        let writer_url = parsed.to_string();
        let writer_task = tokio::spawn(async move {
            while let Some(item) = outgoing_rx.recv().await {
                match item {
                    Outgoing::Frame(frame) => {
                        let text = match frame.encode() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("failed to encode outbound frame: {e}");
                                continue;
                            }
                        };
                        if let Err(e) = writer.send(Message::Text(text.into())).await {
                            warn!("websocket send error on {writer_url}: {e}");
                            break;
                        }
                    }
                    Outgoing::Shutdown => {
                        let _ = writer.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            writer_open.store(false, Ordering::SeqCst);
        });

        // ── Reader task: decode inbound frames, dropping anything malformed ───
        let reader_open = Arc::clone(&open);
        let reader_url = parsed.to_string();
        let reader_task = tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match WireMessage::decode(text.as_str()) {
                        Ok(message) => {
                            if incoming_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("dropping malformed frame from {reader_url}: {e}"),
                    },
                    Ok(Message::Binary(payload)) => {
                        debug!("ignoring {}-byte binary frame from {reader_url}", payload.len());
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        warn!("websocket read error on {reader_url}: {e}");
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
        });

        info!("connected to {parsed}");

        Ok(Self {
            url: parsed,
            open,
            outgoing: outgoing_tx,
            incoming: incoming_rx,
            reader_task: Some(reader_task),
            writer_task: Some(writer_task),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn state(&self) -> ConnectionState {
        if self.open.load(Ordering::SeqCst) {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Clonable fire-and-forget sending handle.
    pub fn outbound(&self) -> ConnectionSender {
        ConnectionSender {
            outgoing: self.outgoing.clone(),
            open: Arc::clone(&self.open),
        }
    }

    /// Next decoded inbound frame, in wire order. `None` once the connection
    /// is gone.
    pub async fn recv(&mut self) -> Option<WireMessage> {
        self.incoming.recv().await
    }

    /// Graceful close: flush a Close frame and stop both tasks. Safe to call
    /// in any state and on every exit path; later calls are no-ops.
    pub async fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.outgoing.send(Outgoing::Shutdown);
        if let Some(mut task) = self.writer_task.take() {
            if timeout(CLOSE_DRAIN, &mut task).await.is_err() {
                task.abort();
            }
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        debug!("closed connection to {}", self.url);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        if let Some(task) = self.writer_task.take() {
            task.abort();
        }
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
