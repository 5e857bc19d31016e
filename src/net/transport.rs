//! WebSocket pumps between a socket and a `PeerLink`
//!
//! The host accepts through axum, the guest dials with tokio-tungstenite.
//! Either way a writer task drains the link's outbox into the socket and a
//! reader task feeds socket text into the link's inbox.

use axum::extract::ws::{Message as AxumMessage, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WireMessage;
use tracing::{debug, error, info, warn};

use super::channel::{LinkEvent, PeerLink};
use crate::game::SessionError;
use crate::util::rate_limit::PeerRateLimiter;

/// Transport-neutral view of one received WebSocket message
enum Incoming {
    Text(String),
    Binary,
    Control,
    Close,
}

impl From<AxumMessage> for Incoming {
    fn from(msg: AxumMessage) -> Self {
        match msg {
            AxumMessage::Text(text) => Incoming::Text(text),
            AxumMessage::Binary(_) => Incoming::Binary,
            AxumMessage::Ping(_) | AxumMessage::Pong(_) => Incoming::Control,
            AxumMessage::Close(_) => Incoming::Close,
        }
    }
}

impl From<WireMessage> for Incoming {
    fn from(msg: WireMessage) -> Self {
        match msg {
            WireMessage::Text(text) => Incoming::Text(text),
            WireMessage::Binary(_) => Incoming::Binary,
            WireMessage::Ping(_) | WireMessage::Pong(_) | WireMessage::Frame(_) => Incoming::Control,
            WireMessage::Close(_) => Incoming::Close,
        }
    }
}

/// Wrap an accepted axum socket (host side)
pub fn accept(socket: WebSocket) -> PeerLink {
    let (sink, stream) = socket.split();
    spawn_pumps(sink, stream, AxumMessage::Text)
}

/// Dial the host (guest side). Failure is final; nothing retries.
pub async fn dial(url: &str) -> Result<PeerLink, SessionError> {
    let (socket, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| SessionError::ChannelOpen(e.to_string()))?;

    info!(url = %url, "Connected to host");
    let (sink, stream) = socket.split();
    Ok(spawn_pumps(sink, stream, WireMessage::Text))
}

fn spawn_pumps<S, R, M, E>(mut sink: S, mut stream: R, to_wire: fn(String) -> M) -> PeerLink
where
    S: Sink<M> + Unpin + Send + 'static,
    S::Error: std::fmt::Display + Send,
    R: Stream<Item = Result<M, E>> + Unpin + Send + 'static,
    M: Into<Incoming> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<LinkEvent>();

    // Writer: link outbox -> socket
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = sink.send(to_wire(frame)).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader: socket -> link inbox
    tokio::spawn(async move {
        let rate_limiter = PeerRateLimiter::new();

        while let Some(result) = stream.next().await {
            match result.map(Into::into) {
                Ok(Incoming::Text(text)) => {
                    if !rate_limiter.check_frame() {
                        warn!("Rate limited peer frame");
                        continue;
                    }
                    if inbound_tx.send(LinkEvent::Frame(text)).is_err() {
                        debug!("Session dropped its link");
                        break;
                    }
                }
                Ok(Incoming::Binary) => {
                    warn!("Received binary frame, ignoring");
                }
                Ok(Incoming::Control) => {}
                Ok(Incoming::Close) => {
                    info!("Peer initiated close");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    let _ = inbound_tx.send(LinkEvent::Error(e.to_string()));
                    break;
                }
            }
        }
        // Dropping inbound_tx closes the link for the session
    });

    PeerLink::new(outbound_tx, inbound_rx)
}
