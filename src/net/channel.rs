//! Peer link: the bidirectional text channel a session talks through
//!
//! The link only moves encoded frames. Transports (WebSocket pumps, the
//! in-memory pair) feed it; the session encodes and decodes.

use tokio::sync::mpsc;

/// Something arriving from the other peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// One encoded message
    Frame(String),
    /// Transport failure; the link is unusable afterwards
    Error(String),
}

/// Link errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Peer link closed")]
    Closed,
}

/// One end of a peer connection
#[derive(Debug)]
pub struct PeerLink {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<LinkEvent>,
}

impl PeerLink {
    pub fn new(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<LinkEvent>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Two linked ends with no transport in between
    pub fn pair() -> (PeerLink, PeerLink) {
        let (a_out, a_out_rx) = mpsc::unbounded_channel::<String>();
        let (b_out, b_out_rx) = mpsc::unbounded_channel::<String>();
        let (a_in_tx, a_in) = mpsc::unbounded_channel();
        let (b_in_tx, b_in) = mpsc::unbounded_channel();

        tokio::spawn(forward(a_out_rx, b_in_tx));
        tokio::spawn(forward(b_out_rx, a_in_tx));

        (PeerLink::new(a_out, a_in), PeerLink::new(b_out, b_in))
    }

    /// Fire-and-forget send; fails only once the other side is gone
    pub fn send(&self, frame: String) -> Result<(), ChannelError> {
        self.outbound.send(frame).map_err(|_| ChannelError::Closed)
    }

    /// Next event, `None` once the link is closed
    pub async fn recv(&mut self) -> Option<LinkEvent> {
        self.inbound.recv().await
    }

    /// Next event if one is already queued, without waiting (drains a link in tests)
    pub fn try_recv(&mut self) -> Option<LinkEvent> {
        self.inbound.try_recv().ok()
    }
}

/// Move frames from one end's outbox to the other end's inbox
async fn forward(
    mut from: mpsc::UnboundedReceiver<String>,
    to: mpsc::UnboundedSender<LinkEvent>,
) {
    loop {
        tokio::select! {
            frame = from.recv() => match frame {
                Some(frame) => {
                    if to.send(LinkEvent::Frame(frame)).is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = to.closed() => break,
        }
    }
}
