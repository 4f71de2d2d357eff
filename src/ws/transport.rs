//! Outbound transport capability
//!
//! Commands are fire-and-forget: no acknowledgement, no retry. A full
//! queue drops the command.

use bytes::Bytes;
use tokio::sync::mpsc;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Outbound queue full, command dropped")]
    Saturated,

    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

/// Anything that can carry encoded command bytes to the server
pub trait OutboundTransport {
    fn send(&self, bytes: Bytes) -> Result<(), TransportError>;
}

/// Queue feeding the websocket writer task
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl OutboundTransport for ChannelTransport {
    fn send(&self, bytes: Bytes) -> Result<(), TransportError> {
        self.tx.try_send(bytes).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Saturated,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}
