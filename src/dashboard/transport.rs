/// Viewer transport abstraction
///
/// A transport is owned by exactly one connection. `push` must not block:
/// implementations enqueue and let a writer task do the I/O, so a broadcast
/// finishes its per-connection work before returning.
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use super::message::ServerMessage;
use crate::errors::TransportError;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Enqueue a frame for this viewer
    fn push(&self, message: Arc<ServerMessage>) -> Result<(), TransportError>;

    /// Close the link. Closing twice is a no-op.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Bounded-queue transport used by the WebSocket handler.
///
/// The handler drains the receiver onto the socket and waits on `closed()`
/// to learn that the server side wants the link torn down.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Arc<ServerMessage>>,
    closed: AtomicBool,
    close_signal: Notify,
}

impl ChannelTransport {
    pub fn new(buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<Arc<ServerMessage>>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        let transport = Arc::new(Self {
            tx,
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        });
        (transport, rx)
    }

    /// Resolves once `close` has been called
    pub async fn closed(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        // notify_one stores a permit, so a close racing this await is not lost
        self.close_signal.notified().await;
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn push(&self, message: Arc<ServerMessage>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close_signal.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}
