//! Duplex message channel.
//!
//! Each direction is an unbounded tokio channel of JSON text, so neither
//! context ever blocks on a send and no memory is shared between them: the
//! receiving side only ever sees what it can parse.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use super::message::{HostMessage, SandboxMessage};
use crate::core::{StudioError, StudioResult};

/// Sending half of one direction.
pub struct Outbox<M> {
    tx: mpsc::UnboundedSender<String>,
    _msg: PhantomData<fn(M)>,
}

impl<M> Clone for Outbox<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _msg: PhantomData,
        }
    }
}

impl<M: Serialize> Outbox<M> {
    /// Post a record. Fails only when the peer has been disposed.
    pub fn post(&self, msg: &M) -> StudioResult<()> {
        let json = serde_json::to_string(msg)
            .map_err(|e| StudioError::Validation(format!("unserializable message: {e}")))?;
        self.tx.send(json).map_err(|_| StudioError::ChannelClosed)
    }

    /// Whether the receiving context is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of one direction.
pub struct Inbox<M> {
    rx: mpsc::UnboundedReceiver<String>,
    _msg: PhantomData<fn() -> M>,
}

impl<M: DeserializeOwned> Inbox<M> {
    /// Wait for the next well-formed record.
    ///
    /// Malformed records are dropped here so they never reach a dispatcher.
    /// Returns `None` once the sender side is gone.
    pub async fn recv(&mut self) -> Option<M> {
        loop {
            let raw = self.rx.recv().await?;
            if let Some(msg) = decode(&raw) {
                return Some(msg);
            }
        }
    }

    /// Non-blocking variant of [`Inbox::recv`].
    pub fn try_recv(&mut self) -> Option<M> {
        loop {
            let raw = self.rx.try_recv().ok()?;
            if let Some(msg) = decode(&raw) {
                return Some(msg);
            }
        }
    }

    /// Stop accepting records; anything still queued is discarded.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

fn decode<M: DeserializeOwned>(raw: &str) -> Option<M> {
    match serde_json::from_str(raw) {
        Ok(msg) => Some(msg),
        Err(e) => {
            crate::debug!("channel"; "dropping malformed record ({}): {}", e, raw);
            None
        }
    }
}

/// Host side of a channel pair.
pub struct HostEnd {
    pub outbox: Outbox<HostMessage>,
    pub inbox: Inbox<SandboxMessage>,
}

/// Sandbox side of a channel pair.
pub struct SandboxEnd {
    pub outbox: Outbox<SandboxMessage>,
    pub inbox: Inbox<HostMessage>,
}

/// Create a connected host/sandbox channel pair.
pub fn pair() -> (HostEnd, SandboxEnd) {
    let (to_sandbox_tx, to_sandbox_rx) = mpsc::unbounded_channel();
    let (to_host_tx, to_host_rx) = mpsc::unbounded_channel();

    let host = HostEnd {
        outbox: Outbox {
            tx: to_sandbox_tx,
            _msg: PhantomData,
        },
        inbox: Inbox {
            rx: to_host_rx,
            _msg: PhantomData,
        },
    };
    let sandbox = SandboxEnd {
        outbox: Outbox {
            tx: to_host_tx,
            _msg: PhantomData,
        },
        inbox: Inbox {
            rx: to_sandbox_rx,
            _msg: PhantomData,
        },
    };
    (host, sandbox)
}
