//! Peer runtime integration.
//!
//! Bridges the fixed-rate tick loop with the async peer connection.

use std::sync::Arc;

use tokio::runtime::Runtime;

use crate::config::{PeerRole, SyncConfig};
use crate::outbox::Outbox;
use crate::peer::{accept_peer, connect_peer, PeerEvent, PeerLink, WireLog};

/// Connected peer with its own tokio runtime.
pub struct NetPeer {
    link: PeerLink,
    rt: Runtime,
}

impl NetPeer {
    /// Host or join per `config`, blocking until the connection is up.
    pub fn start(config: &SyncConfig) -> anyhow::Result<Self> {
        let addr = config.socket_addr()?;
        let rt = Runtime::new()?;

        let link = rt.block_on(async {
            let stream = match config.role {
                PeerRole::Host => accept_peer(addr, None).await?,
                PeerRole::Join => connect_peer(addr).await?,
            };
            let wire_log = match config.wire_log.as_deref() {
                Some(path) => match WireLog::open(path).await {
                    Ok(log) => Some(log),
                    Err(e) => {
                        eprintln!("[Peer] Wire log {} unavailable: {}", path, e);
                        None
                    }
                },
                None => None,
            };
            anyhow::Ok(PeerLink::spawn(stream, wire_log))
        })?;

        Ok(Self { link, rt })
    }

    pub fn outbox(&self) -> Arc<Outbox> {
        self.link.outbox()
    }

    /// Everything received since the last poll (non-blocking).
    pub fn poll_events(&mut self) -> Vec<PeerEvent> {
        self.link.drain()
    }

    /// Flush queued output (bounded wait), then stop the connection.
    pub fn close(self) {
        let Self { link, rt } = self;
        rt.block_on(async {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(1), link.finish()).await;
        });
    }

    /// Drop pending output and stop immediately.
    pub fn shutdown(&self) {
        self.link.shutdown();
    }
}
