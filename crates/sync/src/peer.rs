//! Peer connection - reader and writer tasks over one TCP stream
//!
//! The reader parses lines into [`PeerEvent`]s on an unbounded channel that
//! the tick loop drains between ticks. The writer drains the shared
//! [`Outbox`]. Malformed lines are logged and dropped.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::outbox::Outbox;
use crate::protocol::{parse_message, SyncMessage};

/// Something read from the remote peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    Message(SyncMessage),
    /// End of stream or read failure
    Closed,
}

/// Raw wire log appended by a dedicated task
#[derive(Debug, Clone)]
pub struct WireLog {
    tx: mpsc::UnboundedSender<String>,
}

impl WireLog {
    /// Open (append) the log file and spawn its writer task.
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        use tokio::fs::OpenOptions;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if file.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if file.write_all(b"\n").await.is_err() {
                    break;
                }
            }
            let _ = file.flush().await;
        });

        Ok(Self { tx })
    }

    pub fn sent(&self, line: &str) {
        let _ = self.tx.send(format!("> {}", line));
    }

    pub fn received(&self, line: &str) {
        let _ = self.tx.send(format!("< {}", line));
    }
}

/// Read lines until EOF; always finishes with [`PeerEvent::Closed`].
pub async fn read_loop<R>(
    reader: R,
    events: mpsc::UnboundedSender<PeerEvent>,
    wire_log: Option<WireLog>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let result = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e.into()),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(log) = wire_log.as_ref() {
            log.received(trimmed);
        }

        match parse_message(trimmed) {
            Ok(message) => {
                if events.send(PeerEvent::Message(message)).is_err() {
                    break Ok(());
                }
            }
            Err(e) => {
                eprintln!("[Peer] Dropping malformed line {:?}: {}", trimmed, e);
            }
        }
    };
    let _ = events.send(PeerEvent::Closed);
    result
}

/// Write outbox messages until it is closed and drained.
pub async fn write_loop<W>(
    mut writer: W,
    outbox: Arc<Outbox>,
    wire_log: Option<WireLog>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbox.next().await {
        let line = message.encode();
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        if let Some(log) = wire_log.as_ref() {
            log.sent(&line);
        }
    }
    writer.flush().await?;
    Ok(())
}

/// Running reader/writer pair for one connection
pub struct PeerLink {
    outbox: Arc<Outbox>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl PeerLink {
    /// Spawn both tasks on the current runtime.
    pub fn spawn(stream: TcpStream, wire_log: Option<WireLog>) -> Self {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        let outbox = Arc::new(Outbox::new());
        let (tx, events) = mpsc::unbounded_channel();

        let reader = {
            let wire_log = wire_log.clone();
            tokio::spawn(async move {
                if let Err(e) = read_loop(BufReader::new(read_half), tx, wire_log).await {
                    eprintln!("[Peer] Read error: {}", e);
                }
            })
        };
        let writer = {
            let outbox = Arc::clone(&outbox);
            tokio::spawn(async move {
                if let Err(e) = write_loop(write_half, outbox, wire_log).await {
                    eprintln!("[Peer] Write error: {}", e);
                }
            })
        };

        Self {
            outbox,
            events,
            reader,
            writer,
        }
    }

    pub fn outbox(&self) -> Arc<Outbox> {
        Arc::clone(&self.outbox)
    }

    /// Events received since the last drain, in arrival order.
    pub fn drain(&mut self) -> Vec<PeerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait for the next event (or `None` once both sides are gone).
    pub async fn recv(&mut self) -> Option<PeerEvent> {
        self.events.recv().await
    }

    /// Clear pending output and stop both tasks.
    pub fn shutdown(&self) {
        self.outbox.clear();
        self.outbox.close();
        self.reader.abort();
        self.writer.abort();
    }

    /// Let the writer flush what is queued, then stop.
    pub async fn finish(self) {
        self.outbox.close();
        let _ = self.writer.await;
        self.reader.abort();
    }
}

/// Listen on `addr` and accept exactly one peer.
pub async fn accept_peer(
    addr: SocketAddr,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<TcpStream> {
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    println!("[Peer] Waiting for opponent on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let (stream, remote) = listener.accept().await?;
    println!("[Peer] Opponent connected from {}", remote);
    Ok(stream)
}

pub async fn connect_peer(addr: SocketAddr) -> anyhow::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    println!("[Peer] Connected to {}", addr);
    Ok(stream)
}
