//! # Peer Registry Service
//!
//! Owns the peer table and the per-connection tasks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use mc_telemetry::{log_peer_event, PEERS_CONNECTED};

use crate::domain::{
    read_frame, Direction, FrameOutcome, PeerId, PeerInfo, PeerTable, TransportConfig,
    TransportError, TransportResult,
};
use crate::ports::inbound::PeerTransport;
use crate::ports::outbound::LineHandler;

const SUBSYSTEM: &str = "mc-01";

/// Pause after a failed `accept` so a persistent error cannot spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Per-peer sending side stored in the table.
#[derive(Debug)]
struct PeerHandle {
    outbound: mpsc::UnboundedSender<String>,
    reader: Option<AbortHandle>,
}

/// Peer table plus TCP plumbing.
pub struct PeerRegistry {
    config: TransportConfig,
    table: Mutex<PeerTable<PeerHandle>>,
}

impl PeerRegistry {
    pub fn new(config: TransportConfig) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(PeerTable::new(config.max_peers)),
            config,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Bind the listening socket.
    pub async fn bind(addr: &str) -> TransportResult<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Accept connections until the returned task is aborted.
    ///
    /// A connection arriving while the table is full is closed immediately.
    pub fn spawn_accept_loop(
        self: &Arc<Self>,
        listener: TcpListener,
        handler: Arc<dyn LineHandler>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, remote)) => {
                        match registry.register(stream, remote, Direction::Inbound, &handler) {
                            Ok(id) => {
                                log_peer_event!(info, SUBSYSTEM, "[mc-01] Accepted peer", id, remote = %remote);
                            }
                            Err(e) => {
                                warn!("[mc-01] Refused connection from {}: {}", remote, e);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("[mc-01] Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        })
    }

    /// Dial a peer once and register it on success.
    pub async fn connect(
        self: &Arc<Self>,
        host: &str,
        port: u16,
        handler: Arc<dyn LineHandler>,
    ) -> TransportResult<PeerId> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let remote = stream
            .peer_addr()
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let id = self.register(stream, remote, Direction::Outbound, &handler)?;
        log_peer_event!(info, SUBSYSTEM, "[mc-01] Connected to peer", id, remote = %remote);
        Ok(id)
    }

    /// Record activity from a peer.
    pub fn touch(&self, peer: PeerId) {
        self.table.lock().touch(peer);
    }

    /// Drop a peer and close its connection. The line handler is not notified.
    pub fn remove(&self, peer: PeerId) -> Option<PeerInfo> {
        let removed = {
            let mut table = self.table.lock();
            let reader = table.handle_mut(peer).and_then(|h| h.reader.take());
            if let Some(reader) = reader {
                reader.abort();
            }
            let removed = table.remove(peer);
            PEERS_CONNECTED.set(table.len() as f64);
            removed
        };
        if removed.is_some() {
            log_peer_event!(info, SUBSYSTEM, "[mc-01] Removed peer", peer);
        }
        removed
    }

    fn register(
        self: &Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        direction: Direction,
        handler: &Arc<dyn LineHandler>,
    ) -> TransportResult<PeerId> {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("[mc-01] set_nodelay failed for {}: {}", remote, e);
        }
        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();

        let info = {
            let mut table = self.table.lock();
            let info = table.insert(
                remote,
                direction,
                PeerHandle {
                    outbound: tx,
                    reader: None,
                },
            )?;
            PEERS_CONNECTED.set(table.len() as f64);
            info
        };
        let id = info.id;

        tokio::spawn(write_loop(id, write_half, rx));
        let reader = tokio::spawn(Arc::clone(self).read_loop(id, read_half, Arc::clone(handler)));

        if let Some(handle) = self.table.lock().handle_mut(id) {
            handle.reader = Some(reader.abort_handle());
        }
        Ok(id)
    }

    async fn read_loop(
        self: Arc<Self>,
        peer: PeerId,
        read_half: OwnedReadHalf,
        handler: Arc<dyn LineHandler>,
    ) {
        let mut reader = BufReader::new(read_half);
        let max_line = self.config.max_line_bytes;

        loop {
            match read_frame(&mut reader, max_line).await {
                Ok(FrameOutcome::Line(line)) => {
                    self.touch(peer);
                    handler.on_line(peer, line).await;
                }
                Ok(FrameOutcome::Oversized) => {
                    self.touch(peer);
                    warn!("[mc-01] Dropped line over {} bytes from {}", max_line, peer);
                }
                Ok(FrameOutcome::NotUtf8) => {
                    self.touch(peer);
                    warn!("[mc-01] Dropped non-UTF-8 line from {}", peer);
                }
                Ok(FrameOutcome::Eof) => {
                    log_peer_event!(info, SUBSYSTEM, "[mc-01] Peer closed connection", peer);
                    break;
                }
                Err(e) => {
                    log_peer_event!(warn, SUBSYSTEM, "[mc-01] Read failed", peer, error = %e);
                    break;
                }
            }
        }

        self.detach(peer);
        handler.on_disconnect(peer).await;
    }

    /// Remove a peer from inside its own reader task.
    fn detach(&self, peer: PeerId) {
        let mut table = self.table.lock();
        table.remove(peer);
        PEERS_CONNECTED.set(table.len() as f64);
    }
}

async fn write_loop(
    peer: PeerId,
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<String>,
) {
    while let Some(mut line) = queue.recv().await {
        line.push('\n');
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!("[mc-01] Write to {} failed: {}", peer, e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}

impl PeerTransport for PeerRegistry {
    fn broadcast(&self, line: &str) -> usize {
        let table = self.table.lock();
        let delivered = table
            .handles()
            .filter(|(id, handle)| {
                let queued = handle.outbound.send(line.to_owned()).is_ok();
                if !queued {
                    debug!("[mc-01] Skipping closed peer {} in broadcast", id);
                }
                queued
            })
            .count();
        debug!(
            "[mc-01] Broadcast to {}/{} peers: {}",
            delivered,
            table.len(),
            line.split(':').next().unwrap_or_default()
        );
        delivered
    }

    fn send_to(&self, peer: PeerId, line: &str) -> TransportResult<()> {
        let table = self.table.lock();
        let handle = table
            .handle(peer)
            .ok_or(TransportError::UnknownPeer(peer))?;
        handle
            .outbound
            .send(line.to_owned())
            .map_err(|_| TransportError::Disconnected(peer))
    }

    fn peer_count(&self) -> usize {
        self.table.lock().len()
    }

    fn peers(&self) -> Vec<PeerInfo> {
        self.table.lock().snapshot()
    }
}

impl std::fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerRegistry")
            .field("config", &self.config)
            .field("peers", &self.peer_count())
            .finish()
    }
}
