use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use super::{TransportError, TransportResult};

/// Registry-local handle of a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side opened the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Snapshot of a peer table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub remote_addr: SocketAddr,
    /// Dialed port for outbound peers, remote source port for inbound ones.
    pub port: u16,
    pub direction: Direction,
    pub connected_at: Instant,
    pub last_seen: Instant,
}

impl PeerInfo {
    pub fn new(id: PeerId, remote_addr: SocketAddr, direction: Direction) -> Self {
        let now = Instant::now();
        Self {
            id,
            remote_addr,
            port: remote_addr.port(),
            direction,
            connected_at: now,
            last_seen: now,
        }
    }
}

/// Bounded table of active peers, generic over the per-peer sending handle.
///
/// Only active peers are stored: removing a peer drops its handle, which
/// closes its outbound queue.
#[derive(Debug)]
pub struct PeerTable<H> {
    capacity: usize,
    next_id: u64,
    entries: HashMap<PeerId, (PeerInfo, H)>,
}

impl<H> PeerTable<H> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Add a peer, failing when the table is at capacity.
    pub fn insert(
        &mut self,
        remote_addr: SocketAddr,
        direction: Direction,
        handle: H,
    ) -> TransportResult<PeerInfo> {
        if self.is_full() {
            return Err(TransportError::TableFull {
                capacity: self.capacity,
            });
        }
        let id = PeerId(self.next_id);
        self.next_id += 1;
        let info = PeerInfo::new(id, remote_addr, direction);
        self.entries.insert(id, (info.clone(), handle));
        Ok(info)
    }

    pub fn remove(&mut self, id: PeerId) -> Option<PeerInfo> {
        self.entries.remove(&id).map(|(info, _)| info)
    }

    pub fn handle(&self, id: PeerId) -> Option<&H> {
        self.entries.get(&id).map(|(_, handle)| handle)
    }

    pub fn handle_mut(&mut self, id: PeerId) -> Option<&mut H> {
        self.entries.get_mut(&id).map(|(_, handle)| handle)
    }

    /// Record activity from a peer. Returns false for unknown peers.
    pub fn touch(&mut self, id: PeerId) -> bool {
        match self.entries.get_mut(&id) {
            Some((info, _)) => {
                info.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = (PeerId, &H)> {
        self.entries.iter().map(|(id, (_, handle))| (*id, handle))
    }

    /// Entries sorted by id, i.e. by connection order.
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<PeerInfo> = self.entries.values().map(|(info, _)| info.clone()).collect();
        peers.sort_by_key(|p| p.id);
        peers
    }
}
