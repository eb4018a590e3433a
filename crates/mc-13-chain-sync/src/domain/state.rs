//! Sync session state and the outcomes of each protocol step.

use std::fmt;

/// One backfill session against a single peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSession<P> {
    pub peer: P,
    /// Height the peer reported.
    pub target: u64,
}

/// `Idle → Syncing → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState<P> {
    #[default]
    Idle,
    Syncing(SyncSession<P>),
}

impl<P: Copy + PartialEq> SyncState<P> {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncState::Syncing(_))
    }

    pub fn session(&self) -> Option<SyncSession<P>> {
        match self {
            SyncState::Idle => None,
            SyncState::Syncing(s) => Some(*s),
        }
    }

    /// True when `peer` feeds the running session.
    pub fn is_sync_peer(&self, peer: P) -> bool {
        matches!(self, SyncState::Syncing(s) if s.peer == peer)
    }

    pub fn reset(&mut self) -> Option<SyncSession<P>> {
        let previous = self.session();
        *self = SyncState::Idle;
        previous
    }
}

/// Reaction to a peer's `CHAIN_HEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightOutcome {
    /// Session started; block `index` was requested.
    Requested { index: u64 },
    /// Peer is not ahead.
    UpToDate,
    /// Another session is running.
    AlreadySyncing,
    /// The peer went away before the first request could be sent.
    PeerUnreachable,
}

/// Why a `SYNC_BLOCK` was discarded without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotSyncing,
    NotSyncPeer,
    OutOfOrder { expected: u64, found: u64 },
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotSyncing => write!(f, "no sync in progress"),
            IgnoreReason::NotSyncPeer => write!(f, "sender is not the sync peer"),
            IgnoreReason::OutOfOrder { expected, found } => {
                write!(f, "block {found} out of order (expected {expected})")
            }
        }
    }
}

/// Reaction to a `SYNC_BLOCK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncBlockOutcome {
    Ignored(IgnoreReason),
    /// Block appended and the next one requested.
    Appended { index: u64, next: u64 },
    /// Block appended and the target height reached.
    Completed { height: u64 },
    /// The block did not extend the chain; the session is over.
    Aborted { index: u64, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_peer_matching() {
        let mut state: SyncState<u32> = SyncState::Idle;
        assert!(!state.is_sync_peer(1));

        state = SyncState::Syncing(SyncSession { peer: 1, target: 5 });
        assert!(state.is_syncing());
        assert!(state.is_sync_peer(1));
        assert!(!state.is_sync_peer(2));

        assert_eq!(state.reset(), Some(SyncSession { peer: 1, target: 5 }));
        assert!(!state.is_syncing());
        assert_eq!(state.reset(), None);
    }
}
