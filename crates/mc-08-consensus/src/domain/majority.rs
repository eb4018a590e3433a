/// Approvals needed to commit with `peer_count` connected peers.
///
/// The proposer counts itself, so the network size is `peer_count + 1`.
pub fn majority(peer_count: usize) -> usize {
    (peer_count + 1) / 2 + 1
}
