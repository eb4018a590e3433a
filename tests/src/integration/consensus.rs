//! # Consensus Across Nodes
//!
//! Majority with several voters, duplicate records, tampered proposals,
//! repeated commits and proposals abandoned after rejection.

#[cfg(test)]
mod tests {
    use mc_01_peer_registry::PeerTransport;
    use mc_02_ledger_store::LedgerApi;
    use mc_05_wire_protocol::{Message, Vote};
    use mc_08_consensus::{ConsensusApi, ConsensusError, ProposalOutcome};
    use shared_types::ValidatorId;

    use crate::harness::{
        chain_hashes, converge, link, next_block, next_block_by, wait_until, Cluster, RawPeer,
        CONVERGE_TIMEOUT,
    };

    const OUTSIDE_VALIDATOR: ValidatorId = ValidatorId(7001);

    #[tokio::test]
    async fn test_three_node_mesh_commits() {
        let cluster = Cluster::new();
        let a = cluster.node().await;
        let b = cluster.node().await;
        let c = cluster.node().await;
        link(&a, &b).await;
        link(&a, &c).await;
        link(&b, &c).await;

        let outcome = a.consensus().propose(next_block(&a, b"mri")).unwrap();
        assert_eq!(
            outcome,
            ProposalOutcome::Pending {
                approvals: 1,
                needed: 2
            }
        );
        assert!(converge(&[&a, &b, &c], 2).await);
        assert_eq!(chain_hashes(&a), chain_hashes(&b));
        assert_eq!(chain_hashes(&a), chain_hashes(&c));

        // A different proposer works the same way.
        c.consensus().propose(next_block(&c, b"ct")).unwrap();
        assert!(converge(&[&a, &b, &c], 3).await);
        assert_eq!(a.ledger().block_by_index(2).unwrap().validator, c.validator());

        for node in [&a, &b, &c] {
            node.shutdown();
        }
    }

    #[tokio::test]
    async fn test_duplicate_record_is_refused_everywhere() {
        let cluster = Cluster::new();
        cluster.add_validator(OUTSIDE_VALIDATOR);
        let node = cluster.node().await;

        node.consensus().propose(next_block(&node, b"same")).unwrap();
        assert_eq!(node.ledger().height(), 2);

        // Locally: the proposer refuses to start the round.
        let err = node
            .consensus()
            .propose(next_block(&node, b"same"))
            .unwrap_err();
        assert!(matches!(err, ConsensusError::NotAnExtension(_)));

        // Remotely: a peer's proposal gets a REJECT vote.
        let mut peer = RawPeer::connect(&node).await;
        let block = next_block_by(&node, OUTSIDE_VALIDATOR, b"same");
        peer.send(&Message::ProposeBlock(block).render().unwrap()).await;
        assert_eq!(peer.recv_prefixed("BLOCK_VOTE").await, "BLOCK_VOTE:REJECT");
        assert_eq!(node.ledger().height(), 2);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_tampered_proposal_is_rejected() {
        let cluster = Cluster::new();
        cluster.add_validator(OUTSIDE_VALIDATOR);
        let node = cluster.node().await;
        let mut peer = RawPeer::connect(&node).await;

        let mut block = next_block_by(&node, OUTSIDE_VALIDATOR, b"biopsy");
        block.transactions[0].patient_id = "PAT-9999".into();
        peer.send(&Message::ProposeBlock(block).render().unwrap()).await;
        assert_eq!(peer.recv_prefixed("BLOCK_VOTE").await, "BLOCK_VOTE:REJECT");

        let honest = next_block_by(&node, OUTSIDE_VALIDATOR, b"biopsy");
        peer.send(&Message::ProposeBlock(honest).render().unwrap()).await;
        assert_eq!(peer.recv_prefixed("BLOCK_VOTE").await, "BLOCK_VOTE:APPROVE");

        // Approving does not append; only a commit does.
        assert_eq!(node.ledger().height(), 1);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_repeated_commit_is_idempotent() {
        let cluster = Cluster::new();
        cluster.add_validator(OUTSIDE_VALIDATOR);
        let node = cluster.node().await;
        let mut peer = RawPeer::connect(&node).await;

        let block = next_block_by(&node, OUTSIDE_VALIDATOR, b"discharge note");
        let line = Message::CommitBlock(block.clone()).render().unwrap();
        peer.send(&line).await;
        peer.send(&line).await;
        // Both lines have been handled once the node answers a later request.
        peer.send("GET_HEIGHT").await;
        assert_eq!(peer.recv_prefixed("CHAIN_HEIGHT").await, "CHAIN_HEIGHT:2");

        assert_eq!(node.ledger().height(), 2);
        assert_eq!(node.ledger().block_by_index(1).unwrap(), block);
        assert_eq!(node.ledger().verify_chain().unwrap(), 2);
        node.shutdown();
    }

    #[tokio::test]
    async fn test_rejected_proposal_is_abandoned() {
        let cluster = Cluster::new();
        let node = cluster.node().await;
        let mut peer = RawPeer::connect(&node).await;
        assert!(wait_until(CONVERGE_TIMEOUT, || node.registry().peers().len() == 1).await);

        let block = next_block(&node, b"allergy list");
        node.consensus().propose(block.clone()).unwrap();
        peer.recv_prefixed("PROPOSE_BLOCK").await;

        peer.send(&Message::BlockVote(Vote::Reject).render().unwrap()).await;
        assert!(wait_until(CONVERGE_TIMEOUT, || node.consensus().outstanding().is_none()).await);
        assert_eq!(node.ledger().height(), 1);

        // The caller may propose the same block again.
        node.consensus().propose(block).unwrap();
        peer.recv_prefixed("PROPOSE_BLOCK").await;
        peer.send(&Message::BlockVote(Vote::Approve).render().unwrap()).await;
        assert!(peer
            .recv_prefixed("COMMIT_BLOCK")
            .await
            .starts_with("COMMIT_BLOCK:1|"));
        assert_eq!(node.ledger().height(), 2);
        node.shutdown();
    }
}
