//! # End-to-End Scenarios
//!
//! 1. Empty node startup creates exactly one verified genesis block
//! 2. Two nodes: a proposal commits after the peer's approval, both converge
//! 3. A proposal that does not link to the receiver's chain is rejected
//! 4. A joining node with an empty ledger backfills the full chain
//! 5. A tampered stored block fails verification at its index

#[cfg(test)]
mod tests {
    use std::fs;

    use mc_02_ledger_store::{BlockLog, FaultReason, FileBlockLog, LedgerApi, LedgerError};
    use mc_05_wire_protocol::Message;
    use mc_08_consensus::{ConsensusApi, ProposalOutcome};
    use mc_13_chain_sync::ChainSyncApi;
    use node_runtime::genesis::bootstrap_ledger;
    use shared_types::GENESIS_PREVIOUS_HASH;

    use crate::harness::{chain_hashes, converge, link, next_block, Cluster, RawPeer};

    // =========================================================================
    // SCENARIO 1: GENESIS
    // =========================================================================

    #[tokio::test]
    async fn scenario_empty_node_creates_single_genesis() {
        let cluster = Cluster::new();
        let node = cluster.node().await;

        assert_eq!(node.ledger().height(), 1);
        let genesis = node.ledger().block_by_index(0).unwrap();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(node.ledger().verify_chain().unwrap(), 1);
        assert!(node.config().ledger_path(node.port()).exists());
        node.shutdown();
    }

    // =========================================================================
    // SCENARIO 2: PROPOSE, VOTE, COMMIT
    // =========================================================================

    #[tokio::test]
    async fn scenario_two_nodes_commit_proposal() {
        let cluster = Cluster::new();
        let a = cluster.node().await;
        let b = cluster.node().await;
        link(&a, &b).await;

        let block = next_block(&a, b"chest x-ray");
        let outcome = a.consensus().propose(block.clone()).unwrap();
        // One peer: majority is 2, so the proposer's own vote is not enough.
        assert_eq!(
            outcome,
            ProposalOutcome::Pending {
                approvals: 1,
                needed: 2
            }
        );

        assert!(converge(&[&a, &b], 2).await, "nodes did not reach height 2");
        let at_a = a.ledger().block_by_index(1).unwrap();
        let at_b = b.ledger().block_by_index(1).unwrap();
        assert_eq!(at_a.block_hash, block.block_hash);
        assert_eq!(at_a.block_hash, at_b.block_hash);
        assert!(a.consensus().outstanding().is_none());
        assert_eq!(b.ledger().verify_chain().unwrap(), 2);

        a.shutdown();
        b.shutdown();
    }

    // =========================================================================
    // SCENARIO 3: LINKAGE REJECTION
    // =========================================================================

    #[tokio::test]
    async fn scenario_unlinked_proposal_is_rejected() {
        let cluster = Cluster::new();
        let node = cluster.node().await;
        let mut peer = RawPeer::connect(&node).await;

        let mut block = next_block(&node, b"ecg trace");
        block.previous_hash = "f".repeat(64);
        node.ledger()
            .seal_and_sign(&mut block, node.validator())
            .unwrap();

        peer.send(&Message::ProposeBlock(block).render().unwrap()).await;
        assert_eq!(peer.recv_prefixed("BLOCK_VOTE").await, "BLOCK_VOTE:REJECT");
        assert_eq!(node.ledger().height(), 1);
        node.shutdown();
    }

    // =========================================================================
    // SCENARIO 4: JOIN AND BACKFILL
    // =========================================================================

    #[tokio::test]
    async fn scenario_joining_node_backfills_chain() {
        let cluster = Cluster::new();
        let a = cluster.node().await;
        let b = cluster.node().await;
        link(&a, &b).await;

        for (height, content) in [b"r1".as_slice(), b"r2", b"r3", b"r4"]
            .into_iter()
            .enumerate()
        {
            a.consensus().propose(next_block(&a, content)).unwrap();
            assert!(converge(&[&a, &b], height as u64 + 2).await);
        }
        assert_eq!(a.ledger().height(), 5);

        let mut config = cluster.config();
        config.storage.create_genesis = false;
        config.network.bootstrap_peers = vec![
            format!("127.0.0.1:{}", a.port()),
            format!("127.0.0.1:{}", b.port()),
        ];
        let c = cluster.node_with(config).await;

        assert!(converge(&[&c], 5).await, "joining node did not backfill");
        assert_eq!(chain_hashes(&c), chain_hashes(&a));
        assert_eq!(chain_hashes(&c), chain_hashes(&b));
        assert_eq!(c.ledger().verify_chain().unwrap(), 5);
        assert!(!c.sync().is_syncing());

        a.shutdown();
        b.shutdown();
        c.shutdown();
    }

    // =========================================================================
    // SCENARIO 5: TAMPER DETECTION
    // =========================================================================

    #[tokio::test]
    async fn scenario_tampered_block_fails_verification() {
        let cluster = Cluster::new();
        let node = cluster.node().await;
        for content in [b"a".as_slice(), b"b", b"c"] {
            node.consensus().propose(next_block(&node, content)).unwrap();
        }
        assert_eq!(node.ledger().height(), 4);

        let config = node.config().clone();
        let validator = node.validator();
        let path = config.ledger_path(validator.port());
        let mut blocks = node.ledger().blocks();
        node.shutdown();
        drop(node);

        // Rewrite the file with block 2's payload changed but its hash kept.
        blocks[2].transactions[0].data_pointer = "offchain/records/forged.enc".into();
        fs::remove_file(&path).unwrap();
        let mut log = FileBlockLog::open(&path).unwrap();
        for block in &blocks {
            log.append(block).unwrap();
        }

        let ledger = bootstrap_ledger(&config, validator, cluster.keys()).unwrap();
        assert_eq!(ledger.height(), 4);
        match ledger.verify_chain() {
            Err(LedgerError::Fault(fault)) => {
                assert_eq!(fault.index, 2);
                assert_eq!(fault.reason, FaultReason::FingerprintMismatch);
            }
            other => panic!("expected a fault at block 2, got {other:?}"),
        }
    }
}
