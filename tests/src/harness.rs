//! # Cluster Harness
//!
//! Starts nodes on ephemeral loopback ports. All nodes of a cluster share one
//! in-memory key store, standing in for public keys copied between machines.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mc_01_peer_registry::PeerTransport;
use mc_02_ledger_store::LedgerApi;
use node_runtime::{NodeConfig, NodeRuntime};
use shared_crypto::{content_fingerprint, AuthorityKeys, InMemoryKeyStore};
use shared_types::{Block, Transaction, ValidatorId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

/// How long to wait for a cluster to converge.
pub const CONVERGE_TIMEOUT: Duration = Duration::from_secs(10);

/// A set of nodes sharing keys and a scratch directory.
pub struct Cluster {
    keys: Arc<InMemoryKeyStore>,
    dir: tempfile::TempDir,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(InMemoryKeyStore::new()),
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn keys(&self) -> Arc<dyn AuthorityKeys> {
        self.keys.clone()
    }

    /// Register a validator that is not a node, e.g. a raw test peer.
    pub fn add_validator(&self, validator: ValidatorId) {
        self.keys.add_validator(validator);
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Default configuration pointing at this cluster's scratch directory.
    pub fn config(&self) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.storage.data_dir = self.data_dir();
        config.records.offchain_dir = self.dir.path().join("records");
        config
    }

    /// Start a node with genesis on an ephemeral port.
    pub async fn node(&self) -> NodeRuntime {
        self.node_with(self.config()).await
    }

    /// Start a node with `config`; the port is always ephemeral.
    pub async fn node_with(&self, config: NodeConfig) -> NodeRuntime {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        self.keys.add_validator(ValidatorId(port));
        NodeRuntime::start_with_listener(config, listener, self.keys())
            .await
            .expect("node start")
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Connect `a` to `b` and wait until both see the link.
pub async fn link(a: &NodeRuntime, b: &NodeRuntime) {
    let before_a = a.registry().peer_count();
    let before_b = b.registry().peer_count();
    a.connect("127.0.0.1", b.port()).await.expect("connect");
    assert!(
        wait_until(CONVERGE_TIMEOUT, || {
            a.registry().peer_count() > before_a && b.registry().peer_count() > before_b
        })
        .await,
        "link between {} and {} not established",
        a.port(),
        b.port()
    );
}

/// Wait until every node reaches `height`.
pub async fn converge(nodes: &[&NodeRuntime], height: u64) -> bool {
    wait_until(CONVERGE_TIMEOUT, || {
        nodes.iter().all(|n| n.ledger().height() == height)
    })
    .await
}

/// A record transaction for `content`.
pub fn record(content: &[u8], pointer: &str) -> Transaction {
    Transaction::new("PAT-0001", "DR-0042", content_fingerprint(content), pointer, 1_704_100_000)
}

/// Next block on `node`'s chain holding one record, signed by `node`.
pub fn next_block(node: &NodeRuntime, content: &[u8]) -> Block {
    next_block_by(node, node.validator(), content)
}

/// Next block on `node`'s chain holding one record, signed by `validator`.
pub fn next_block_by(node: &NodeRuntime, validator: ValidatorId, content: &[u8]) -> Block {
    let ledger = node.ledger();
    let last = ledger.last_block().expect("chain has genesis");
    let mut block = Block::new(ledger.height(), last.timestamp + 60, last.block_hash, validator);
    block
        .add_transaction(record(content, "offchain/records/test.enc"))
        .expect("one transaction fits");
    ledger
        .seal_and_sign(&mut block, validator)
        .expect("validator key present");
    block
}

/// Block hashes of a node's chain, in order.
pub fn chain_hashes(node: &NodeRuntime) -> Vec<String> {
    node.ledger()
        .blocks()
        .into_iter()
        .map(|b| b.block_hash)
        .collect()
}

/// A bare TCP connection speaking the line protocol.
pub struct RawPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RawPeer {
    pub async fn connect(node: &NodeRuntime) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", node.port()))
            .await
            .expect("connect raw peer");
        let (read, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write line");
    }

    /// Next line, without its terminator.
    pub async fn recv(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(CONVERGE_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("line within timeout")
            .expect("read line");
        line.trim_end().to_string()
    }

    /// Next line starting with `prefix`, skipping unrelated traffic.
    pub async fn recv_prefixed(&mut self, prefix: &str) -> String {
        loop {
            let line = self.recv().await;
            if line.starts_with(prefix) {
                return line;
            }
        }
    }
}
