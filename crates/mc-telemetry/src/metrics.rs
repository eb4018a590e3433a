//! Prometheus metrics for MedChain subsystems.
//!
//! All metrics follow the naming convention: `mc_<subsystem>_<metric>_<unit>`
//!
//! Metrics are process-wide. Several nodes running in one process (as in the
//! integration tests) share the same counters.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::fmt;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LEDGER METRICS (Subsystem 2)
    // =========================================================================

    /// Total blocks appended to the ledger
    pub static ref BLOCKS_APPENDED: Counter = Counter::new(
        "mc_ledger_blocks_appended_total",
        "Total number of blocks appended to the ledger file"
    ).expect("metric creation failed");

    /// Current chain height
    pub static ref CHAIN_HEIGHT: Gauge = Gauge::new(
        "mc_ledger_chain_height",
        "Number of blocks in the local chain"
    ).expect("metric creation failed");

    /// Full chain verification duration
    pub static ref BLOCK_VERIFICATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "mc_ledger_verify_chain_duration_seconds",
            "Time spent verifying the whole chain"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // CONSENSUS METRICS (Subsystem 8)
    // =========================================================================

    /// Proposals broadcast by this node
    pub static ref PROPOSALS_SENT: Counter = Counter::new(
        "mc_consensus_proposals_sent_total",
        "Total number of blocks proposed by this node"
    ).expect("metric creation failed");

    /// Votes received on local proposals
    pub static ref VOTES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("mc_consensus_votes_received_total", "Votes received on local proposals"),
        &["vote"]  // vote: approve/reject
    ).expect("metric creation failed");

    /// Votes cast on peer proposals
    pub static ref VOTES_CAST: CounterVec = CounterVec::new(
        Opts::new("mc_consensus_votes_cast_total", "Votes cast on peer proposals"),
        &["vote"]
    ).expect("metric creation failed");

    /// Commits applied (local majority or peer COMMIT_BLOCK)
    pub static ref COMMITS_APPLIED: Counter = Counter::new(
        "mc_consensus_commits_applied_total",
        "Total number of committed blocks applied"
    ).expect("metric creation failed");

    /// Commits ignored because the index already existed
    pub static ref DUPLICATE_COMMITS: Counter = Counter::new(
        "mc_consensus_duplicate_commits_total",
        "Commits ignored because the block index already existed"
    ).expect("metric creation failed");

    // =========================================================================
    // SYNC METRICS (Subsystem 13)
    // =========================================================================

    /// Blocks accepted during backfill
    pub static ref SYNC_BLOCKS_ACCEPTED: Counter = Counter::new(
        "mc_sync_blocks_accepted_total",
        "Blocks appended during chain sync"
    ).expect("metric creation failed");

    /// Sync sessions aborted on a linkage mismatch
    pub static ref SYNC_ABORTS: Counter = Counter::new(
        "mc_sync_aborts_total",
        "Sync sessions aborted"
    ).expect("metric creation failed");

    // =========================================================================
    // PEER METRICS (Subsystem 1)
    // =========================================================================

    /// Connected peers
    pub static ref PEERS_CONNECTED: Gauge = Gauge::new(
        "mc_peers_connected",
        "Number of currently connected peers"
    ).expect("metric creation failed");

    /// Inbound lines that did not parse as a protocol message
    pub static ref MALFORMED_MESSAGES: Counter = Counter::new(
        "mc_protocol_malformed_messages_total",
        "Inbound lines discarded as malformed"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Ledger
        Box::new(BLOCKS_APPENDED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(BLOCK_VERIFICATION_DURATION.clone()),
        // Consensus
        Box::new(PROPOSALS_SENT.clone()),
        Box::new(VOTES_RECEIVED.clone()),
        Box::new(VOTES_CAST.clone()),
        Box::new(COMMITS_APPLIED.clone()),
        Box::new(DUPLICATE_COMMITS.clone()),
        // Sync
        Box::new(SYNC_BLOCKS_ACCEPTED.clone()),
        Box::new(SYNC_ABORTS.clone()),
        // Peers
        Box::new(PEERS_CONNECTED.clone()),
        Box::new(MALFORMED_MESSAGES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Point-in-time copy of the counters, for the `STATS` command.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub blocks_appended: f64,
    pub chain_height: f64,
    pub proposals_sent: f64,
    pub approvals_received: f64,
    pub rejections_received: f64,
    pub commits_applied: f64,
    pub duplicate_commits: f64,
    pub sync_blocks_accepted: f64,
    pub sync_aborts: f64,
    pub peers_connected: f64,
    pub malformed_messages: f64,
}

impl MetricsSnapshot {
    /// Read the current values.
    pub fn capture() -> Self {
        Self {
            blocks_appended: BLOCKS_APPENDED.get(),
            chain_height: CHAIN_HEIGHT.get(),
            proposals_sent: PROPOSALS_SENT.get(),
            approvals_received: VOTES_RECEIVED.with_label_values(&["approve"]).get(),
            rejections_received: VOTES_RECEIVED.with_label_values(&["reject"]).get(),
            commits_applied: COMMITS_APPLIED.get(),
            duplicate_commits: DUPLICATE_COMMITS.get(),
            sync_blocks_accepted: SYNC_BLOCKS_ACCEPTED.get(),
            sync_aborts: SYNC_ABORTS.get(),
            peers_connected: PEERS_CONNECTED.get(),
            malformed_messages: MALFORMED_MESSAGES.get(),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chain height         {}", self.chain_height)?;
        writeln!(f, "blocks appended      {}", self.blocks_appended)?;
        writeln!(f, "proposals sent       {}", self.proposals_sent)?;
        writeln!(
            f,
            "votes received       {} approve / {} reject",
            self.approvals_received, self.rejections_received
        )?;
        writeln!(f, "commits applied      {}", self.commits_applied)?;
        writeln!(f, "duplicate commits    {}", self.duplicate_commits)?;
        writeln!(f, "sync blocks accepted {}", self.sync_blocks_accepted)?;
        writeln!(f, "sync aborts          {}", self.sync_aborts)?;
        writeln!(f, "peers connected      {}", self.peers_connected)?;
        write!(f, "malformed messages   {}", self.malformed_messages)
    }
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
