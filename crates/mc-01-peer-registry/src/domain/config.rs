/// Maximum simultaneously connected peers.
pub const DEFAULT_MAX_PEERS: usize = 50;

/// Maximum accepted line length in bytes, excluding the newline.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8192;

/// Transport limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub max_peers: usize,
    pub max_line_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_peers: DEFAULT_MAX_PEERS,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}
