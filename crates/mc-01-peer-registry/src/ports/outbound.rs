//! Outbound port: where received lines go.

use async_trait::async_trait;

use crate::domain::PeerId;

/// Consumer of complete lines received from peers.
///
/// Calls for one peer are sequential; calls for different peers may overlap.
#[async_trait]
pub trait LineHandler: Send + Sync {
    async fn on_line(&self, peer: PeerId, line: String);

    async fn on_disconnect(&self, peer: PeerId);
}
