use crate::domain::{GeoObservation, ProxyCandidate, Result};
use async_trait::async_trait;

/// Port for observing which public identity an egress path presents
#[async_trait]
pub trait GeoProbePort: Send + Sync {
    /// Issue one read-only lookup against the IP-info oracle, routed through
    /// the given candidate. Transport or parse failures are errors, never a
    /// silently assumed country.
    async fn observe(&self, via: &ProxyCandidate) -> Result<GeoObservation>;
}
