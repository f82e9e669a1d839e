use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::domain::{GeoObservation, ProxyCandidate, ResolveError, Result};
use crate::ports::GeoProbePort;

const OBSERVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Egress validator backed by a public IP-info oracle. The lookup is routed
/// through the candidate under test by building a dedicated client per
/// attempt, so one candidate's proxy settings can never bleed into the next.
pub struct IpinfoProbe {
    check_url: String,
}

impl IpinfoProbe {
    pub fn new(check_url: String) -> Self {
        Self { check_url }
    }
}

#[async_trait]
impl GeoProbePort for IpinfoProbe {
    async fn observe(&self, via: &ProxyCandidate) -> Result<GeoObservation> {
        debug!("observing egress of {} against {}", via, self.check_url);

        let proxy = reqwest::Proxy::all(via.as_proxy_url())
            .map_err(|e| ResolveError::Observation(format!("candidate is not usable as a proxy: {}", e)))?;

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(OBSERVE_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::Observation(format!("HTTP client error: {}", e)))?;

        let payload: serde_json::Value = client
            .get(&self.check_url)
            .send()
            .await
            .map_err(|e| ResolveError::Observation(format!("oracle request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ResolveError::Observation(format!("oracle rejected the lookup: {}", e)))?
            .json()
            .await
            .map_err(|e| ResolveError::Observation(format!("oracle payload unreadable: {}", e)))?;

        let country = payload
            .get("country")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ResolveError::Observation("oracle payload carries no country field".into()))?
            .to_lowercase();
        let ip = payload
            .get("ip")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(GeoObservation::new(ip, country, payload))
    }
}
