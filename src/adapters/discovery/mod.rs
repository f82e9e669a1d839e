use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::domain::{ResolveError, Result};
use crate::ports::DiscoveryPort;

/// Bounded so a slow directory can never stall the fallback scan.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(8);

/// Client for the remote discovery directory. One authenticated lookup per
/// resolution; the response may name the egress under `router_address` or
/// `proxy_url`.
pub struct HttpDiscovery {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpDiscovery {
    pub fn new(endpoint: String, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DISCOVERY_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::Discovery(format!("HTTP client error: {}", e)))?;

        Ok(Self { client, endpoint, token })
    }
}

#[async_trait]
impl DiscoveryPort for HttpDiscovery {
    async fn discover(&self) -> Result<Option<String>> {
        debug!("querying discovery directory at {}", self.endpoint);

        let payload: serde_json::Value = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| ResolveError::Discovery(format!("directory request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ResolveError::Discovery(format!("directory rejected the lookup: {}", e)))?
            .json()
            .await
            .map_err(|e| ResolveError::Discovery(format!("directory payload unreadable: {}", e)))?;

        let address = payload
            .get("router_address")
            .or_else(|| payload.get("proxy_url"))
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(address)
    }
}
