use crate::domain::{ProxyCandidate, Result};
use async_trait::async_trait;

/// Port for the managed home-country proxy provider
#[async_trait]
pub trait ProxyProviderPort: Send + Sync {
    /// Request a managed proxy egress located in the given country
    async fn proxy_for_country(&self, country: &str) -> Result<ProxyCandidate>;
}
