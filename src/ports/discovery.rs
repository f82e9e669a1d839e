use crate::domain::Result;
use async_trait::async_trait;

/// Port for the remote discovery directory
#[async_trait]
pub trait DiscoveryPort: Send + Sync {
    /// One authenticated lookup. `Ok(None)` means the directory answered but
    /// named no egress; transport and parse failures are `Err`.
    async fn discover(&self) -> Result<Option<String>>;
}
