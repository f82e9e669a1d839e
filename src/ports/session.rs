use crate::domain::{Result, SessionRequest};
use async_trait::async_trait;

/// Port for the automation session provider
#[async_trait]
pub trait SessionPort: Send + Sync {
    /// Run the automation task through the egress named in the request,
    /// returning the provider's opaque answer payload
    async fn run_task(&self, request: &SessionRequest) -> Result<String>;
}
