pub mod automation;
pub mod discovery;
pub mod geo;

pub use automation::AutomationClient;
pub use discovery::HttpDiscovery;
pub use geo::IpinfoProbe;
