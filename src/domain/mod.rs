pub mod candidates;
pub mod errors;
pub mod models;
pub mod service;

pub use candidates::CandidateSource;
pub use errors::*;
pub use models::*;
pub use service::FailoverService;
