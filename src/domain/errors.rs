use std::fmt;

#[derive(Debug, Clone)]
pub enum ResolveError {
    Configuration(String),
    CandidateUnavailable(String),
    SessionFailure(String),
    Observation(String),
    Discovery(String),
    AllCandidatesExhausted(usize),
    Cancelled,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ResolveError::CandidateUnavailable(msg) => write!(f, "Candidate unavailable: {}", msg),
            ResolveError::SessionFailure(msg) => write!(f, "Session failed: {}", msg),
            ResolveError::Observation(msg) => write!(f, "Egress observation failed: {}", msg),
            ResolveError::Discovery(msg) => write!(f, "Discovery lookup failed: {}", msg),
            ResolveError::AllCandidatesExhausted(count) => {
                write!(f, "All {} fallback candidates exhausted", count)
            }
            ResolveError::Cancelled => write!(f, "Resolution cancelled by caller"),
        }
    }
}

impl std::error::Error for ResolveError {}

pub type Result<T> = std::result::Result<T, ResolveError>;
