use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::candidates::CandidateSource;
use super::{
    AttemptError, AttemptFailure, ProxyCandidate, ResolutionOutcome, ResolutionRequest, ResolveError, Result, Route,
    SessionRequest,
};
use crate::ports::{GeoProbePort, ProxyProviderPort, SessionPort};

/// Task handed to the automation agent on every session.
const TASK: &str = "Open the page, clear any CAPTCHAs automatically and report a short summary";

/// Drives one resolution end to end: primary home-country attempt first,
/// then the ordered fallback scan gated by egress observation. Attempts are
/// strictly sequential; the candidate order is fixed once computed.
pub struct FailoverService {
    provider: Arc<dyn ProxyProviderPort>,
    session: Arc<dyn SessionPort>,
    geo: Arc<dyn GeoProbePort>,
    source: CandidateSource,
    home_country: String,
}

impl FailoverService {
    pub fn new(
        provider: Arc<dyn ProxyProviderPort>,
        session: Arc<dyn SessionPort>,
        geo: Arc<dyn GeoProbePort>,
        source: CandidateSource,
        home_country: String,
    ) -> Self {
        Self {
            provider,
            session,
            geo,
            source,
            home_country: home_country.to_lowercase(),
        }
    }

    /// Resolve a working egress and run the session through it.
    ///
    /// Only configuration problems and caller cancellation surface as `Err`;
    /// exhaustion and an empty candidate list are structured `Failure`
    /// outcomes.
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Result<ResolutionOutcome> {
        request.validate()?;
        let resolution = Uuid::new_v4();

        if !request.force_router_fallback {
            if let Some(outcome) = self.try_primary(request, resolution).await {
                return Ok(outcome);
            }
        } else {
            info!("resolution {}: router fallback forced, skipping home-country proxy", resolution);
        }

        self.fallback_scan(request, resolution, cancel).await
    }

    /// The primary is trusted by construction: no geo gate. Returns `None`
    /// when the scan should continue with fallback candidates.
    async fn try_primary(&self, request: &ResolutionRequest, resolution: Uuid) -> Option<ResolutionOutcome> {
        let primary = match self.provider.proxy_for_country(&self.home_country).await {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("resolution {}: no {} proxy from provider ({}), going to fallback scan", resolution, self.home_country, e);
                return None;
            }
        };

        info!("resolution {}: attempting session through {}", resolution, primary);
        match self.session.run_task(&self.session_request(request, Some(primary))).await {
            Ok(answer) => Some(ResolutionOutcome::Success {
                route: Route::HomeCountryDirect,
                candidate: None,
                result: answer,
            }),
            Err(e) => {
                warn!("resolution {}: home-country session failed ({}), going to fallback scan", resolution, e);
                None
            }
        }
    }

    async fn fallback_scan(
        &self,
        request: &ResolutionRequest,
        resolution: Uuid,
        cancel: &CancellationToken,
    ) -> Result<ResolutionOutcome> {
        let candidates = self.source.fallback_candidates().await;
        if candidates.is_empty() {
            return Ok(ResolutionOutcome::Failure {
                route: Route::NoCandidates,
                error: "no fallback egress configured: set a proxy URL, a router hostname or a discovery endpoint"
                    .into(),
                attempts: Vec::new(),
            });
        }

        let mut attempts: Vec<AttemptFailure> = Vec::new();

        for candidate in candidates {
            if cancel.is_cancelled() {
                info!("resolution {}: cancelled before trying {}", resolution, candidate);
                return Err(ResolveError::Cancelled);
            }

            if !request.skip_geo_check {
                if let Some(rejection) = self.geo_gate(&candidate, resolution).await {
                    attempts.push(AttemptFailure { candidate, error: rejection });
                    continue;
                }
            }

            info!("resolution {}: attempting session through {}", resolution, candidate);
            match self
                .session
                .run_task(&self.session_request(request, Some(candidate.clone())))
                .await
            {
                Ok(answer) => {
                    return Ok(ResolutionOutcome::Success {
                        route: Route::RouterFallback,
                        candidate: Some(candidate),
                        result: answer,
                    });
                }
                Err(e) => {
                    warn!("resolution {}: session through {} failed: {}", resolution, candidate, e);
                    attempts.push(AttemptFailure {
                        candidate,
                        error: AttemptError::Session { message: e.to_string() },
                    });
                }
            }
        }

        let error = ResolveError::AllCandidatesExhausted(attempts.len()).to_string();
        Ok(ResolutionOutcome::Failure {
            route: Route::AllFailed,
            error,
            attempts,
        })
    }

    /// Rejects only on a successful observation that still points at the
    /// home country. A failed observation means "unknown" and the session
    /// attempt proceeds; do not tighten this to reject-on-unknown.
    async fn geo_gate(&self, candidate: &ProxyCandidate, resolution: Uuid) -> Option<AttemptError> {
        match self.geo.observe(candidate).await {
            Ok(observation) => {
                if observation.country.eq_ignore_ascii_case(&self.home_country) {
                    info!(
                        "resolution {}: {} egresses as {} in {}, skipping",
                        resolution, candidate, observation.ip, observation.country
                    );
                    Some(AttemptError::GeoRejected {
                        ip: observation.ip,
                        country: observation.country,
                    })
                } else {
                    info!(
                        "resolution {}: {} egresses as {} in {}",
                        resolution, candidate, observation.ip, observation.country
                    );
                    None
                }
            }
            Err(e) => {
                warn!("resolution {}: egress check through {} failed ({}), proceeding anyway", resolution, candidate, e);
                None
            }
        }
    }

    fn session_request(&self, request: &ResolutionRequest, proxy: Option<ProxyCandidate>) -> SessionRequest {
        SessionRequest {
            task: TASK.to_string(),
            target_url: request.target_url.clone(),
            browser_type: request.browser_type,
            headless: request.headless,
            locale: request.locale.clone(),
            proxy,
        }
    }
}
