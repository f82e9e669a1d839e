use std::sync::Arc;

use log::warn;
use tracing::debug;

use super::{CandidateOrigin, ProxyCandidate, DEFAULT_SOCKS_PORT};
use crate::ports::DiscoveryPort;

/// Produces the ordered fallback candidate sequence for one resolution:
/// explicit proxy URL, then router hostname, then one discovery lookup.
/// The sequence is rebuilt on every call and never cached.
pub struct CandidateSource {
    explicit_url: Option<String>,
    router_hostname: Option<String>,
    discovery: Option<Arc<dyn DiscoveryPort>>,
}

impl CandidateSource {
    pub fn new(
        explicit_url: Option<String>,
        router_hostname: Option<String>,
        discovery: Option<Arc<dyn DiscoveryPort>>,
    ) -> Self {
        Self {
            explicit_url: explicit_url.filter(|s| !s.trim().is_empty()),
            router_hostname: router_hostname.filter(|s| !s.trim().is_empty()),
            discovery,
        }
    }

    pub async fn fallback_candidates(&self) -> Vec<ProxyCandidate> {
        let mut candidates = Vec::new();

        if let Some(raw) = &self.explicit_url {
            match ProxyCandidate::from_url(raw, CandidateOrigin::ExplicitUrl) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!("ignoring configured proxy URL: {}", e),
            }
        }

        if let Some(hostname) = &self.router_hostname {
            candidates.push(Self::router_candidate(hostname.trim()).await);
        }

        if let Some(discovery) = &self.discovery {
            match discovery.discover().await {
                Ok(Some(address)) => match ProxyCandidate::from_url(&address, CandidateOrigin::Discovered) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(e) => warn!("ignoring discovered egress address: {}", e),
                },
                Ok(None) => debug!("discovery directory named no egress"),
                Err(e) => warn!("discovery contributed no candidate: {}", e),
            }
        }

        candidates
    }

    /// A router hostname carrying a scheme is taken as-is. A bare hostname is
    /// DNS-resolved and wrapped as the default SOCKS candidate; when
    /// resolution fails the raw hostname is kept anyway, since a host-based
    /// egress may deliberately not resolve from this vantage point.
    async fn router_candidate(hostname: &str) -> ProxyCandidate {
        if hostname.contains("://") {
            if let Ok(candidate) = ProxyCandidate::from_url(hostname, CandidateOrigin::RouterHostname) {
                return candidate;
            }
            warn!("router hostname {} has a scheme but did not parse, treating as bare host", hostname);
        }

        match tokio::net::lookup_host((hostname, DEFAULT_SOCKS_PORT)).await {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => ProxyCandidate::socks_default(&addr.ip().to_string(), CandidateOrigin::RouterHostname),
                None => ProxyCandidate::socks_default(hostname, CandidateOrigin::RouterHostname),
            },
            Err(e) => {
                debug!("router hostname {} did not resolve ({}), keeping raw host", hostname, e);
                ProxyCandidate::socks_default(hostname, CandidateOrigin::RouterHostname)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResolveError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticDiscovery {
        response: Result<Option<String>>,
        calls: AtomicUsize,
    }

    impl StaticDiscovery {
        fn new(response: Result<Option<String>>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DiscoveryPort for StaticDiscovery {
        async fn discover(&self) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn candidates_come_in_precedence_order() {
        let discovery = StaticDiscovery::new(Ok(Some("http://203.0.113.9:3128".into())));
        let source = CandidateSource::new(
            Some("socks5://203.0.113.4:1080".into()),
            Some("socks5://gateway.lan:1080".into()),
            Some(discovery.clone()),
        );

        let candidates = source.fallback_candidates().await;

        let origins: Vec<_> = candidates.iter().map(|c| c.origin).collect();
        assert_eq!(
            origins,
            vec![
                CandidateOrigin::ExplicitUrl,
                CandidateOrigin::RouterHostname,
                CandidateOrigin::Discovered,
            ]
        );
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn router_hostname_with_scheme_is_used_as_is() {
        let source = CandidateSource::new(None, Some("http://gateway.lan:8080".into()), None);

        let candidates = source.fallback_candidates().await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].scheme, "http");
        assert_eq!(candidates[0].host, "gateway.lan");
        assert_eq!(candidates[0].port, Some(8080));
    }

    #[tokio::test]
    async fn bare_address_becomes_default_socks_candidate() {
        let source = CandidateSource::new(None, Some("192.0.2.10".into()), None);

        let candidates = source.fallback_candidates().await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_proxy_url(), "socks5://192.0.2.10:1080");
    }

    #[tokio::test]
    async fn unresolvable_hostname_is_kept_as_raw_host() {
        // .invalid never resolves, so the raw-host fallback path is taken
        let source = CandidateSource::new(None, Some("router.invalid".into()), None);

        let candidates = source.fallback_candidates().await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_proxy_url(), "socks5://router.invalid:1080");
    }

    #[tokio::test]
    async fn discovery_failure_contributes_nothing() {
        let discovery = StaticDiscovery::new(Err(ResolveError::Discovery("boom".into())));
        let source = CandidateSource::new(None, None, Some(discovery));

        assert!(source.fallback_candidates().await.is_empty());
    }

    #[tokio::test]
    async fn discovery_empty_answer_contributes_nothing() {
        let discovery = StaticDiscovery::new(Ok(None));
        let source = CandidateSource::new(None, None, Some(discovery));

        assert!(source.fallback_candidates().await.is_empty());
    }

    #[tokio::test]
    async fn unparseable_explicit_url_is_skipped() {
        let source = CandidateSource::new(Some("not a url".into()), None, None);

        assert!(source.fallback_candidates().await.is_empty());
    }

    #[tokio::test]
    async fn blank_settings_produce_no_candidates() {
        let source = CandidateSource::new(Some("  ".into()), Some("".into()), None);

        assert!(source.fallback_candidates().await.is_empty());
    }
}
