use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CandidateOrigin, ProxyCandidate, ResolveError, Result, SessionRequest};
use crate::ports::{ProxyProviderPort, SessionPort};

const DEFAULT_BASE_URL: &str = "https://api.browsercloud.dev/";

/// A browser session is slow by nature; the request-level timeout is the
/// ceiling for the whole delegated task.
const SESSION_TIMEOUT: Duration = Duration::from_secs(300);
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Step budget handed to the remote agent alongside the task.
const MAX_AGENT_STEPS: u32 = 8;

/// Client for the automation-session vendor. Serves two ports: opening a
/// session to run the delegated task, and requesting a managed home-country
/// proxy from the same account.
pub struct AutomationClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl AutomationClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Custom base URL, used to point the client at a mock server in tests.
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| ResolveError::Configuration(format!("HTTP client error: {}", e)))?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = normalised
            .parse()
            .map_err(|e| ResolveError::Configuration(format!("invalid session provider URL '{}': {}", base_url, e)))?;

        Ok(Self { client, base_url, api_key })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ResolveError::Configuration(format!("invalid endpoint path '{}': {}", path, e)))
    }
}

#[derive(Serialize)]
struct RunTaskBody<'a> {
    task: &'a str,
    url: &'a str,
    browser_type: &'a str,
    headless: bool,
    locale: &'a str,
    solve_captchas: bool,
    max_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy: Option<String>,
}

#[derive(Deserialize)]
struct RunTaskResponse {
    answer: String,
}

#[derive(Deserialize)]
struct CountryProxyResponse {
    proxy_url: String,
}

#[async_trait]
impl SessionPort for AutomationClient {
    async fn run_task(&self, request: &SessionRequest) -> Result<String> {
        let endpoint = self.endpoint("agent/run")?;

        let body = RunTaskBody {
            task: &request.task,
            url: &request.target_url,
            browser_type: request.browser_type.as_str(),
            headless: request.headless,
            locale: &request.locale,
            solve_captchas: true,
            max_steps: MAX_AGENT_STEPS,
            proxy: request.proxy.as_ref().map(|p| p.as_proxy_url()),
        };

        info!("opening {} session against {}", request.browser_type, request.target_url);

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .timeout(SESSION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ResolveError::SessionFailure(format!("session request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ResolveError::SessionFailure(format!(
                "session provider answered {}: {}",
                status,
                detail.trim()
            )));
        }

        let parsed: RunTaskResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::SessionFailure(format!("session answer unreadable: {}", e)))?;

        Ok(parsed.answer)
    }
}

#[async_trait]
impl ProxyProviderPort for AutomationClient {
    async fn proxy_for_country(&self, country: &str) -> Result<ProxyCandidate> {
        let endpoint = self.endpoint(&format!("proxies/{}", country))?;

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ResolveError::CandidateUnavailable(format!("proxy provider request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ResolveError::CandidateUnavailable(format!("proxy provider rejected the request: {}", e)))?;

        let parsed: CountryProxyResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::CandidateUnavailable(format!("proxy provider payload unreadable: {}", e)))?;

        ProxyCandidate::from_url(&parsed.proxy_url, CandidateOrigin::HomeCountry)
    }
}
