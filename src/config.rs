use std::env;

use serde::Serialize;

use crate::domain::{BrowserType, ResolutionRequest, ResolveError, Result};

pub const DEFAULT_TARGET_URL: &str = "https://example.com.br";
pub const DEFAULT_GEO_CHECK_URL: &str = "https://ipinfo.io/json";

/// Template value shipped in deployment examples; treated the same as an
/// unset key.
const PLACEHOLDER_API_KEY: &str = "changeme";

/// Environment-sourced settings. Read once at startup; CLI flags override
/// the request-shaped fields per invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_url: Option<String>,
    pub target_url: String,
    pub browser_type: String,
    pub headless: bool,
    pub locale: String,
    pub home_country: String,
    pub proxy_url: Option<String>,
    pub router_hostname: Option<String>,
    pub discovery_url: Option<String>,
    pub discovery_token: Option<String>,
    pub geo_check_url: String,
    pub force_router_fallback: bool,
    pub skip_geo_check: bool,
}

/// Per-invocation overrides from the CLI; `None` keeps the environment
/// default.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub target_url: Option<String>,
    pub headless: Option<bool>,
    pub browser_type: Option<String>,
    pub locale: Option<String>,
    pub router_fallback: Option<bool>,
    pub skip_geo_check: Option<bool>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("AUTOMATION_API_KEY").unwrap_or_default().trim().to_string(),
            api_url: env_opt("AUTOMATION_API_URL"),
            target_url: env_opt("TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            browser_type: env_opt("BROWSER_TYPE").unwrap_or_else(|| "firefox".to_string()),
            headless: parse_bool(env_opt("HEADLESS").as_deref(), false),
            locale: env_opt("LOCALE").unwrap_or_else(|| "pt-BR".to_string()),
            home_country: env_opt("HOME_COUNTRY").unwrap_or_else(|| "br".to_string()),
            proxy_url: env_opt("PROXY_URL"),
            router_hostname: env_opt("ROUTER_HOSTNAME"),
            discovery_url: env_opt("DISCOVERY_API_URL"),
            discovery_token: env_opt("DISCOVERY_API_TOKEN"),
            geo_check_url: env_opt("GEO_CHECK_URL").unwrap_or_else(|| DEFAULT_GEO_CHECK_URL.to_string()),
            force_router_fallback: parse_bool(env_opt("FORCE_ROUTER_FALLBACK").as_deref(), false),
            skip_geo_check: parse_bool(env_opt("SKIP_GEO_CHECK").as_deref(), false),
        }
    }

    /// The one mandatory credential, checked before anything else runs.
    pub fn require_api_key(&self) -> Result<&str> {
        if self.api_key.is_empty() || self.api_key == PLACEHOLDER_API_KEY {
            return Err(ResolveError::Configuration(
                "AUTOMATION_API_KEY is not set in the environment".into(),
            ));
        }
        Ok(&self.api_key)
    }

    /// Merge CLI overrides over the environment defaults into a validated
    /// resolution request.
    pub fn request(&self, overrides: &RequestOverrides) -> Result<ResolutionRequest> {
        let browser_raw = overrides.browser_type.as_ref().unwrap_or(&self.browser_type);
        let browser_type: BrowserType = browser_raw.parse()?;

        let request = ResolutionRequest {
            target_url: overrides.target_url.clone().unwrap_or_else(|| self.target_url.clone()),
            browser_type,
            headless: overrides.headless.unwrap_or(self.headless),
            locale: overrides.locale.clone().unwrap_or_else(|| self.locale.clone()),
            skip_geo_check: overrides.skip_geo_check.unwrap_or(self.skip_geo_check),
            force_router_fallback: overrides.router_fallback.unwrap_or(self.force_router_fallback),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            server: "proxypick",
            version: env!("PROXYPICK_VERSION"),
            api_key_set: self.require_api_key().is_ok(),
            target_url: self.target_url.clone(),
            browser_type: self.browser_type.clone(),
            headless: self.headless,
            locale: self.locale.clone(),
            home_country: self.home_country.clone(),
            proxy_url_set: self.proxy_url.is_some(),
            router_hostname: self.router_hostname.clone().unwrap_or_default(),
            discovery_url_set: self.discovery_url.is_some(),
            discovery_token_set: self.discovery_token.is_some(),
            geo_check_url: self.geo_check_url.clone(),
            force_router_fallback: self.force_router_fallback,
            skip_geo_check: self.skip_geo_check,
        }
    }
}

/// Diagnostic surface: settings echoed back, secrets reduced to booleans.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub server: &'static str,
    pub version: &'static str,
    pub api_key_set: bool,
    pub target_url: String,
    pub browser_type: String,
    pub headless: bool,
    pub locale: String,
    pub home_country: String,
    pub proxy_url_set: bool,
    pub router_hostname: String,
    pub discovery_url_set: bool,
    pub discovery_token_set: bool,
    pub geo_check_url: String,
    pub force_router_fallback: bool,
    pub skip_geo_check: bool,
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            api_key: "key-123".into(),
            api_url: None,
            target_url: DEFAULT_TARGET_URL.into(),
            browser_type: "firefox".into(),
            headless: false,
            locale: "pt-BR".into(),
            home_country: "br".into(),
            proxy_url: None,
            router_hostname: None,
            discovery_url: None,
            discovery_token: None,
            geo_check_url: DEFAULT_GEO_CHECK_URL.into(),
            force_router_fallback: false,
            skip_geo_check: false,
        }
    }

    #[test]
    fn bool_parsing_accepts_the_usual_spellings() {
        assert!(parse_bool(Some("1"), false));
        assert!(parse_bool(Some("True"), false));
        assert!(parse_bool(Some("YES"), false));
        assert!(parse_bool(Some(" on "), false));
        assert!(!parse_bool(Some("0"), true));
        assert!(!parse_bool(Some("off"), true));
        assert!(parse_bool(None, true));
    }

    #[test]
    fn placeholder_api_key_is_rejected() {
        let mut s = settings();
        s.api_key = "changeme".into();
        assert!(s.require_api_key().is_err());
        s.api_key = String::new();
        assert!(s.require_api_key().is_err());
        s.api_key = "real-key".into();
        assert!(s.require_api_key().is_ok());
    }

    #[test]
    fn overrides_win_over_environment_defaults() {
        let s = settings();
        let overrides = RequestOverrides {
            target_url: Some("https://example.org".into()),
            headless: Some(true),
            browser_type: Some("chrome".into()),
            locale: Some("en-US".into()),
            router_fallback: Some(true),
            skip_geo_check: Some(true),
        };

        let request = s.request(&overrides).unwrap();

        assert_eq!(request.target_url, "https://example.org");
        assert!(request.headless);
        assert_eq!(request.browser_type.as_str(), "chrome");
        assert_eq!(request.locale, "en-US");
        assert!(request.force_router_fallback);
        assert!(request.skip_geo_check);
    }

    #[test]
    fn defaults_apply_when_no_overrides_given() {
        let request = settings().request(&RequestOverrides::default()).unwrap();

        assert_eq!(request.target_url, DEFAULT_TARGET_URL);
        assert_eq!(request.browser_type.as_str(), "firefox");
        assert!(!request.headless);
        assert!(!request.force_router_fallback);
    }

    #[test]
    fn unrecognized_browser_type_is_a_configuration_error() {
        let mut s = settings();
        s.browser_type = "netscape".into();
        assert!(s.request(&RequestOverrides::default()).is_err());
    }

    #[test]
    fn health_report_reduces_secrets_to_booleans() {
        let mut s = settings();
        s.discovery_token = Some("top-secret".into());
        let wire = serde_json::to_value(s.health()).unwrap();

        assert_eq!(wire["discovery_token_set"], true);
        assert_eq!(wire["api_key_set"], true);
        assert!(wire.get("api_key").is_none());
        assert!(wire.get("discovery_token").is_none());
    }
}
