use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proxypick::adapters::{AutomationClient, HttpDiscovery, IpinfoProbe};
use proxypick::config::{RequestOverrides, Settings};
use proxypick::domain::{CandidateSource, FailoverService, ResolutionOutcome, ResolveError};
use proxypick::ports::DiscoveryPort;

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), about = "Geo-aware failover egress picker for browser automation tasks")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configured-vs-unconfigured status of every setting
    Health,

    /// Resolve a working egress and run the automation task through it
    Run {
        /// Target page for the automation task
        #[clap(long)]
        target_url: Option<String>,

        /// Run the browser without a visible window
        #[clap(long)]
        headless: Option<bool>,

        /// Browser engine (firefox or chrome)
        #[clap(long)]
        browser_type: Option<String>,

        /// Session locale, e.g. pt-BR
        #[clap(long)]
        locale: Option<String>,

        /// Skip the home-country proxy and go straight to the fallback scan
        #[clap(long)]
        router_fallback: Option<bool>,

        /// Accept candidates without validating their egress country
        #[clap(long)]
        skip_geo_check: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // logs go to stderr so stdout stays a single parseable JSON document
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let opts = Opts::parse();
    let settings = Settings::from_env();

    match opts.command {
        Command::Health => {
            print_json(&settings.health());
            ExitCode::SUCCESS
        }
        Command::Run {
            target_url,
            headless,
            browser_type,
            locale,
            router_fallback,
            skip_geo_check,
        } => {
            let overrides = RequestOverrides {
                target_url,
                headless,
                browser_type,
                locale,
                router_fallback,
                skip_geo_check,
            };
            run(settings, overrides).await
        }
    }
}

async fn run(settings: Settings, overrides: RequestOverrides) -> ExitCode {
    match resolve(settings, overrides).await {
        Ok(outcome) => {
            let ok = outcome.is_success();
            print_json(&outcome);
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            print_json(&serde_json::json!({ "status": "error", "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

async fn resolve(settings: Settings, overrides: RequestOverrides) -> proxypick::domain::Result<ResolutionOutcome> {
    let api_key = settings.require_api_key()?.to_string();
    let request = settings.request(&overrides)?;

    let automation = match &settings.api_url {
        Some(url) => Arc::new(AutomationClient::with_base_url(api_key, url)?),
        None => Arc::new(AutomationClient::new(api_key)?),
    };

    let discovery: Option<Arc<dyn DiscoveryPort>> = match (&settings.discovery_url, &settings.discovery_token) {
        (Some(url), Some(token)) => Some(Arc::new(HttpDiscovery::new(url.clone(), token.clone())?)),
        _ => None,
    };

    let source = CandidateSource::new(settings.proxy_url.clone(), settings.router_hostname.clone(), discovery);
    let geo = Arc::new(IpinfoProbe::new(settings.geo_check_url.clone()));
    let service = FailoverService::new(
        automation.clone(),
        automation,
        geo,
        source,
        settings.home_country.clone(),
    );

    // one worker per invocation; a shutdown signal cancels between candidates
    // and lets the in-flight attempt wind down
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let mut worker = tokio::spawn(async move { service.resolve(&request, &worker_cancel).await });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = shutdown_signal() => {
            warn!("shutdown requested, stopping after the current attempt");
            cancel.cancel();
            worker.await
        }
    };

    joined.map_err(|e| ResolveError::SessionFailure(format!("resolution worker died: {}", e)))?
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}
