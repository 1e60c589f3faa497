//! track-resolver: resolves track IDs to time-limited download URLs.
//!
//! This binary can run in two modes:
//! - Server mode (default): HTTP on the configured bind address
//! - Resolve mode (`--resolve ID`): one resolution, JSON on stdout

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use track_resolver::cache::build_store;
use track_resolver::cli::Cli;
use track_resolver::config::ResolverConfig;
use track_resolver::fetch::CommandFetcher;
use track_resolver::resolve::ResolutionCoordinator;
use track_resolver::server::{self, AppState, ErrorBody};
use track_resolver::types::ResolvedTrack;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = ResolverConfig::from_env();
    cli.apply_to(&mut config);

    if let Some(problem) = config.validate() {
        bail!("invalid configuration: {}", problem);
    }

    let scratch = config.effective_scratch_path();
    tokio::fs::create_dir_all(&scratch)
        .await
        .with_context(|| format!("failed to create scratch directory {}", scratch.display()))?;

    let store = build_store(&config.store).await;
    let fetcher = Arc::new(CommandFetcher::from_config(&config.fetcher));
    let coordinator = Arc::new(ResolutionCoordinator::from_config(&config, store, fetcher));

    if cli.is_resolve_mode() {
        let raw = cli.resolve.as_deref().unwrap_or_default();
        return resolve_once(&coordinator, raw).await;
    }

    tracing::info!(
        store = %config.store.backend,
        bucket = %config.store.bucket,
        fetcher = %config.fetcher.program.display(),
        timeout_secs = config.fetcher.timeout_secs,
        dedupe = config.dedupe_fetches,
        scratch = %scratch.display(),
        "starting track-resolver"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    server::serve(listener, AppState::new(coordinator))
        .await
        .context("server error")?;

    Ok(ExitCode::SUCCESS)
}

/// Runs one resolution and prints the body the HTTP endpoint would return.
async fn resolve_once(coordinator: &ResolutionCoordinator, raw: &str) -> anyhow::Result<ExitCode> {
    let (body, code) = match coordinator.resolve(raw).await {
        Ok(resolution) => (
            serde_json::to_string(&ResolvedTrack::from(resolution))?,
            ExitCode::SUCCESS,
        ),
        Err(e) => (serde_json::to_string(&ErrorBody::from(&e))?, ExitCode::FAILURE),
    };

    println!("{}", body);
    Ok(code)
}
