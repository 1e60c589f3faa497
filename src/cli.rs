//! Command-line interface.
//!
//! Flags override the values read from the environment. Without
//! `--resolve` the binary serves HTTP until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::{ResolverConfig, StoreBackend};

/// Object store backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    /// S3-compatible object store
    S3,
    /// In-process store, lost on exit
    Memory,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::S3 => StoreBackend::S3,
            StoreArg::Memory => StoreBackend::Memory,
        }
    }
}

/// track-resolver: resolve track IDs to time-limited download URLs
#[derive(Parser, Debug)]
#[command(name = "track-resolver")]
#[command(about = "Resolves track IDs to cached audio download URLs")]
#[command(version)]
pub struct Cli {
    /// HTTP listen address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Object store backend
    #[arg(long, value_enum)]
    pub store: Option<StoreArg>,

    /// Bucket holding cached tracks
    #[arg(long)]
    pub bucket: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Object store region
    #[arg(long)]
    pub region: Option<String>,

    /// Root directory for per-fetch scratch workspaces
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Media fetcher executable
    #[arg(long, value_name = "PROG")]
    pub fetcher: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Let concurrent requests for one track each run their own fetch
    #[arg(long)]
    pub no_dedupe: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Resolve a single track ID, print the JSON result and exit
    #[arg(long, value_name = "TRACK_ID")]
    pub resolve: Option<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running a single resolution instead of serving.
    pub fn is_resolve_mode(&self) -> bool {
        self.resolve.is_some()
    }

    /// Overrides `config` with every flag that was given.
    pub fn apply_to(&self, config: &mut ResolverConfig) {
        if let Some(addr) = self.bind {
            config.bind_addr = addr;
        }
        if let Some(store) = self.store {
            config.store.backend = store.into();
        }
        if let Some(ref bucket) = self.bucket {
            config.store.bucket = bucket.clone();
        }
        if let Some(ref endpoint) = self.endpoint_url {
            config.store.endpoint_url = Some(endpoint.clone());
        }
        if let Some(ref region) = self.region {
            config.store.region = Some(region.clone());
        }
        if let Some(ref dir) = self.scratch_dir {
            config.scratch_path = Some(dir.clone());
        }
        if let Some(ref program) = self.fetcher {
            config.fetcher.program = program.clone();
        }
        if let Some(secs) = self.timeout {
            config.fetcher.timeout_secs = secs;
        }
        if self.no_dedupe {
            config.dedupe_fetches = false;
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["track-resolver"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn no_flags_leaves_config_alone() {
        let cli = parse(&[]);
        assert!(!cli.is_resolve_mode());

        let mut config = ResolverConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.bind_addr, ResolverConfig::default().bind_addr);
        assert!(config.dedupe_fetches);
        assert_eq!(config.store.backend, StoreBackend::S3);
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--bind",
            "127.0.0.1:8080",
            "--store",
            "memory",
            "--bucket",
            "tracks",
            "--endpoint-url",
            "http://localhost:9000",
            "--region",
            "eu-west-1",
            "--scratch-dir",
            "/tmp/scratch",
            "--fetcher",
            "/usr/local/bin/spotify_dl",
            "--timeout",
            "60",
            "--no-dedupe",
        ]);

        let mut config = ResolverConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.bucket, "tracks");
        assert_eq!(config.store.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.store.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.scratch_path, Some(PathBuf::from("/tmp/scratch")));
        assert_eq!(config.fetcher.program, PathBuf::from("/usr/local/bin/spotify_dl"));
        assert_eq!(config.fetcher.timeout_secs, 60);
        assert!(!config.dedupe_fetches);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["track-resolver", "--timeout", "0"]).is_err());
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(Cli::try_parse_from(["track-resolver", "--store", "ftp"]).is_err());
    }

    #[test]
    fn resolve_mode() {
        let cli = parse(&["--resolve", "4cOdK2wGLETKBW3PvgPWqT"]);
        assert!(cli.is_resolve_mode());
        assert_eq!(cli.resolve.as_deref(), Some("4cOdK2wGLETKBW3PvgPWqT"));
    }

    #[test]
    fn verbosity_selects_filter() {
        assert_eq!(parse(&[]).log_filter(), "info");
        assert_eq!(parse(&["-v"]).log_filter(), "debug");
        assert_eq!(parse(&["-vv"]).log_filter(), "trace");
    }
}
