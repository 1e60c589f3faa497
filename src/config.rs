//! Resolver configuration module.
//!
//! Contains the runtime configuration for the track resolver: where to
//! listen, which object store to cache into, and how to run the external
//! media fetcher.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Default lifetime of issued access URLs (1 hour).
pub const DEFAULT_URL_TTL_SECS: u64 = 3600;

/// Longest access-URL lifetime SigV4 presigning allows (7 days).
pub const MAX_URL_TTL_SECS: u64 = 7 * 24 * 3600;

/// Default wall-clock limit for one fetcher run.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

/// Default pause between fetcher exit and the artifact scan.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Object store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Any S3-compatible store (AWS S3, MinIO, R2, GCS interop).
    #[default]
    S3,
    /// Process-local map. Nothing survives a restart.
    Memory,
}

impl StoreBackend {
    /// Returns the string representation of the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::S3 => "s3",
            StoreBackend::Memory => "memory",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "s3" => Some(StoreBackend::S3),
            "memory" | "mem" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use.
    pub backend: StoreBackend,

    /// Bucket holding cached tracks. Required for S3.
    pub bucket: String,

    /// Custom endpoint for S3-compatible services.
    /// If None, the AWS endpoint for the region is used.
    pub endpoint_url: Option<String>,

    /// Region override. If None, the SDK's provider chain decides.
    pub region: Option<String>,

    /// Lifetime of issued access URLs in seconds.
    pub url_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            bucket: String::new(),
            endpoint_url: None,
            region: None,
            url_ttl_secs: DEFAULT_URL_TTL_SECS,
        }
    }
}

impl StoreConfig {
    /// Returns the access URL lifetime.
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }
}

/// External fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Fetcher executable, looked up on PATH if not absolute.
    pub program: PathBuf,

    /// Argument template. `{url}` and `{output_dir}` are substituted.
    pub args: Vec<String>,

    /// Upstream URL template. `{id}` is substituted with the track ID.
    pub source_template: String,

    /// Wall-clock limit for one fetcher run.
    pub timeout_secs: u64,

    /// Pause after the fetcher exits before scanning for the artifact.
    /// The fetcher may still be finalizing the file when it exits.
    pub settle_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("spotify_dl"),
            args: default_fetcher_args(),
            source_template: "https://open.spotify.com/track/{id}".to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl FetcherConfig {
    /// Returns the fetch timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the settle delay.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Runtime configuration for the resolver.
///
/// Loaded from environment variables at startup, then overridden by
/// command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// HTTP listen address.
    pub bind_addr: SocketAddr,

    /// Object store settings.
    pub store: StoreConfig,

    /// Root directory for per-fetch scratch workspaces.
    /// If None, uses the platform-specific default cache location.
    pub scratch_path: Option<PathBuf>,

    /// External fetcher settings.
    pub fetcher: FetcherConfig,

    /// Collapse concurrent fetches of the same track into one.
    pub dedupe_fetches: bool,
}

impl ResolverConfig {
    /// Creates a new ResolverConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ResolverConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `RESOLVER_BIND` - HTTP listen address
    /// - `RESOLVER_STORE` - Store backend (s3, memory)
    /// - `RESOLVER_BUCKET` - Bucket name
    /// - `RESOLVER_S3_ENDPOINT` - Custom S3 endpoint URL
    /// - `RESOLVER_S3_REGION` - Region override
    /// - `RESOLVER_URL_TTL_SECS` - Access URL lifetime
    /// - `RESOLVER_SCRATCH_DIR` - Scratch workspace root
    /// - `RESOLVER_FETCHER` - Fetcher executable
    /// - `RESOLVER_FETCHER_ARGS` - Whitespace-separated argument template
    /// - `RESOLVER_SOURCE_TEMPLATE` - Upstream URL template
    /// - `RESOLVER_FETCH_TIMEOUT_SECS` - Fetch timeout
    /// - `RESOLVER_SETTLE_DELAY_MS` - Delay before the artifact scan
    /// - `RESOLVER_DEDUPE_FETCHES` - Per-track fetch de-duplication (true/false)
    ///
    /// Falls back to defaults for unset or unparseable variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("RESOLVER_BIND").and_then(|s| s.parse().ok()) {
            config.bind_addr = addr;
        }

        if let Some(backend) = lookup("RESOLVER_STORE").and_then(|s| StoreBackend::parse(&s)) {
            config.store.backend = backend;
        }

        if let Some(bucket) = lookup("RESOLVER_BUCKET") {
            config.store.bucket = bucket;
        }

        if let Some(endpoint) = lookup("RESOLVER_S3_ENDPOINT").filter(|s| !s.is_empty()) {
            config.store.endpoint_url = Some(endpoint);
        }

        if let Some(region) = lookup("RESOLVER_S3_REGION").filter(|s| !s.is_empty()) {
            config.store.region = Some(region);
        }

        if let Some(ttl) = lookup("RESOLVER_URL_TTL_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if (1..=MAX_URL_TTL_SECS).contains(&ttl) {
                config.store.url_ttl_secs = ttl;
            }
        }

        if let Some(path) = lookup("RESOLVER_SCRATCH_DIR").filter(|s| !s.is_empty()) {
            config.scratch_path = Some(PathBuf::from(path));
        }

        if let Some(program) = lookup("RESOLVER_FETCHER").filter(|s| !s.is_empty()) {
            config.fetcher.program = PathBuf::from(program);
        }

        if let Some(args) = lookup("RESOLVER_FETCHER_ARGS") {
            config.fetcher.args = args.split_whitespace().map(str::to_string).collect();
        }

        if let Some(template) = lookup("RESOLVER_SOURCE_TEMPLATE").filter(|s| !s.is_empty()) {
            config.fetcher.source_template = template;
        }

        if let Some(secs) =
            lookup("RESOLVER_FETCH_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok())
        {
            if secs > 0 {
                config.fetcher.timeout_secs = secs;
            }
        }

        if let Some(ms) = lookup("RESOLVER_SETTLE_DELAY_MS").and_then(|s| s.parse::<u64>().ok()) {
            config.fetcher.settle_delay_ms = ms;
        }

        if let Some(flag) = lookup("RESOLVER_DEDUPE_FETCHES").and_then(|s| parse_bool(&s)) {
            config.dedupe_fetches = flag;
        }

        config
    }

    /// Returns the effective scratch root, using platform defaults if not specified.
    pub fn effective_scratch_path(&self) -> PathBuf {
        if let Some(ref path) = self.scratch_path {
            path.clone()
        } else {
            default_scratch_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.store.backend == StoreBackend::S3 && self.store.bucket.trim().is_empty() {
            return Some("bucket is required for the s3 store (set RESOLVER_BUCKET)".to_string());
        }

        if !(1..=MAX_URL_TTL_SECS).contains(&self.store.url_ttl_secs) {
            return Some(format!(
                "url_ttl_secs must be between 1 and {}, got {}",
                MAX_URL_TTL_SECS, self.store.url_ttl_secs
            ));
        }

        if self.fetcher.timeout_secs == 0 {
            return Some("fetch timeout must be > 0".to_string());
        }

        if self.fetcher.program.as_os_str().is_empty() {
            return Some("fetcher program must not be empty".to_string());
        }

        if !self.fetcher.args.iter().any(|a| a.contains("{output_dir}")) {
            return Some("fetcher args must reference {output_dir}".to_string());
        }

        if !self.fetcher.source_template.contains("{id}") {
            return Some("source template must contain {id}".to_string());
        }

        None
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            store: StoreConfig::default(),
            scratch_path: None,
            fetcher: FetcherConfig::default(),
            dedupe_fetches: true,
        }
    }
}

/// Arguments for `spotify_dl`: link, output dir, mp3 format, skip existing.
fn default_fetcher_args() -> Vec<String> {
    ["-l", "{url}", "-o", "{output_dir}", "-f", "mp3", "-s", "y"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Returns the platform-specific default scratch path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/track-resolver/scratch
/// - Linux: ~/.cache/track-resolver/scratch
/// - Windows: C:\Users\<user>\AppData\Local\track-resolver\cache\scratch
fn default_scratch_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "track-resolver") {
        proj_dirs.cache_dir().join("scratch")
    } else {
        // Fallback to the system temp directory
        std::env::temp_dir().join("track-resolver")
    }
}
