//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "framecard";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_PUBLIC_HOST: &str = "http://localhost:4001";
const DEFAULT_AUTHOR_PROFILE: &str = "andrei0x309";
const DEFAULT_AUTHOR_LINK: &str = "https://warpcast.com/andrei0x309";
const DEFAULT_REDIRECT_TARGET: &str = "https://yup.io";
const DEFAULT_DONATION_ADDRESS: &str = "0x01Ca6f13E48fC5E231351bA38e7E51A1a7835d8D";
const DEFAULT_DONATION_AMOUNT: &str = "0.1";
const DEFAULT_DONATION_CHAIN_ID: &str = "666666666";
const DEFAULT_QUOTA_GLOBAL_LIMIT: u64 = 100;
const DEFAULT_QUOTA_IDENTITY_LIMIT: u64 = 10;
const DEFAULT_QUOTA_WINDOW_SECS: u64 = 24 * 60 * 60;
const DEFAULT_ROAST_TIMEOUT_MS: u64 = 3_500;
const DEFAULT_ROAST_WRAP_WIDTH: usize = 90;
const DEFAULT_STATS_STALE_AFTER_SECS: u64 = 60 * 60;
const DEFAULT_REPUTATION_BASE: &str = "https://api.yup.io";
const DEFAULT_HUB_BASE: &str = "https://nemes.farcaster.xyz:2281";
const DEFAULT_PROFILE_PROXY_URL: &str = "https://api-gh-username.deno.dev";
const DEFAULT_ROAST_GENERATOR_URL: &str = "https://github-roast.pages.dev/llama";
const DEFAULT_CHANNEL_DIRECTORY_URL: &str = "https://api.warpcast.com/v2/all-channels";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ASSETS_DIR: &str = "public";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub frames: FrameSettings,
    pub quota: QuotaSettings,
    pub roast: RoastSettings,
    pub stats: StatsSettings,
    pub upstream: UpstreamSettings,
    pub assets: AssetSettings,
    pub verification: VerificationSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct FrameSettings {
    /// Base URL prefixed to every frame link and image.
    pub public_host: String,
    /// Profile the roast frame refuses to roast.
    pub author_profile: String,
    pub author_link: String,
    pub redirect_target: String,
    pub donation_address: String,
    pub donation_amount: String,
    pub donation_chain_id: String,
}

#[derive(Debug, Clone)]
pub struct QuotaSettings {
    pub global_limit: u64,
    pub identity_limit: u64,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct RoastSettings {
    pub generation_timeout: Duration,
    pub wrap_width: usize,
}

#[derive(Debug, Clone)]
pub struct StatsSettings {
    pub stale_after: Duration,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub reputation_base: String,
    pub hub_base: String,
    pub profile_proxy_url: String,
    pub roast_generator_url: String,
    pub channel_directory_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub enforce: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FRAMECARD").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    frames: RawFrameSettings,
    quota: RawQuotaSettings,
    roast: RawRoastSettings,
    stats: RawStatsSettings,
    upstream: RawUpstreamSettings,
    assets: RawAssetSettings,
    verification: RawVerificationSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(host) = overrides.public_host.as_ref() {
            self.frames.public_host = Some(host.clone());
        }
        if let Some(directory) = overrides.assets_directory.as_ref() {
            self.assets.directory = Some(directory.clone());
        }
        if let Some(enforce) = overrides.verification_enforce {
            self.verification.enforce = Some(enforce);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            frames,
            quota,
            roast,
            stats,
            upstream,
            assets,
            verification,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            frames: build_frame_settings(frames)?,
            quota: build_quota_settings(quota)?,
            roast: build_roast_settings(roast)?,
            stats: build_stats_settings(stats)?,
            upstream: build_upstream_settings(upstream)?,
            assets: AssetSettings {
                directory: assets
                    .directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
            },
            verification: VerificationSettings {
                enforce: verification.enforce.unwrap_or(false),
            },
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

    Ok(DatabaseSettings {
        url,
        max_connections: non_zero_u32(max_connections.into(), "database.max_connections")?,
    })
}

fn build_frame_settings(frames: RawFrameSettings) -> Result<FrameSettings, LoadError> {
    let public_host = http_url(
        frames.public_host,
        DEFAULT_PUBLIC_HOST,
        "frames.public_host",
    )?;
    let author_link = http_url(
        frames.author_link,
        DEFAULT_AUTHOR_LINK,
        "frames.author_link",
    )?;
    let redirect_target = http_url(
        frames.redirect_target,
        DEFAULT_REDIRECT_TARGET,
        "frames.redirect_target",
    )?;

    let author_profile = frames
        .author_profile
        .unwrap_or_else(|| DEFAULT_AUTHOR_PROFILE.to_string());
    if author_profile.trim().is_empty() {
        return Err(LoadError::invalid(
            "frames.author_profile",
            "must not be empty",
        ));
    }

    Ok(FrameSettings {
        public_host,
        author_profile,
        author_link,
        redirect_target,
        donation_address: frames
            .donation_address
            .unwrap_or_else(|| DEFAULT_DONATION_ADDRESS.to_string()),
        donation_amount: frames
            .donation_amount
            .unwrap_or_else(|| DEFAULT_DONATION_AMOUNT.to_string()),
        donation_chain_id: frames
            .donation_chain_id
            .unwrap_or_else(|| DEFAULT_DONATION_CHAIN_ID.to_string()),
    })
}

fn build_quota_settings(quota: RawQuotaSettings) -> Result<QuotaSettings, LoadError> {
    let global_limit = quota.global_limit.unwrap_or(DEFAULT_QUOTA_GLOBAL_LIMIT);
    if global_limit == 0 {
        return Err(LoadError::invalid(
            "quota.global_limit",
            "must be greater than zero",
        ));
    }

    let identity_limit = quota.identity_limit.unwrap_or(DEFAULT_QUOTA_IDENTITY_LIMIT);
    if identity_limit == 0 {
        return Err(LoadError::invalid(
            "quota.identity_limit",
            "must be greater than zero",
        ));
    }

    let window_seconds = quota.window_seconds.unwrap_or(DEFAULT_QUOTA_WINDOW_SECS);
    if window_seconds == 0 {
        return Err(LoadError::invalid(
            "quota.window_seconds",
            "must be greater than zero",
        ));
    }

    Ok(QuotaSettings {
        global_limit,
        identity_limit,
        window: Duration::from_secs(window_seconds),
    })
}

fn build_roast_settings(roast: RawRoastSettings) -> Result<RoastSettings, LoadError> {
    let timeout_ms = roast
        .generation_timeout_ms
        .unwrap_or(DEFAULT_ROAST_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "roast.generation_timeout_ms",
            "must be greater than zero",
        ));
    }

    let wrap_width = roast.wrap_width.unwrap_or(DEFAULT_ROAST_WRAP_WIDTH);
    if wrap_width == 0 {
        return Err(LoadError::invalid(
            "roast.wrap_width",
            "must be greater than zero",
        ));
    }

    Ok(RoastSettings {
        generation_timeout: Duration::from_millis(timeout_ms),
        wrap_width,
    })
}

fn build_stats_settings(stats: RawStatsSettings) -> Result<StatsSettings, LoadError> {
    let seconds = stats
        .stale_after_seconds
        .unwrap_or(DEFAULT_STATS_STALE_AFTER_SECS);
    if seconds == 0 {
        return Err(LoadError::invalid(
            "stats.stale_after_seconds",
            "must be greater than zero",
        ));
    }

    Ok(StatsSettings {
        stale_after: Duration::from_secs(seconds),
    })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let timeout_secs = upstream
        .request_timeout_seconds
        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "upstream.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(UpstreamSettings {
        reputation_base: http_url(
            upstream.reputation_base,
            DEFAULT_REPUTATION_BASE,
            "upstream.reputation_base",
        )?,
        hub_base: http_url(upstream.hub_base, DEFAULT_HUB_BASE, "upstream.hub_base")?,
        profile_proxy_url: http_url(
            upstream.profile_proxy_url,
            DEFAULT_PROFILE_PROXY_URL,
            "upstream.profile_proxy_url",
        )?,
        roast_generator_url: http_url(
            upstream.roast_generator_url,
            DEFAULT_ROAST_GENERATOR_URL,
            "upstream.roast_generator_url",
        )?,
        channel_directory_url: http_url(
            upstream.channel_directory_url,
            DEFAULT_CHANNEL_DIRECTORY_URL,
            "upstream.channel_directory_url",
        )?,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFrameSettings {
    public_host: Option<String>,
    author_profile: Option<String>,
    author_link: Option<String>,
    redirect_target: Option<String>,
    donation_address: Option<String>,
    donation_amount: Option<String>,
    donation_chain_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQuotaSettings {
    global_limit: Option<u64>,
    identity_limit: Option<u64>,
    window_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRoastSettings {
    generation_timeout_ms: Option<u64>,
    wrap_width: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStatsSettings {
    stale_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    reputation_base: Option<String>,
    hub_base: Option<String>,
    profile_proxy_url: Option<String>,
    roast_generator_url: Option<String>,
    channel_directory_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAssetSettings {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawVerificationSettings {
    enforce: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn http_url(value: Option<String>, default: &str, key: &'static str) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{trimmed}`: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "URL must use http or https"));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
