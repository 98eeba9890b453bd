use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Session time-to-live in seconds
    #[arg(long, env = "SESSION_TTL_SECONDS")]
    pub ttl_seconds: Option<u32>,

    /// Directory under which uploaded files are stored
    #[arg(long, env = "STORAGE_ROOT")]
    pub storage_root: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Sliding expiration applied on every touch of a session.
    pub ttl_seconds: u32,
    pub cookie_name: String,
}

impl SessionConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_seconds))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    /// First path segment of every stored file, also the URL prefix.
    pub namespace: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
    pub timeout_disabled: bool,
    pub request_timeout_seconds: u64,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Build the configuration.
    ///
    /// Priority: CLI flag / its env var > `ASSIGNMENTS_*` env > config file >
    /// defaults. Without `--config`, an optional `./config.{yaml,toml,json}`
    /// is picked up.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("session.ttl_seconds", 300)?
            .set_default("session.cookie_name", "assignment_session")?
            .set_default("storage.root", ".")?
            .set_default("storage.namespace", "AssignmentImages")?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.requests_per_second", 20)?
            .set_default("resilience.burst_size", 40)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_seconds", 30)?
            .set_default("resilience.max_upload_bytes", 10 * 1024 * 1024)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. ASSIGNMENTS_SESSION__TTL_SECONDS=60
        builder = builder.add_source(
            Environment::with_prefix("ASSIGNMENTS")
                .separator("__")
                .try_parsing(true),
        );

        // Legacy name used by older deployments.
        if let Ok(val) = env::var("SESSION_EXPIRATION_TIME") {
            if let Ok(secs) = val.parse::<u32>() {
                builder = builder.set_override("session.ttl_seconds", secs)?;
            }
        }

        // clap already folded its env fallbacks into `cli`.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(ttl) = cli.ttl_seconds {
            builder = builder.set_override("session.ttl_seconds", ttl)?;
        }
        if let Some(root) = cli.storage_root {
            builder = builder.set_override("storage.root", root)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        let config: Self = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let ns = &self.storage.namespace;
        if ns.is_empty() || ns.contains(['/', '\\']) || ns == "." || ns == ".." {
            return Err(config::ConfigError::Message(format!(
                "storage.namespace must be a single path segment, got {ns:?}"
            )));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "session.cookie_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
