use crate::session::SessionSettings;
use clap::{Parser, ValueEnum};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Proxy the widget talks to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "https://loreal-worker.salbrecht-228.workers.dev/";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Proxy endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds (no timeout when unset)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// File whose contents replace the built-in policy message
    #[arg(long)]
    pub policy_file: Option<PathBuf>,

    /// Start without the greeting bubble
    #[arg(long)]
    pub no_greeting: bool,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub endpoint: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub policy: String,
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
    /// Empty disables the greeting.
    pub greeting: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid proxy endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("proxy endpoint must be http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("cannot read policy file {}: {source}", .path.display())]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(Cli::parse())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(cli)
    }

    /// Layer defaults, config file, `ADVISOR_` environment, then CLI flags.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("proxy.endpoint", DEFAULT_ENDPOINT)?
            .set_default("session.policy", crate::session::DEFAULT_POLICY)?
            .set_default("session.greeting", crate::session::DEFAULT_GREETING)?
            .set_default("logging.format", LogFormat::Compact.as_str())?
            .set_default("logging.filter", "warn,advisor_chat=info")?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("advisor-chat").required(false)),
        };

        // E.g. ADVISOR_PROXY__ENDPOINT=http://localhost:8787/
        builder = builder.add_source(
            Environment::with_prefix("ADVISOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("proxy.endpoint", endpoint)?;
        }
        if let Some(secs) = cli.timeout_secs {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            builder = builder.set_override("proxy.timeout_secs", secs)?;
        }
        if let Some(path) = cli.policy_file {
            let path = path.to_string_lossy();
            builder = builder.set_override("session.policy_file", path.as_ref())?;
        }
        if cli.no_greeting {
            builder = builder.set_override("session.greeting", "")?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format.as_str())?;
        }

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    /// The proxy endpoint, validated.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let endpoint = self.proxy.endpoint.trim();
        let url = Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.proxy.timeout_secs.map(Duration::from_secs)
    }

    /// Settings for a new session, reading the policy file if one is set.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        let policy = match &self.session.policy_file {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|source| ConfigError::PolicyFile {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string(),
            None => self.session.policy.clone(),
        };

        let greeting = Some(self.session.greeting.clone()).filter(|g| !g.trim().is_empty());

        Ok(SessionSettings { policy, greeting })
    }
}
