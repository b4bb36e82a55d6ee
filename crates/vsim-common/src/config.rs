//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Shared primitives and utilities for the simulation runtime."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

/// Errors raised while loading or validating configuration. These are never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Inline(#[from] toml::de::Error),
    #[error("no configuration files found. inspected: {0}")]
    NotFound(String),
    #[error("missing required parameter `{0}`")]
    MissingParam(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_site_prefix() -> String {
    "imaginary-shopping-mall".to_owned()
}

fn default_site_name_prefix() -> String {
    "dreamy-shopping-mall".to_owned()
}

fn default_map_width() -> f64 {
    1920.0
}

fn default_map_height() -> f64 {
    1080.0
}

fn default_tile_width() -> f64 {
    60.0
}

fn default_tile_height() -> f64 {
    67.5
}

fn default_period() -> Duration {
    Duration::from_millis(30_000)
}

fn default_trigger_interval() -> Duration {
    Duration::from_millis(60_000)
}

fn default_topic() -> String {
    "covsafe".to_owned()
}

fn default_store_url() -> String {
    "memory://".to_owned()
}

fn default_database() -> String {
    "assets".to_owned()
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the simulation runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub emission: EmissionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "VSIM_CONFIG";

    /// Load configuration from disk, respecting the `VSIM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, ConfigError> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(
        candidates: &[P],
    ) -> Result<LoadedAppConfig, ConfigError> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(ConfigError::NotFound(
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ))
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config =
            toml::from_str::<AppConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.venue.validate()?;
        self.emission.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Site naming and map geometry used by the asset graph builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_site_prefix")]
    pub site_prefix: String,
    #[serde(default = "default_site_name_prefix")]
    pub site_name_prefix: String,
    #[serde(default = "default_map_width")]
    pub map_width: f64,
    #[serde(default = "default_map_height")]
    pub map_height: f64,
    #[serde(default = "default_tile_width")]
    pub tile_width: f64,
    #[serde(default = "default_tile_height")]
    pub tile_height: f64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            site_prefix: default_site_prefix(),
            site_name_prefix: default_site_name_prefix(),
            map_width: default_map_width(),
            map_height: default_map_height(),
            tile_width: default_tile_width(),
            tile_height: default_tile_height(),
        }
    }
}

impl VenueConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_prefix.trim().is_empty() {
            return Err(ConfigError::MissingParam("venue.site_prefix"));
        }
        let dims = [
            ("map_width", self.map_width),
            ("map_height", self.map_height),
            ("tile_width", self.tile_width),
            ("tile_height", self.tile_height),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "venue.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Cadence of the emission loop and the bus topic it writes to.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionConfig {
    #[serde(default = "default_period", rename = "period_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub period: Duration,
    #[serde(default = "default_trigger_interval", rename = "trigger_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub trigger_interval: Duration,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            trigger_interval: default_trigger_interval(),
            topic: default_topic(),
            seed: None,
        }
    }
}

impl EmissionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::Invalid(
                "emission.period_ms must be greater than zero".to_owned(),
            ));
        }
        if self.trigger_interval < self.period {
            return Err(ConfigError::Invalid(format!(
                "emission.trigger_interval_ms ({}) must not be shorter than period_ms ({})",
                self.trigger_interval.as_millis(),
                self.period.as_millis()
            )));
        }
        if self.topic.trim().is_empty() {
            return Err(ConfigError::MissingParam("emission.topic"));
        }
        Ok(())
    }
}

/// Connection parameters for the asset document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_database(),
            username: None,
            password: None,
            port: None,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingParam("store.url"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingParam("store.database"));
        }
        Ok(())
    }
}

/// Where generated events are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SinkConfig {
    /// Newline-delimited JSON on stdout.
    #[default]
    Stdout,
    /// Newline-delimited JSON appended to a file.
    Ndjson { path: PathBuf },
    /// Retained in process memory; useful for dry runs.
    Memory,
}

/// Message bus credentials and sink selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BusConfig {
    #[serde(default)]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Prometheus textfile export; the registry is written after every trigger run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn defaults_match_reference_venue() {
        let config = AppConfig::from_str("").expect("empty config is valid");
        assert_eq!(config.venue.map_width, 1920.0);
        assert_eq!(config.venue.tile_height, 67.5);
        assert_eq!(config.emission.period, Duration::from_secs(30));
        assert_eq!(config.emission.trigger_interval, Duration::from_secs(60));
        assert_eq!(config.emission.topic, "covsafe");
        assert_eq!(config.store.url, "memory://");
        assert_eq!(config.bus.sink, SinkConfig::Stdout);
    }

    #[test]
    fn parses_sections_and_sink() {
        let config = AppConfig::from_str(
            r#"
            [emission]
            period_ms = 10000
            trigger_interval_ms = 60000
            topic = "telemetry"
            seed = 7

            [store]
            url = "file:///tmp/vsim"
            database = "assets"

            [bus]
            brokers = ["broker-0.example:9093"]
            user = "token"
            sink = { kind = "ndjson", path = "out/events.ndjson" }
            "#,
        )
        .expect("valid config");
        assert_eq!(config.emission.period, Duration::from_secs(10));
        assert_eq!(config.emission.seed, Some(7));
        assert_eq!(
            config.bus.sink,
            SinkConfig::Ndjson {
                path: PathBuf::from("out/events.ndjson")
            }
        );
    }

    #[test]
    fn rejects_trigger_shorter_than_period() {
        let err = AppConfig::from_str(
            r#"
            [emission]
            period_ms = 60000
            trigger_interval_ms = 30000
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_missing_database() {
        let err = AppConfig::from_str(
            r#"
            [store]
            url = "memory://"
            database = ""
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingParam("store.database")));
    }

    #[test]
    fn rejects_non_positive_tiles() {
        let err = AppConfig::from_str(
            r#"
            [venue]
            tile_width = 0.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_picks_first_existing_candidate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[emission]\ntopic = \"from-file\"").unwrap();
        file.flush().unwrap();
        let loaded =
            AppConfig::load_with_source(&[PathBuf::from("does/not/exist.toml"), file.path().into()])
                .unwrap();
        assert_eq!(loaded.config.emission.topic, "from-file");
        assert_eq!(loaded.source, file.path());
    }

    #[test]
    fn load_reports_inspected_candidates() {
        let err = AppConfig::load(&[PathBuf::from("missing-a.toml")]).unwrap_err();
        assert!(err.to_string().contains("missing-a.toml"));
    }
}
