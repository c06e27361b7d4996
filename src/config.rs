use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Freightline
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FreightlineConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Transition policy
    pub lifecycle: LifecycleConfig,
    /// Where the ledger lives
    pub ledger: LedgerConfig,
    /// Location tracking and ETA settings
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// Reject transitions the actor's role may not record
    pub enforce_roles: bool,
    /// Actor id written into log entries when none is given
    pub default_actor_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// JSON ledger file
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackingConfig {
    /// Average speeds below this produce no ETA
    pub min_speed_kmh: f64,
}

impl Default for FreightlineConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
            lifecycle: LifecycleConfig {
                enforce_roles: true,
                default_actor_id: "admin".to_string(),
            },
            ledger: LedgerConfig {
                path: PathBuf::from(".freightline/ledger.json"),
            },
            tracking: TrackingConfig { min_speed_kmh: 1.0 },
        }
    }
}

impl FreightlineConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. freightline.toml in the working directory
    /// 3. Environment variables (FREIGHTLINE_LEDGER__PATH and so on)
    pub fn load() -> Result<Self> {
        let local = Path::new("freightline.toml");
        Self::load_from(local.exists().then_some(local))
    }

    /// Same as `load` but with an explicit file instead of freightline.toml
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&FreightlineConfig::default())?);

        if let Some(file) = file {
            builder = builder.add_source(File::from(file));
        }

        builder = builder.add_source(
            Environment::with_prefix("FREIGHTLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: FreightlineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the lifecycle and tracking code cannot work with
    pub fn validate(&self) -> Result<()> {
        let min_speed = self.tracking.min_speed_kmh;
        if !min_speed.is_finite() || min_speed <= 0.0 {
            anyhow::bail!("tracking.min_speed_kmh must be a positive number, got {min_speed}");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<FreightlineConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = FreightlineConfig::load_env_file();
        FreightlineConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static FreightlineConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
