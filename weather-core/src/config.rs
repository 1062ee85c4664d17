use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::units::UnitSystem;

const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Upstream endpoints. Every provider is addressed by base URL so it can be
/// swapped (or pointed at a mock server) without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Open-Meteo forecast API, e.g. "https://api.open-meteo.com/v1".
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Open-Meteo geocoding API, used for postal codes.
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Nominatim (OpenStreetMap) place search, used for city names.
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    /// Nominatim's usage policy requires an identifying User-Agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            geocoding_url: default_geocoding_url(),
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// timeout_seconds = 10
/// default_units = "imperial"
///
/// [providers]
/// forecast_url = "https://api.open-meteo.com/v1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Per-call timeout for every upstream request.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Units used when a request does not name any.
    #[serde(default)]
    pub default_units: UnitSystem,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            timeout_seconds: default_timeout_seconds(),
            default_units: UnitSystem::default(),
        }
    }
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("weather-cli/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from `path`, or defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHER_*` environment overrides on top of the file values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("WEATHER_FORECAST_URL") {
            self.providers.forecast_url = url;
        }
        if let Some(url) = lookup("WEATHER_GEOCODING_URL") {
            self.providers.geocoding_url = url;
        }
        if let Some(url) = lookup("WEATHER_NOMINATIM_URL") {
            self.providers.nominatim_url = url;
        }
        if let Some(secs) = lookup("WEATHER_TIMEOUT_SECONDS") {
            self.timeout_seconds = secs
                .trim()
                .parse()
                .with_context(|| format!("WEATHER_TIMEOUT_SECONDS is not a number: '{secs}'"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 || self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            bail!(
                "timeout_seconds must be between 1 and {MAX_TIMEOUT_SECONDS}, got {}",
                self.timeout_seconds
            );
        }

        for (name, url) in [
            ("forecast_url", &self.providers.forecast_url),
            ("geocoding_url", &self.providers.geocoding_url),
            ("nominatim_url", &self.providers.nominatim_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("providers.{name} must be an http(s) URL, got '{url}'");
            }
        }

        Ok(())
    }
}
