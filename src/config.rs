use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scrollfeed::api::{DEFAULT_ADDR, DEFAULT_TOTAL_COUNT, LOAD_LIMIT, MockApiConfig};
use scrollfeed::loader::LoopGuardConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub server: ServerConfig,
    pub loader: LoaderConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub delay_ms: u64,
    pub failure_rate: f64,
    pub total_count: u64,
    pub max_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            delay_ms: 1000,
            failure_rate: 0.1,
            total_count: DEFAULT_TOTAL_COUNT,
            max_limit: 1000,
        }
    }
}

impl ServerConfig {
    pub fn mock_api_config(&self) -> MockApiConfig {
        MockApiConfig {
            delay: Duration::from_millis(self.delay_ms),
            failure_rate: self.failure_rate,
            total_count: self.total_count,
            max_limit: self.max_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub page_size: u32,
    pub loop_max_calls: u32,
    pub loop_detection_timeout_ms: u64,
    pub loop_timeout_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: LOAD_LIMIT,
            loop_max_calls: 5,
            loop_detection_timeout_ms: 2000,
            loop_timeout_ms: 3000,
        }
    }
}

impl LoaderConfig {
    pub fn guard_config(&self) -> LoopGuardConfig {
        LoopGuardConfig::new(
            self.loop_max_calls,
            Duration::from_millis(self.loop_detection_timeout_ms),
            Duration::from_millis(self.loop_timeout_ms),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub weeks: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { weeks: 4 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            server: ServerConfig::default(),
            loader: LoaderConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Level from `log_level`, if it names a valid filter
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.log_level.as_deref().and_then(|level| level.parse().ok())
    }
}
