//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`SENSORVOL_SECTION__KEY`)

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use sensorvol_core::time::parse_time;
use sensorvol_core::SimTime;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scene document configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Simulation clock configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Sensor volume configuration
    #[serde(default)]
    pub volume: VolumeConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`SENSORVOL_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // SENSORVOL_SIMULATION__FRAMES=10 -> simulation.frames = 10
        figment = figment.merge(Env::prefixed("SENSORVOL_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Scene document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Path of the RON scene document
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/demo.ron".to_string(),
        }
    }
}

/// Simulation clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// First simulated instant (RFC 3339)
    pub start: String,
    /// Simulated seconds between frames
    pub step_seconds: f64,
    /// Number of frames to drive
    pub frames: u32,
}

impl SimulationConfig {
    /// Parse [`SimulationConfig::start`]
    pub fn start_time(&self) -> Result<SimTime, ConfigError> {
        parse_time(&self.start).map_err(|e| ConfigError::InvalidValue {
            key: "simulation.start",
            message: e.to_string(),
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: "2024-01-01T00:00:00Z".to_string(),
            step_seconds: 1.0,
            frames: 120,
        }
    }
}

/// Sensor volume configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Arc subdivision count for new volumes
    pub slice_count: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            slice_count: sensorvol_render::volume::DEFAULT_SLICE,
        }
    }
}

/// Which render device the driver creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackend {
    Wgpu,
    Headless,
}

/// Adapter power preference for the wgpu backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    None,
    LowPower,
    HighPerformance,
}

impl PowerPreference {
    pub fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            PowerPreference::None => wgpu::PowerPreference::None,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Device backend; "wgpu" falls back to "headless" when no adapter exists
    pub backend: RenderBackend,
    /// Adapter power preference
    pub power_preference: PowerPreference,
    /// Offscreen target width in pixels
    pub width: u32,
    /// Offscreen target height in pixels
    pub height: u32,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            backend: RenderBackend::Wgpu,
            power_preference: PowerPreference::HighPerformance,
            width: 640,
            height: 480,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub enum ConfigError {
    /// A source could not be read or extracted
    Figment(figment::Error),
    /// A value parsed but is not usable
    InvalidValue { key: &'static str, message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Figment(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Figment(e) => write!(f, "Configuration error: {}", e),
            ConfigError::InvalidValue { key, message } => {
                write!(f, "Configuration error: invalid {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Figment(e) => Some(e),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}
