//! Configuration management for the capture flow
//!
//! Provides loading, saving and validation of the camera constraints, still
//! encoding settings and remote service endpoints.

use crate::errors::FlowError;
use crate::media::FacingMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ANALYSIS_ENDPOINT: &str =
    "https://us-central1-api-skinstric-ai.cloudfunctions.net/skinstricPhaseTwo";
pub const DEFAULT_INTAKE_ENDPOINT: &str =
    "https://us-central1-api-skinstric-ai.cloudfunctions.net/skinstricPhaseOne";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub analysis: AnalysisConfig,
    pub intake: IntakeConfig,
}

/// Device constraints requested on acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Preferred camera facing
    pub facing_mode: FacingMode,
    /// Ideal resolution [width, height]
    pub ideal_resolution: [u32; 2],
    /// Fixed aspect ratio (width / height)
    pub aspect_ratio: f64,
}

/// Still image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Show the front camera mirrored, and capture stills the same way
    pub mirror_front_camera: bool,
}

/// Remote face analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    /// Upper bound on a single analysis request, in milliseconds
    pub request_timeout_ms: u64,
}

/// Intake form submission service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_resolution: [1920, 1080],
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            mirror_front_camera: true,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ANALYSIS_ENDPOINT.to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_INTAKE_ENDPOINT.to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl IntakeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl FlowConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("Failed to read config file: {}", e)))?;

        let config: FlowConfig = toml::from_str(&contents)
            .map_err(|e| FlowError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(FlowError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FlowError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FlowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| FlowError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| FlowError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("capture-flow.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.ideal_resolution[0] == 0 || self.camera.ideal_resolution[1] == 0 {
            return Err("Invalid ideal resolution".to_string());
        }
        if !(self.camera.aspect_ratio.is_finite() && self.camera.aspect_ratio > 0.0) {
            return Err("Aspect ratio must be a positive number".to_string());
        }

        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if !self.analysis.endpoint.starts_with("http://")
            && !self.analysis.endpoint.starts_with("https://")
        {
            return Err("Analysis endpoint must be an http(s) URL".to_string());
        }
        if self.analysis.request_timeout_ms == 0 {
            return Err("Analysis request timeout must be non-zero".to_string());
        }

        if !self.intake.endpoint.starts_with("http://")
            && !self.intake.endpoint.starts_with("https://")
        {
            return Err("Intake endpoint must be an http(s) URL".to_string());
        }
        if self.intake.request_timeout_ms == 0 {
            return Err("Intake request timeout must be non-zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FlowConfig::default();
        assert_eq!(config.camera.ideal_resolution, [1920, 1080]);
        assert_eq!(config.camera.facing_mode, FacingMode::User);
        assert_eq!(config.capture.jpeg_quality, 90);
        assert_eq!(config.analysis.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        let config = FlowConfig::default();
        assert!(config.validate().is_ok());

        let mut bad_resolution = config.clone();
        bad_resolution.camera.ideal_resolution = [0, 0];
        assert!(bad_resolution.validate().is_err());

        let mut bad_quality = FlowConfig::default();
        bad_quality.capture.jpeg_quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut bad_endpoint = FlowConfig::default();
        bad_endpoint.analysis.endpoint = "ftp://example.com".to_string();
        assert!(bad_endpoint.validate().is_err());

        let mut no_timeout = FlowConfig::default();
        no_timeout.analysis.request_timeout_ms = 0;
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("nested").join("capture-flow.toml");

        let mut config = FlowConfig::default();
        config.capture.jpeg_quality = 75;
        config.analysis.request_timeout_ms = 5_000;
        config.save_to_file(&config_path).unwrap();

        let loaded = FlowConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let config = FlowConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[analysis]"));
        assert!(toml_string.contains("[intake]"));
        assert!(toml_string.contains("facing_mode = \"user\""));
        assert!(toml_string.contains("request_timeout_ms"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: FlowConfig = toml::from_str("[capture]\njpeg_quality = 60\n").unwrap();
        assert_eq!(config.capture.jpeg_quality, 60);
        assert!(config.capture.mirror_front_camera);
        assert_eq!(config.analysis.endpoint, DEFAULT_ANALYSIS_ENDPOINT);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = FlowConfig::load_from_file("nonexistent_file.toml");
        assert_eq!(result.unwrap(), FlowConfig::default());
    }

    #[test]
    fn test_load_invalid_values_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[capture]\njpeg_quality = 0\n").unwrap();
        assert!(matches!(
            FlowConfig::load_from_file(&path),
            Err(FlowError::Config(_))
        ));
    }
}
