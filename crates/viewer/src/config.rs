use std::path::{Path, PathBuf};

use blockworld_input::CaptureErrorPolicy;
use blockworld_scene::SceneLayout;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Blockworld".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Height of the rig above the floor.
    pub eye_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 1.0,
            far: 10_000.0,
            eye_height: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Radians of rotation per pixel of pointer motion.
    pub mouse_sensitivity: f32,
    /// Movement speed in scene units per second.
    pub move_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.002,
            move_speed: 100.0,
        }
    }
}

/// Everything tunable about the viewer. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneLayout,
    pub controls: ControlsConfig,
    pub capture_errors: CaptureErrorPolicy,
}

impl ViewerConfig {
    /// Read, parse and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return Err(ConfigError::Invalid(format!(
                "need 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if !(self.scene.unit_size > 0.0) || self.scene.units == 0 {
            return Err(ConfigError::Invalid(
                "scene unit_size and units must be positive".into(),
            ));
        }
        let controls = &self.controls;
        for (name, value) in [
            ("mouse_sensitivity", controls.mouse_sensitivity),
            ("move_speed", controls.move_speed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "controls.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
