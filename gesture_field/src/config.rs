//! Application configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) is a
//! valid configuration:
//!
//! ```toml
//! seed = 7
//! initial_chaos = 0.1
//! initial_scale = 0.5
//!
//! [window]
//! width = 960
//! height = 640
//!
//! [field]
//! count = 800
//!
//! [detector]
//! kind = "pipe"
//! command = ["python3", "hand_detect.py"]
//! min_score = 0.5
//!
//! [analysis]
//! enabled = true
//! query = "what is the field doing?"
//! ```

use std::path::Path;

use particle_field::{ControlSignal, FieldConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window:        WindowConfig,
    pub field:         FieldConfig,
    pub detector:      DetectorConfig,
    pub analysis:      AnalysisConfig,
    /// RNG seed for the particle pool; random when absent.
    pub seed:          Option<u64>,
    pub initial_chaos: f32,
    pub initial_scale: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            window:        WindowConfig::default(),
            field:         FieldConfig::default(),
            detector:      DetectorConfig::default(),
            analysis:      AnalysisConfig::default(),
            seed:          None,
            initial_chaos: ControlSignal::DEFAULT_CHAOS,
            initial_scale: ControlSignal::DEFAULT_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width:  usize,
    pub height: usize,
    /// Frame-rate cap.
    pub fps:    u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { width: 960, height: 640, fps: 60 }
    }
}

/// Which hand detector feeds the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Keyboard-driven synthetic hands.
    Simulated,
    /// External landmark process speaking JSON lines.
    Pipe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub kind:      DetectorKind,
    /// Program and arguments for [`DetectorKind::Pipe`].
    pub command:   Vec<String>,
    /// Hands below this confidence are ignored.
    pub min_score: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            kind:      DetectorKind::Simulated,
            command:   Vec::new(),
            min_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    /// Question sent along with every analysis request.
    pub query:   Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig { enabled: true, query: None }
    }
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width < 64 || self.window.height < 64 {
            return Err(ConfigError::Invalid(format!(
                "window {}×{} is smaller than 64×64",
                self.window.width, self.window.height
            )));
        }
        if self.window.fps == 0 {
            return Err(ConfigError::Invalid("window.fps must be positive".to_string()));
        }
        if let Some(problem) = self.field.problem() {
            return Err(ConfigError::Invalid(problem));
        }
        for (name, v) in [("initial_chaos", self.initial_chaos), ("initial_scale", self.initial_scale)] {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                return Err(ConfigError::Invalid(format!("{} must be within 0–1, got {}", name, v)));
            }
        }
        if !(0.0..=1.0).contains(&self.detector.min_score) {
            return Err(ConfigError::Invalid(format!(
                "detector.min_score must be within 0–1, got {}",
                self.detector.min_score
            )));
        }
        if self.detector.kind == DetectorKind::Pipe && self.detector.command.is_empty() {
            return Err(ConfigError::Invalid(
                "detector.kind = \"pipe\" needs detector.command".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.field.count, 800);
        assert_eq!(cfg.detector.kind, DetectorKind::Simulated);
    }

    #[test]
    fn partial_tables_fill_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            seed = 9
            [field]
            count = 120
            [detector]
            kind = "pipe"
            command = ["python3", "hand_detect.py"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.field.count, 120);
        assert_eq!(cfg.field.max_size, FieldConfig::default().max_size);
        assert_eq!(cfg.detector.kind, DetectorKind::Pipe);
        assert_eq!(cfg.detector.min_score, 0.5);
        assert_eq!(cfg.window.width, 960);
    }

    #[test]
    fn pipe_without_command_is_rejected() {
        let err = AppConfig::from_toml_str("[detector]\nkind = \"pipe\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn out_of_range_initial_values_are_rejected() {
        assert!(AppConfig::from_toml_str("initial_chaos = 1.5").is_err());
        assert!(AppConfig::from_toml_str("initial_scale = -0.1").is_err());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[window\nwidth = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn tiny_window_is_rejected() {
        assert!(AppConfig::from_toml_str("[window]\nwidth = 10").is_err());
    }
}
