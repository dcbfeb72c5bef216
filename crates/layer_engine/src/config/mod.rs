//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot drive a scene
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration
///
/// Controls the fixed-step driver and the layers created at start-up.
/// Layers are created in the listed order, which is also the order the
/// scene runs them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name given to the scene
    pub scene_name: String,
    /// Length of one fixed update step, in seconds
    pub fixed_timestep: f32,
    /// Maximum fixed steps run in a single frame
    pub max_fixed_steps: u32,
    /// Layers created when the engine starts
    pub layers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scene_name: "main".to_string(),
            fixed_timestep: 1.0 / 60.0,
            max_fixed_steps: 5,
            layers: vec!["world".to_string()],
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check that the configuration can drive a scene
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_fixed_steps == 0 {
            return Err(ConfigError::Invalid("max_fixed_steps must be at least 1".to_string()));
        }
        for (i, name) in self.layers.iter().enumerate() {
            if self.layers[..i].contains(name) {
                return Err(ConfigError::Invalid(format!("duplicate layer name: {name}")));
            }
        }
        Ok(())
    }
}
