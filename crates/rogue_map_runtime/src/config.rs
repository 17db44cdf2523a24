//! Engine configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! default shown below.
//!
//! ```toml
//! [lighting]
//! radius = 6.0        # falloff radius in tiles
//! constant = 1.0      # attenuation: intensity / (constant + linear*d + quadratic*d^2)
//! linear = 0.02
//! quadratic = 0.0239
//! max_intensity = 1.0 # clamp for the composited field
//!
//! [assets]
//! map_dir = ""
//! map_extensions = ["tmx", "tmj", "json"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Light falloff and compositing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Distance in tiles at which an emitter stops contributing
    pub radius: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Upper bound of the composited field
    pub max_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            constant: 1.0,
            linear: 0.02,
            quadratic: 0.0239,
            max_intensity: 1.0,
        }
    }
}

impl LightingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f32, bool); 5] = [
            ("lighting.radius", self.radius, self.radius > 0.0),
            ("lighting.constant", self.constant, self.constant > 0.0),
            ("lighting.linear", self.linear, self.linear >= 0.0),
            ("lighting.quadratic", self.quadratic, self.quadratic >= 0.0),
            ("lighting.max_intensity", self.max_intensity, self.max_intensity > 0.0),
        ];
        for (key, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{value} is out of range"),
                });
            }
        }
        Ok(())
    }
}

/// Where map documents are looked up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory of map documents, relative to the asset root
    pub map_dir: String,
    /// Extensions tried in order when a map is requested by id
    pub map_extensions: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            map_dir: String::new(),
            map_extensions: vec!["tmx".to_string(), "tmj".to_string(), "json".to_string()],
        }
    }
}

impl AssetsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_extensions.is_empty() {
            return Err(ConfigError::Invalid {
                key: "assets.map_extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if let Some(bad) = self.map_extensions.iter().find(|e| e.is_empty() || e.starts_with('.')) {
            return Err(ConfigError::Invalid {
                key: "assets.map_extensions",
                reason: format!("'{bad}' must be a bare extension like \"tmx\""),
            });
        }
        Ok(())
    }

    /// Candidate document paths for a map id, in lookup order
    pub fn map_paths(&self, map_id: &str) -> Vec<String> {
        let dir = self.map_dir.trim_end_matches('/');
        self.map_extensions
            .iter()
            .map(|ext| {
                if dir.is_empty() {
                    format!("{map_id}.{ext}")
                } else {
                    format!("{dir}/{map_id}.{ext}")
                }
            })
            .collect()
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lighting: LightingConfig,
    pub assets: AssetsConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lighting.validate()?;
        self.assets.validate()
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.lighting.radius, 6.0);
        assert_eq!(config.lighting.quadratic, 0.0239);
        assert_eq!(config.assets.map_extensions, vec!["tmx", "tmj", "json"]);
    }

    #[test]
    fn test_partial_section() {
        let config = EngineConfig::from_toml_str(
            r#"
[lighting]
radius = 4.0

[assets]
map_dir = "maps"
"#,
        )
        .unwrap();
        assert_eq!(config.lighting.radius, 4.0);
        assert_eq!(config.lighting.constant, 1.0);
        assert_eq!(config.assets.map_dir, "maps");
        assert_eq!(
            config.assets.map_paths("tavern_1a"),
            vec!["maps/tavern_1a.tmx", "maps/tavern_1a.tmj", "maps/tavern_1a.json"]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "[lighting]\nradius = 0.0",
            "[lighting]\nconstant = 0.0",
            "[lighting]\nlinear = -1.0",
            "[lighting]\nmax_intensity = -0.5",
            "[assets]\nmap_extensions = []",
            "[assets]\nmap_extensions = [\".tmx\"]",
        ] {
            let err = EngineConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{text}: {err}");
        }
        assert!(matches!(
            EngineConfig::from_toml_str("[lighting]\nradius = \"far\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let config = EngineConfig {
            lighting: LightingConfig {
                radius: 3.0,
                ..Default::default()
            },
            ..Default::default()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);

        let err = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
