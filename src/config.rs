use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Prediction service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the trained artifacts.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_dir: default_model_dir(),
        }
    }
}

/// Offline trainer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Input CSV path.
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    /// Output directory for the artifacts.
    #[serde(default = "default_model_dir")]
    pub out_dir: PathBuf,
    /// Number of trees in the forest.
    #[serde(default = "default_trees")]
    pub trees: usize,
    /// Seed for the split and the forest.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Held-out fraction used for the evaluation report.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            out_dir: default_model_dir(),
            trees: default_trees(),
            seed: default_seed(),
            test_fraction: default_test_fraction(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("model")
}

fn default_dataset() -> PathBuf {
    PathBuf::from("data/dataset.csv")
}

fn default_trees() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

impl AppConfig {
    /// Load from `config/default.toml` (if present) and `TRIAGE__`-prefixed
    /// environment variables, e.g. `TRIAGE__SERVER__PORT=8080`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                Environment::with_prefix("TRIAGE")
                    .separator("__")
                    .try_parsing(true),
            );
        builder.build()?.try_deserialize()
    }

    /// Sanity checks collected into one list so a bad config reports every
    /// problem at once.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.server.host.is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.port == 0 {
            errors.push("server.port must not be zero".to_string());
        }
        if self.training.trees == 0 {
            errors.push("training.trees must be positive".to_string());
        }
        if !(self.training.test_fraction > 0.0 && self.training.test_fraction < 1.0) {
            errors.push("training.test_fraction must be strictly between 0 and 1".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_serving_contract() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.model_dir, PathBuf::from("model"));
        assert_eq!(config.training.trees, 100);
        assert_eq!(config.training.seed, 42);
        assert!((config.training.test_fraction - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.training.trees = 0;
        config.training.test_fraction = 1.5;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn missing_config_dir_falls_back_to_defaults() {
        let config = AppConfig::load_from("definitely/not/a/dir").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.training.trees, 100);
    }
}
