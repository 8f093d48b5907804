use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::qlearning::QLearningParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    AStar,
    QLearning,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub qlearning: QLearningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
    #[serde(default = "default_map_path")]
    pub map_path: String,
    /// Delay between ticks; 0 runs flat out
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: usize,
}

#[derive(Debug, Deserialize)]
pub struct QLearningConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_max_steps_per_episode")]
    pub max_steps_per_episode: usize,
    #[serde(default = "default_training_episodes")]
    pub training_episodes: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Tracing directive used when RUST_LOG is unset or fails to parse
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_enable_run_log")]
    pub enable_run_log: bool,
    #[serde(default = "default_run_log_path")]
    pub run_log_path: String,
}

// Default values
fn default_algorithm() -> Algorithm { Algorithm::AStar }
fn default_map_path() -> String { "maps/default.csv".to_string() }
fn default_tick_interval_ms() -> u64 { 100 }
fn default_max_ticks() -> usize { 10_000 }
fn default_alpha() -> f64 { 0.2 }
fn default_gamma() -> f64 { 0.99 }
fn default_max_steps_per_episode() -> usize { 200 }
fn default_training_episodes() -> usize { 100 }
fn default_filter() -> String { "gridplan=info".to_string() }
fn default_enable_run_log() -> bool { true }
fn default_run_log_path() -> String { "run_log.json".to_string() }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            map_path: default_map_path(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            gamma: default_gamma(),
            max_steps_per_episode: default_max_steps_per_episode(),
            training_episodes: default_training_episodes(),
            seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            enable_run_log: default_enable_run_log(),
            run_log_path: default_run_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            qlearning: QLearningConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl QLearningConfig {
    pub fn to_params(&self) -> QLearningParams {
        QLearningParams {
            alpha: self.alpha,
            gamma: self.gamma,
            max_steps_per_episode: self.max_steps_per_episode,
            training_episodes: self.training_episodes,
            seed: self.seed,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it is missing or invalid.
    ///
    /// Returns a note describing where the configuration came from, so the
    /// caller can log it once logging is set up.
    pub fn load_or_default(path: &Path) -> (Self, String) {
        if !path.exists() {
            let note = format!("No {} found, using default configuration", path.display());
            return (Config::default(), note);
        }
        match Self::load_from(path) {
            Ok(config) => (config, format!("Loaded configuration from {}", path.display())),
            Err(e) => {
                let note = format!("Failed to load {}: {}; using default configuration", path.display(), e);
                (Config::default(), note)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.qlearning;
        if !(q.alpha > 0.0 && q.alpha <= 1.0) {
            return Err(ConfigError::Validation(format!("alpha must be in (0, 1], got {}", q.alpha)));
        }
        if !(0.0..1.0).contains(&q.gamma) {
            return Err(ConfigError::Validation(format!("gamma must be in [0, 1), got {}", q.gamma)));
        }
        if self.simulation.max_ticks == 0 {
            return Err(ConfigError::Validation("max_ticks must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.simulation.algorithm, Algorithm::AStar);
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.qlearning.to_params(), QLearningParams::default());
        assert!(config.logging.enable_run_log);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [simulation]
            algorithm = "qlearning"
            map_path = "maps/maze.csv"

            [qlearning]
            training_episodes = 300
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.algorithm, Algorithm::QLearning);
        assert_eq!(config.simulation.map_path, "maps/maze.csv");
        assert_eq!(config.simulation.max_ticks, 10_000);

        let params = config.qlearning.to_params();
        assert_eq!(params.training_episodes, 300);
        assert_eq!(params.seed, Some(42));
        assert_eq!(params.alpha, 0.2);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let (config, note) = Config::load_or_default(Path::new("does/not/exist.toml"));
        assert_eq!(config.simulation.max_ticks, 10_000);
        assert!(note.starts_with("No does/not/exist.toml found"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_toml_str("[qlearning]\ngamma = 1.0\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[simulation]\nalgorithm = \"dijkstra\"\n"),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
