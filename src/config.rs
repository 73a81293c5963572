use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::convergence::Norm;
use crate::error::{Result, SolverError};

/// Run settings shared by the steady and transient drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Pseudo iterations per solve (per real time step when transient).
    pub max_iterations: usize,
    pub convergence_norm: Norm,
    pub courant_number: f64,
    /// Where residual histories and solution dumps go; nothing is written
    /// when unset.
    pub working_directory: Option<PathBuf>,
    pub log_level: String,
    pub show_progress: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_iterations: 1000,
            convergence_norm: Norm::One,
            courant_number: 0.5,
            working_directory: None,
            log_level: "info".to_string(),
            show_progress: true,
        }
    }
}

impl SolverConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::Config(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.courant_number > 0.0) {
            return Err(SolverError::Config(format!(
                "courant_number must be positive, got {}",
                self.courant_number
            )));
        }
        Ok(())
    }

    /// Tracing level named by `log_level`; unknown names fall back to info.
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Creates the working directory if one is configured.
    pub fn prepare_working_directory(&self) -> Result<Option<&Path>> {
        match &self.working_directory {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(Some(dir.as_path()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{ "max_iterations": 20, "convergence_norm": "two" }"#).unwrap();
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.convergence_norm, Norm::Two);
        assert_eq!(config.courant_number, 0.5);
        assert!(config.show_progress);
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = SolverConfig {
            courant_number: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SolverError::Config(_))));
        let config = SolverConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = std::env::temp_dir().join("pp_fvm_config_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solver.json");
        fs::write(&path, r#"{ "courant_number": 0.9, "log_level": "DEBUG" }"#).unwrap();
        let config = SolverConfig::from_json_file(&path).unwrap();
        assert_eq!(config.courant_number, 0.9);
        assert_eq!(config.level(), Level::DEBUG);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SolverConfig::from_json_file(&path),
            Err(SolverError::Json(_))
        ));
        assert!(matches!(
            SolverConfig::from_json_file(dir.join("missing.json")),
            Err(SolverError::Io(_))
        ));
    }
}
