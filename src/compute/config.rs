use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_calculation_configuration() -> String {
    "Default".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Name attached to every graph and passed to the function resolver.
    #[serde(default = "default_calculation_configuration")]
    pub calculation_configuration: String,
    /// Run `prune_unused_outputs` before a graph is returned.
    pub prune_unused_outputs: bool,
    /// Log a dependency trace of each terminal node at debug level.
    pub log_graph_trace: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            calculation_configuration: default_calculation_configuration(),
            prune_unused_outputs: false,
            log_graph_trace: false,
        }
    }
}

impl BuilderConfig {
    pub fn new(calculation_configuration: impl Into<String>) -> Self {
        Self { calculation_configuration: calculation_configuration.into(), ..Default::default() }
    }

    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune_unused_outputs = prune;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg = BuilderConfig::from_json_str(r#"{ "prune_unused_outputs": true }"#).unwrap();
        assert_eq!(cfg.calculation_configuration, "Default");
        assert!(cfg.prune_unused_outputs);
        assert!(!cfg.log_graph_trace);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "calculation_configuration": "Risk", "log_graph_trace": true }}"#).unwrap();
        let cfg = BuilderConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg, BuilderConfig { calculation_configuration: "Risk".into(), prune_unused_outputs: false, log_graph_trace: true });
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let err = BuilderConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        let err = BuilderConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
