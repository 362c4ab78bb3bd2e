//! Gate and engine configuration.

use crate::{ConfigError, EngineOptions, FeatureGate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Configuration for feature gates and the decision engine.
///
/// ```toml
/// [feature_gates]
/// GPUSupport = true
///
/// [engine]
/// fail_fast = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFeaturesConfig {
    /// Gate overrides (gate name -> enabled).
    #[serde(default)]
    pub feature_gates: BTreeMap<String, bool>,
    /// Engine options.
    #[serde(default)]
    pub engine: EngineOptions,
}

impl NodeFeaturesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            gates = config.feature_gates.len(),
            "loaded node feature config"
        );
        Ok(config)
    }

    /// Parse TOML text. Missing sections default and non-boolean gate values are ignored.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = content.parse()?;
        let mut config = Self::default();

        if let Some(toml::Value::Table(gates)) = table.get("feature_gates") {
            for (name, value) in gates {
                if let toml::Value::Boolean(enabled) = value {
                    config.feature_gates.insert(name.clone(), *enabled);
                }
            }
        }

        if let Some(engine) = table.get("engine") {
            config.engine = engine.clone().try_into()?;
        }

        Ok(config)
    }

    /// Save to a TOML file.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Explicit override for a gate, if any.
    pub fn gate(&self, name: &str) -> Option<bool> {
        self.feature_gates.get(name).copied()
    }

    pub fn set_gate(&mut self, name: &str, enabled: bool) {
        self.feature_gates.insert(name.to_string(), enabled);
    }

    /// Remove an override.
    pub fn reset_gate(&mut self, name: &str) {
        self.feature_gates.remove(name);
    }

    pub fn engine_options(&self) -> EngineOptions {
        self.engine
    }

    /// Push every override into `gate`.
    ///
    /// All overrides are checked first. If any is rejected the gate is left
    /// untouched.
    pub fn apply_to(&self, gate: &dyn FeatureGate) -> Result<(), ConfigError> {
        for (name, enabled) in &self.feature_gates {
            gate.check_enabled(name, *enabled)?;
        }
        for (name, enabled) in &self.feature_gates {
            gate.set_enabled(name, *enabled)?;
        }
        Ok(())
    }
}
