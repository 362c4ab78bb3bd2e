//! Feature registry.

use crate::builtin::builtin_features;
use crate::version::exceeds;
use crate::{DiscoveredSet, Feature, FeatureGate, NodeConfiguration, RegistryError};
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered collection of declared features.
///
/// Registration order is the evaluation order for discovery and decisions.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: Vec<Arc<dyn Feature>>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the builtin features.
    pub fn with_builtin_features() -> Result<Self, RegistryError> {
        Self::from_features(builtin_features())
    }

    /// Build a registry, failing on the first invalid or duplicate feature.
    pub fn from_features<I>(features: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn Feature>>,
    {
        let mut registry = Self::new();
        for feature in features {
            registry.register(feature)?;
        }
        Ok(registry)
    }

    /// Register a feature.
    pub fn register(&mut self, feature: Arc<dyn Feature>) -> Result<(), RegistryError> {
        let name = feature.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateFeature(name.to_string()));
        }

        info!(feature = %name, "registered node feature");
        self.features.push(feature);
        Ok(())
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Feature>> {
        self.features.iter().find(|f| f.name() == name)
    }

    /// Features in registration order.
    pub fn features(&self) -> impl Iterator<Item = &Arc<dyn Feature>> {
        self.features.iter()
    }

    /// Feature names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Check that every registered feature has a gate.
    pub fn validate_gates(&self, gate: &dyn FeatureGate) -> Result<(), RegistryError> {
        for feature in &self.features {
            if gate.enabled(feature.name()).is_err() {
                return Err(RegistryError::MissingGate(feature.name().to_string()));
            }
        }
        Ok(())
    }

    /// Features the node declares.
    ///
    /// A feature is included when its gate is enabled, the node version does
    /// not exceed its `max_version`, and `discover` returns true. Features past
    /// their bound are never asked to discover.
    pub fn discovered(
        &self,
        cfg: &NodeConfiguration,
        gate: &dyn FeatureGate,
    ) -> Result<DiscoveredSet, RegistryError> {
        let mut discovered = DiscoveredSet::new();

        for feature in &self.features {
            let name = feature.name();
            if !gate.enabled(name)? {
                continue;
            }
            if exceeds(cfg.version.as_ref(), feature.max_version().as_ref()) {
                debug!(
                    feature = %name,
                    node = %cfg.name,
                    "node version exceeds feature bound, skipping discovery"
                );
                continue;
            }
            if feature.discover(cfg) {
                discovered.insert(name);
            }
        }

        debug!(node = %cfg.name, discovered = ?discovered, "node feature discovery complete");
        Ok(discovered)
    }
}
