//! Scheduling and update decisions.

use crate::version::{exceeds, Version};
use crate::{
    DiscoveredSet, Feature, FeatureGate, FeatureRegistry, NodeConfiguration, PodInfo,
    RegistryError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Engine tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Stop at the first blocking feature instead of reporting all of them.
    #[serde(default)]
    pub fail_fast: bool,
}

/// Outcome of a scheduling or update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the pod may proceed.
    pub allowed: bool,
    /// Features that vetoed the decision, in registration order.
    pub blocking_features: Vec<String>,
    /// Features skipped because a version exceeded their `max_version`.
    pub excluded_features: Vec<String>,
}

impl Decision {
    fn from_blockers(blocking_features: Vec<String>, excluded_features: Vec<String>) -> Self {
        Self {
            allowed: blocking_features.is_empty(),
            blocking_features,
            excluded_features,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// First blocking feature, if denied.
    pub fn first_blocker(&self) -> Option<&str> {
        self.blocking_features.first().map(String::as_str)
    }

    /// `(allowed, blocking feature names)`.
    pub fn into_parts(self) -> (bool, Vec<String>) {
        (self.allowed, self.blocking_features)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.allowed {
            write!(f, "ALLOW")
        } else {
            write!(f, "DENY [{}]", self.blocking_features.join(", "))
        }
    }
}

/// Features a pod depends on, computed without looking at a node's declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Features whose inference failed, in registration order.
    pub features: Vec<String>,
    /// Features skipped because a version exceeded their `max_version`.
    pub excluded: Vec<String>,
}

impl Requirements {
    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|feature| feature == name)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Check<'a> {
    Scheduling(&'a PodInfo),
    Update {
        old: &'a PodInfo,
        new: &'a PodInfo,
    },
}

impl Check<'_> {
    fn infer(&self, feature: &dyn Feature) -> bool {
        match self {
            Check::Scheduling(pod) => feature.infer_for_scheduling(pod),
            Check::Update { old, new } => feature.infer_for_update(old, new),
        }
    }

    fn pod_versions(&self) -> [Option<&Version>; 2] {
        match self {
            Check::Scheduling(pod) => [pod.version.as_ref(), None],
            Check::Update { old, new } => [old.version.as_ref(), new.version.as_ref()],
        }
    }

    fn out_of_bound(&self, node: &NodeConfiguration, feature: &dyn Feature) -> bool {
        let bound = feature.max_version();
        if bound.is_none() {
            return false;
        }
        std::iter::once(node.version.as_ref())
            .chain(self.pod_versions())
            .any(|version| exceeds(version, bound.as_ref()))
    }
}

/// Folds every applicable feature's verdict into one decision.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    registry: Arc<FeatureRegistry>,
    options: EngineOptions,
}

impl DecisionEngine {
    pub fn new(registry: Arc<FeatureRegistry>) -> Self {
        Self {
            registry,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Can a new pod be placed on the node?
    pub fn can_schedule(
        &self,
        pod: &PodInfo,
        node: &NodeConfiguration,
        discovered: &DiscoveredSet,
    ) -> Decision {
        let decision = self.evaluate(Check::Scheduling(pod), node, discovered);
        if !decision.allowed {
            debug!(
                pod = %pod.key(),
                node = %node.name,
                blocking = ?decision.blocking_features,
                "pod scheduling denied"
            );
        }
        decision
    }

    /// Can the `old -> new` update be applied to a pod running on the node?
    pub fn can_update(
        &self,
        old: &PodInfo,
        new: &PodInfo,
        node: &NodeConfiguration,
        discovered: &DiscoveredSet,
    ) -> Decision {
        let decision = self.evaluate(Check::Update { old, new }, node, discovered);
        if !decision.allowed {
            debug!(
                pod = %new.key(),
                node = %node.name,
                blocking = ?decision.blocking_features,
                "pod update denied"
            );
        }
        decision
    }

    /// Discover the node's features with `gate`, then check scheduling.
    pub fn can_schedule_on(
        &self,
        pod: &PodInfo,
        node: &NodeConfiguration,
        gate: &dyn FeatureGate,
    ) -> Result<Decision, RegistryError> {
        let discovered = self.registry.discovered(node, gate)?;
        Ok(self.can_schedule(pod, node, &discovered))
    }

    /// Discover the node's features with `gate`, then check the update.
    pub fn can_update_on(
        &self,
        old: &PodInfo,
        new: &PodInfo,
        node: &NodeConfiguration,
        gate: &dyn FeatureGate,
    ) -> Result<Decision, RegistryError> {
        let discovered = self.registry.discovered(node, gate)?;
        Ok(self.can_update(old, new, node, &discovered))
    }

    /// Features a new pod depends on, for a node at `node`'s version.
    pub fn required_for_scheduling(&self, pod: &PodInfo, node: &NodeConfiguration) -> Requirements {
        self.required(Check::Scheduling(pod), node)
    }

    /// Features an `old -> new` transition depends on.
    pub fn required_for_update(
        &self,
        old: &PodInfo,
        new: &PodInfo,
        node: &NodeConfiguration,
    ) -> Requirements {
        self.required(Check::Update { old, new }, node)
    }

    /// Check precomputed requirements against a node's declared features.
    ///
    /// Gives the same answer as [`DecisionEngine::can_schedule`] or
    /// [`DecisionEngine::can_update`] for the pod the requirements came from.
    pub fn match_node(&self, required: &Requirements, discovered: &DiscoveredSet) -> Decision {
        let mut blocking: Vec<String> = required
            .features
            .iter()
            .filter(|name| !discovered.contains(name.as_str()))
            .cloned()
            .collect();
        if self.options.fail_fast {
            blocking.truncate(1);
        }
        Decision::from_blockers(blocking, required.excluded.clone())
    }

    fn required(&self, check: Check<'_>, node: &NodeConfiguration) -> Requirements {
        let mut required = Requirements::default();
        for feature in self.registry.features() {
            let feature: &dyn Feature = feature.as_ref();
            if check.out_of_bound(node, feature) {
                required.excluded.push(feature.name().to_string());
            } else if !check.infer(feature) {
                required.features.push(feature.name().to_string());
            }
        }
        required
    }

    fn evaluate(
        &self,
        check: Check<'_>,
        node: &NodeConfiguration,
        discovered: &DiscoveredSet,
    ) -> Decision {
        let mut blocking = Vec::new();
        let mut excluded = Vec::new();

        for feature in self.registry.features() {
            let feature: &dyn Feature = feature.as_ref();
            let name = feature.name();

            if check.out_of_bound(node, feature) {
                debug!(feature = %name, node = %node.name, "version exceeds feature bound");
                excluded.push(name.to_string());
                continue;
            }

            // Declared features satisfy any dependency; inference is not needed.
            if discovered.contains(name) {
                continue;
            }
            // Exclusions are still collected after the first blocker.
            if self.options.fail_fast && !blocking.is_empty() {
                continue;
            }

            if !check.infer(feature) {
                blocking.push(name.to_string());
            }
        }

        Decision::from_blockers(blocking, excluded)
    }
}
