//! Node and pod snapshots consumed by features.

use crate::version::Version;
use std::collections::{BTreeMap, BTreeSet};

/// Resource name to quantity in base units.
pub type ResourceList = BTreeMap<String, u64>;

/// Snapshot of a node's observable configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfiguration {
    /// Node name.
    pub name: String,
    /// Operative node version, if known.
    pub version: Option<Version>,
    /// Capability markers reported by the node (e.g. `gpu`).
    pub capabilities: BTreeSet<String>,
    /// Kubelet flags and other string settings.
    pub settings: BTreeMap<String, String>,
}

impl NodeConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn get_setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }
}

/// Snapshot of the parts of a pod relevant to feature compatibility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodInfo {
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Labels.
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    pub annotations: BTreeMap<String, String>,
    /// Aggregate resource requests across containers.
    pub requests: ResourceList,
    /// Version of the component that produced this pod, if known.
    pub version: Option<Version>,
}

impl PodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn request(mut self, resource: impl Into<String>, quantity: u64) -> Self {
        self.requests.insert(resource.into(), quantity);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Requested quantity of a resource, zero when absent.
    pub fn requested(&self, resource: &str) -> u64 {
        self.requests.get(resource).copied().unwrap_or(0)
    }

    /// `namespace/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}
