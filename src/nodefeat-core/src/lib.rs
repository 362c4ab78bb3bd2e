//! Node declared feature registry.
//!
//! Discovers which optional capabilities a node actually has and decides
//! whether a pod may be scheduled there, or whether an in-place pod update is
//! compatible with the node:
//!
//! ```text
//! NodeConfiguration ──discover (gate filtered)──► DiscoveredSet
//!                                                     │
//! PodInfo (old/new) ──infer_for_scheduling/update─────┤
//!                                                     ▼
//!                                   DecisionEngine ─► Decision { allowed, blocking }
//! ```
//!
//! A feature whose `max_version` is below the node or pod version is left out
//! of the decision entirely.


pub mod builtin;
pub mod config;
pub mod engine;
pub mod error;
pub mod feature;
pub mod feature_set;
pub mod gate;
pub mod registry;
pub mod types;
pub mod version;

pub use config::NodeFeaturesConfig;
pub use engine::{Decision, DecisionEngine, EngineOptions, Requirements};
pub use error::{ConfigError, GateError, RegistryError};
pub use feature::Feature;
pub use feature_set::{DiscoveredSet, FeatureSet};
pub use gate::{FeatureGate, GateSpec, GateStage, MemoryFeatureGate};
pub use registry::FeatureRegistry;
pub use types::{NodeConfiguration, PodInfo, ResourceList};
pub use version::{parse_version, Version};
