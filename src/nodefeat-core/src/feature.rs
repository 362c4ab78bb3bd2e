//! The declared feature contract.

use crate::types::{NodeConfiguration, PodInfo};
use crate::version::Version;

/// A declared node capability with compatibility inference.
///
/// Every decision function must be pure and total. When an implementation
/// cannot decide it returns `false`, the conservative answer.
///
/// Inference polarity: `true` means the pod (or the transition) is compatible
/// with a node that does *not* declare this feature. `false` means the pod
/// depends on the feature, so the engine only admits it on nodes whose
/// discovered set contains [`Feature::name`].
///
/// Discovery overrides inference. A feature present in the discovered set is
/// satisfied and its inference functions are not called. A feature that must
/// veto a change on every node should therefore never report itself as
/// discovered.
pub trait Feature: Send + Sync {
    /// Stable, non-empty identifier. Also the name of the gating switch.
    fn name(&self) -> &str;

    /// Whether the node, as configured, has this capability.
    fn discover(&self, cfg: &NodeConfiguration) -> bool;

    /// Whether a new pod can be placed without this feature.
    fn infer_for_scheduling(&self, pod: &PodInfo) -> bool;

    /// Whether the `old -> new` transition can be applied without this feature.
    fn infer_for_update(&self, old: &PodInfo, new: &PodInfo) -> bool;

    /// Highest version whose semantics this feature models. `None` is unbounded.
    fn max_version(&self) -> Option<Version> {
        None
    }
}

impl std::fmt::Debug for dyn Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name())
            .field("max_version", &self.max_version())
            .finish()
    }
}
