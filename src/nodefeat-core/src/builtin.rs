//! Builtin declared features.

use crate::{Feature, GateSpec, NodeConfiguration, PodInfo};
use std::sync::Arc;

pub const GPU_SUPPORT: &str = "GPUSupport";
pub const IN_PLACE_POD_RESIZE: &str = "InPlacePodResize";

/// Extended resource requested by GPU workloads.
pub const GPU_RESOURCE: &str = "nvidia.com/gpu";

/// Node capability markers.
pub const GPU_CAPABILITY: &str = "gpu";
pub const IN_PLACE_RESIZE_CAPABILITY: &str = "in-place-resize";

/// GPU passthrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuSupport;

impl Feature for GpuSupport {
    fn name(&self) -> &str {
        GPU_SUPPORT
    }

    fn discover(&self, cfg: &NodeConfiguration) -> bool {
        cfg.has_capability(GPU_CAPABILITY)
    }

    fn infer_for_scheduling(&self, pod: &PodInfo) -> bool {
        pod.requested(GPU_RESOURCE) == 0
    }

    fn infer_for_update(&self, old: &PodInfo, new: &PodInfo) -> bool {
        // Only an update that newly adds a GPU request depends on the node.
        new.requested(GPU_RESOURCE) == 0 || old.requested(GPU_RESOURCE) > 0
    }
}

/// Resizing a running pod's resource requests without a restart.
#[derive(Debug, Clone, Copy, Default)]
pub struct InPlacePodResize;

impl Feature for InPlacePodResize {
    fn name(&self) -> &str {
        IN_PLACE_POD_RESIZE
    }

    fn discover(&self, cfg: &NodeConfiguration) -> bool {
        cfg.has_capability(IN_PLACE_RESIZE_CAPABILITY)
    }

    fn infer_for_scheduling(&self, _pod: &PodInfo) -> bool {
        true
    }

    fn infer_for_update(&self, old: &PodInfo, new: &PodInfo) -> bool {
        old.requests == new.requests
    }
}

/// Builtin features in evaluation order.
pub fn builtin_features() -> Vec<Arc<dyn Feature>> {
    vec![
        Arc::new(GpuSupport) as Arc<dyn Feature>,
        Arc::new(InPlacePodResize),
    ]
}

/// Default gates for the builtin features.
pub fn builtin_gates() -> Vec<(&'static str, GateSpec)> {
    vec![
        (GPU_SUPPORT, GateSpec::beta()),
        (IN_PLACE_POD_RESIZE, GateSpec::alpha()),
    ]
}
