//! Integration tests for discovery and decisions driven through mocks.

use std::sync::Arc;

use nodefeat_core::{
    DecisionEngine, DiscoveredSet, Feature, FeatureGate, FeatureRegistry, GateError,
    NodeConfiguration, PodInfo, RegistryError, Version,
};
use nodefeat_testing::{MockCalls, MockFeature, MockFeatureGate};

fn gpu_feature() -> Arc<MockFeature> {
    Arc::new(
        MockFeature::named("GPUSupport")
            .with_discover(|cfg| cfg.get_setting("hasGPU") == Some("true"))
            .with_infer_for_scheduling(|pod| pod.requested("nvidia.com/gpu") == 0),
    )
}

fn immutable_labels() -> Arc<MockFeature> {
    Arc::new(
        MockFeature::named("ImmutableLabelSet")
            .with_discover(|_| false)
            .with_infer_for_scheduling(|_| true)
            .with_infer_for_update(|old, new| old.labels == new.labels),
    )
}

fn engine_for(features: Vec<Arc<dyn Feature>>) -> DecisionEngine {
    DecisionEngine::new(Arc::new(FeatureRegistry::from_features(features).unwrap()))
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gpu_support_gate_enabled() {
        let feature = gpu_feature();
        let engine = engine_for(vec![feature.clone() as Arc<dyn Feature>]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("GPUSupport", true).unwrap();

        let node = NodeConfiguration::new("gpu-node").setting("hasGPU", "true");
        let pod = PodInfo::new("trainer").request("nvidia.com/gpu", 2);

        let discovered = engine.registry().discovered(&node, &gate).unwrap();
        assert!(discovered.contains("GPUSupport"));

        let decision = engine.can_schedule(&pod, &node, &discovered);
        assert_eq!(decision.into_parts(), (true, vec![]));
        // declared features are never asked to infer
        assert_eq!(feature.calls().infer_for_scheduling, 0);
    }

    #[test]
    fn test_gpu_support_gate_disabled() {
        let feature = gpu_feature();
        let engine = engine_for(vec![feature.clone() as Arc<dyn Feature>]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("GPUSupport", false).unwrap();

        let node = NodeConfiguration::new("gpu-node").setting("hasGPU", "true");
        let pod = PodInfo::new("trainer").request("nvidia.com/gpu", 2);

        let discovered = engine.registry().discovered(&node, &gate).unwrap();
        assert!(discovered.is_empty());
        assert_eq!(feature.calls().discover, 0);

        let decision = engine.can_schedule(&pod, &node, &discovered);
        assert_eq!(
            decision.into_parts(),
            (false, vec!["GPUSupport".to_string()])
        );
    }

    #[test]
    fn test_immutable_label_set_rejects_label_change() {
        let engine = engine_for(vec![immutable_labels() as Arc<dyn Feature>]);
        let node = NodeConfiguration::new("node-a");
        let old = PodInfo::new("web").label("app", "web");
        let new = PodInfo::new("web").label("app", "api");

        for enabled in [true, false] {
            let gate = MockFeatureGate::new();
            gate.set_enabled("ImmutableLabelSet", enabled).unwrap();
            let discovered = engine.registry().discovered(&node, &gate).unwrap();

            let decision = engine.can_update(&old, &new, &node, &discovered);
            assert_eq!(
                decision.into_parts(),
                (false, vec!["ImmutableLabelSet".to_string()])
            );
        }
    }

    #[test]
    fn test_immutable_label_set_allows_other_updates() {
        let engine = engine_for(vec![immutable_labels() as Arc<dyn Feature>]);
        let node = NodeConfiguration::new("node-a");
        let old = PodInfo::new("web").label("app", "web").request("cpu", 100);
        let new = old.clone().request("cpu", 300);

        let decision = engine.can_update(&old, &new, &node, &DiscoveredSet::new());
        assert!(decision.allowed);
    }

    #[test]
    fn test_discovered_feature_skips_update_inference() {
        let feature = Arc::new(
            MockFeature::named("ImmutableLabelSet")
                .with_discover(|_| true)
                .with_infer_for_update(|old, new| old.labels == new.labels),
        );
        let engine = engine_for(vec![feature.clone() as Arc<dyn Feature>]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("ImmutableLabelSet", true).unwrap();

        let node = NodeConfiguration::new("node-a");
        let old = PodInfo::new("web").label("app", "web");
        let new = PodInfo::new("web").label("app", "api");

        let decision = engine.can_update_on(&old, &new, &node, &gate).unwrap();
        assert_eq!(decision.into_parts(), (true, vec![]));
        assert_eq!(
            feature.calls(),
            MockCalls {
                discover: 1,
                infer_for_scheduling: 0,
                infer_for_update: 0,
            }
        );
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_unique_and_non_empty() {
        let mut registry = FeatureRegistry::new();
        registry.register(gpu_feature()).unwrap();
        registry.register(immutable_labels()).unwrap();

        assert_eq!(
            registry.register(gpu_feature()),
            Err(RegistryError::DuplicateFeature("GPUSupport".to_string()))
        );
        assert_eq!(
            registry.register(Arc::new(MockFeature::named(""))),
            Err(RegistryError::EmptyName)
        );

        let names = registry.names();
        assert!(names.iter().all(|name| !name.is_empty()));
        assert_eq!(names, vec!["GPUSupport", "ImmutableLabelSet"]);
    }

    #[test]
    fn test_discovered_is_idempotent() {
        let engine = engine_for(vec![gpu_feature() as Arc<dyn Feature>, immutable_labels()]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("GPUSupport", true).unwrap();
        gate.set_enabled("ImmutableLabelSet", true).unwrap();
        let node = NodeConfiguration::new("n").setting("hasGPU", "true");

        let first = engine.registry().discovered(&node, &gate).unwrap();
        let second = engine.registry().discovered(&node, &gate).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_vec(), vec!["GPUSupport"]);
    }

    #[test]
    fn test_discovery_follows_registration_order() {
        let engine = engine_for(vec![gpu_feature() as Arc<dyn Feature>, immutable_labels()]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("GPUSupport", true).unwrap();
        gate.set_enabled("ImmutableLabelSet", false).unwrap();

        engine
            .registry()
            .discovered(&NodeConfiguration::new("n"), &gate)
            .unwrap();
        assert_eq!(gate.queries(), vec!["GPUSupport", "ImmutableLabelSet"]);
    }

    #[test]
    fn test_unknown_gate_fails_every_time() {
        let engine = engine_for(vec![gpu_feature() as Arc<dyn Feature>]);
        let gate = MockFeatureGate::new();
        let node = NodeConfiguration::new("n");

        for _ in 0..3 {
            assert_eq!(
                engine.registry().discovered(&node, &gate),
                Err(RegistryError::Gate(GateError::UnknownGate(
                    "GPUSupport".to_string()
                )))
            );
        }
        assert_eq!(gate.unknown_queries().len(), 3);
    }

    #[test]
    fn test_disabling_a_gate_only_removes_that_feature() {
        let lease = Arc::new(
            MockFeature::named("Lease")
                .with_discover(|cfg| cfg.has_capability("lease"))
                .with_infer_for_scheduling(|pod| !pod.labels.contains_key("lease")),
        );
        let engine = engine_for(vec![gpu_feature() as Arc<dyn Feature>, lease]);
        let gate = MockFeatureGate::new();
        gate.set_enabled("GPUSupport", true).unwrap();
        gate.set_enabled("Lease", true).unwrap();

        let node = NodeConfiguration::new("n")
            .setting("hasGPU", "true")
            .capability("lease");
        let pod = PodInfo::new("p").label("lease", "yes");

        let before = engine.registry().discovered(&node, &gate).unwrap();
        assert!(engine.can_schedule(&pod, &node, &before).allowed);

        // pod does not use GPUs, so losing that gate changes nothing
        gate.set_enabled("GPUSupport", false).unwrap();
        let after = engine.registry().discovered(&node, &gate).unwrap();
        assert!(after.is_subset(&before));
        assert!(engine.can_schedule(&pod, &node, &after).allowed);

        gate.set_enabled("Lease", false).unwrap();
        let without_lease = engine.registry().discovered(&node, &gate).unwrap();
        assert_eq!(
            engine.can_schedule(&pod, &node, &without_lease).blocking_features,
            vec!["Lease".to_string()]
        );
    }

    #[test]
    fn test_version_bound_excludes_and_never_invokes() {
        let bounded = Arc::new(
            MockFeature::new()
                .with_name("Legacy")
                .with_max_version(Some(Version::new(1, 34, 0)))
                .with_infer_for_scheduling(|_| false),
        );
        let engine = engine_for(vec![bounded.clone() as Arc<dyn Feature>]);
        let pod = PodInfo::new("p");

        let old_node = NodeConfiguration::new("old").version(Version::new(1, 34, 0));
        let denied = engine.can_schedule(&pod, &old_node, &DiscoveredSet::new());
        assert_eq!(denied.into_parts(), (false, vec!["Legacy".to_string()]));
        assert_eq!(bounded.calls().infer_for_scheduling, 1);

        let new_node = NodeConfiguration::new("new").version(Version::new(1, 35, 0));
        let allowed = engine.can_schedule(&pod, &new_node, &DiscoveredSet::new());
        assert!(allowed.allowed);
        assert_eq!(allowed.excluded_features, vec!["Legacy".to_string()]);
        assert_eq!(bounded.calls().infer_for_scheduling, 1);
    }

    #[test]
    fn test_pod_version_above_bound_excludes_update_check() {
        let bounded = Arc::new(
            MockFeature::new()
                .with_name("Legacy")
                .with_max_version(Some(Version::new(1, 34, 0))),
        );
        let engine = engine_for(vec![bounded.clone() as Arc<dyn Feature>]);
        let node = NodeConfiguration::new("n");
        let old = PodInfo::new("p").version(Version::new(1, 35, 0));
        let new = PodInfo::new("p").version(Version::new(1, 35, 0));

        let decision = engine.can_update(&old, &new, &node, &DiscoveredSet::new());
        assert!(decision.allowed);
        assert_eq!(bounded.calls(), MockCalls::default());
    }
}

// ============================================================================
// CONCURRENCY TESTS
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_shared_engine_across_threads() {
        let engine = Arc::new(engine_for(vec![
            gpu_feature() as Arc<dyn Feature>,
            immutable_labels(),
        ]));
        let gate = Arc::new(MockFeatureGate::new());
        gate.set_enabled("GPUSupport", true).unwrap();
        gate.set_enabled("ImmutableLabelSet", true).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = Arc::clone(&engine);
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || {
                    let node =
                        NodeConfiguration::new(format!("node-{i}")).setting("hasGPU", "true");
                    let pod = PodInfo::new(format!("pod-{i}")).request("nvidia.com/gpu", 1);
                    let gate: &dyn FeatureGate = gate.as_ref();
                    engine.can_schedule_on(&pod, &node, gate).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().allowed);
        }
    }
}
