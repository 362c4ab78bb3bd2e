//! Test doubles for node declared features.
//!
//! [`MockFeature`] is backed by closures set per test. Calling a decision
//! function that was never configured panics, so a test notices when the
//! engine evaluates something it should have skipped. [`MockFeatureGate`]
//! records every query and answers unknown names with an error.

use nodefeat_core::{Feature, FeatureGate, GateError, NodeConfiguration, PodInfo, Version};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type DiscoverFn = Box<dyn Fn(&NodeConfiguration) -> bool + Send + Sync>;
type SchedulingFn = Box<dyn Fn(&PodInfo) -> bool + Send + Sync>;
type UpdateFn = Box<dyn Fn(&PodInfo, &PodInfo) -> bool + Send + Sync>;

/// Gate that remembers what was asked of it.
#[derive(Debug, Default)]
pub struct MockFeatureGate {
    gates: RwLock<HashMap<String, bool>>,
    queries: Mutex<Vec<String>>,
    unknown: Mutex<Vec<String>>,
}

impl MockFeatureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every name passed to `enabled`, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Names that were queried without being set first.
    pub fn unknown_queries(&self) -> Vec<String> {
        self.unknown.lock().clone()
    }
}

impl FeatureGate for MockFeatureGate {
    fn enabled(&self, name: &str) -> Result<bool, GateError> {
        self.queries.lock().push(name.to_string());
        match self.gates.read().get(name) {
            Some(enabled) => Ok(*enabled),
            None => {
                self.unknown.lock().push(name.to_string());
                Err(GateError::UnknownGate(name.to_string()))
            }
        }
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), GateError> {
        self.gates.write().insert(name.to_string(), enabled);
        Ok(())
    }
}

/// Call counts per decision function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub discover: usize,
    pub infer_for_scheduling: usize,
    pub infer_for_update: usize,
}

impl MockCalls {
    pub fn total(&self) -> usize {
        self.discover + self.infer_for_scheduling + self.infer_for_update
    }
}

/// Closure-backed [`Feature`].
#[derive(Default)]
pub struct MockFeature {
    name: Option<String>,
    discover: Option<DiscoverFn>,
    infer_for_scheduling: Option<SchedulingFn>,
    infer_for_update: Option<UpdateFn>,
    max_version: Option<Option<Version>>,
    discover_calls: AtomicUsize,
    scheduling_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MockFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock with a name and no version bound.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_name(name).with_max_version(None)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_discover<F>(&mut self, discover: F)
    where
        F: Fn(&NodeConfiguration) -> bool + Send + Sync + 'static,
    {
        self.discover = Some(Box::new(discover));
    }

    pub fn set_infer_for_scheduling<F>(&mut self, infer: F)
    where
        F: Fn(&PodInfo) -> bool + Send + Sync + 'static,
    {
        self.infer_for_scheduling = Some(Box::new(infer));
    }

    pub fn set_infer_for_update<F>(&mut self, infer: F)
    where
        F: Fn(&PodInfo, &PodInfo) -> bool + Send + Sync + 'static,
    {
        self.infer_for_update = Some(Box::new(infer));
    }

    pub fn set_max_version(&mut self, max_version: Option<Version>) {
        self.max_version = Some(max_version);
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_discover<F>(mut self, discover: F) -> Self
    where
        F: Fn(&NodeConfiguration) -> bool + Send + Sync + 'static,
    {
        self.set_discover(discover);
        self
    }

    pub fn with_infer_for_scheduling<F>(mut self, infer: F) -> Self
    where
        F: Fn(&PodInfo) -> bool + Send + Sync + 'static,
    {
        self.set_infer_for_scheduling(infer);
        self
    }

    pub fn with_infer_for_update<F>(mut self, infer: F) -> Self
    where
        F: Fn(&PodInfo, &PodInfo) -> bool + Send + Sync + 'static,
    {
        self.set_infer_for_update(infer);
        self
    }

    pub fn with_max_version(mut self, max_version: Option<Version>) -> Self {
        self.set_max_version(max_version);
        self
    }

    pub fn calls(&self) -> MockCalls {
        MockCalls {
            discover: self.discover_calls.load(Ordering::SeqCst),
            infer_for_scheduling: self.scheduling_calls.load(Ordering::SeqCst),
            infer_for_update: self.update_calls.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for MockFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFeature")
            .field("name", &self.name)
            .field("max_version", &self.max_version)
            .field("calls", &self.calls())
            .finish()
    }
}

impl Feature for MockFeature {
    fn name(&self) -> &str {
        match &self.name {
            Some(name) => name.as_str(),
            None => panic!("unexpected call to name"),
        }
    }

    fn discover(&self, cfg: &NodeConfiguration) -> bool {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        match &self.discover {
            Some(discover) => discover(cfg),
            None => panic!("unexpected call to discover on {:?}", self.name),
        }
    }

    fn infer_for_scheduling(&self, pod: &PodInfo) -> bool {
        self.scheduling_calls.fetch_add(1, Ordering::SeqCst);
        match &self.infer_for_scheduling {
            Some(infer) => infer(pod),
            None => panic!("unexpected call to infer_for_scheduling on {:?}", self.name),
        }
    }

    fn infer_for_update(&self, old: &PodInfo, new: &PodInfo) -> bool {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        match &self.infer_for_update {
            Some(infer) => infer(old, new),
            None => panic!("unexpected call to infer_for_update on {:?}", self.name),
        }
    }

    fn max_version(&self) -> Option<Version> {
        match &self.max_version {
            Some(max_version) => max_version.clone(),
            None => panic!("unexpected call to max_version on {:?}", self.name),
        }
    }
}
