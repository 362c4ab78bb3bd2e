//! Feature gates.

use crate::GateError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::info;

/// Maturity stage of a gate.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    /// Off by default, may change or be removed.
    Alpha,
    /// Usually on by default, mostly stable.
    Beta,
    /// Generally available.
    GA,
    /// Will be removed.
    Deprecated,
}

impl std::fmt::Display for GateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alpha => write!(f, "ALPHA"),
            Self::Beta => write!(f, "BETA"),
            Self::GA => write!(f, "GA"),
            Self::Deprecated => write!(f, "DEPRECATED"),
        }
    }
}

/// Static definition of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSpec {
    /// Default enabled state.
    pub default_enabled: bool,
    /// Stage.
    pub stage: GateStage,
    /// When set, the gate cannot be moved away from its default.
    pub lock_to_default: bool,
}

impl GateSpec {
    pub fn new(stage: GateStage, default_enabled: bool) -> Self {
        Self {
            default_enabled,
            stage,
            lock_to_default: false,
        }
    }

    pub fn alpha() -> Self {
        Self::new(GateStage::Alpha, false)
    }

    pub fn beta() -> Self {
        Self::new(GateStage::Beta, true)
    }

    /// GA gates are on and locked.
    pub fn ga() -> Self {
        Self::new(GateStage::GA, true).locked()
    }

    pub fn locked(mut self) -> Self {
        self.lock_to_default = true;
        self
    }
}

/// Boolean switch lookup keyed by gate name.
///
/// Implementations must be internally synchronized: `set_enabled` may run
/// concurrently with `enabled`.
pub trait FeatureGate: Send + Sync {
    /// Current state of a known gate. Unknown names are an error, never `false`.
    fn enabled(&self, name: &str) -> Result<bool, GateError>;

    /// Set a gate, defining it if absent.
    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), GateError>;

    /// Whether `set_enabled(name, enabled)` would be accepted. Changes nothing.
    fn check_enabled(&self, _name: &str, _enabled: bool) -> Result<(), GateError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct GateState {
    spec: GateSpec,
    enabled: bool,
}

impl GateState {
    fn check(&self, name: &str, enabled: bool) -> Result<(), GateError> {
        if self.spec.lock_to_default && enabled != self.spec.default_enabled {
            return Err(GateError::Locked {
                name: name.to_string(),
                value: self.spec.default_enabled,
            });
        }
        Ok(())
    }
}

/// In-memory [`FeatureGate`] guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryFeatureGate {
    gates: RwLock<BTreeMap<String, GateState>>,
}

impl MemoryFeatureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a gate with every name pre-registered.
    pub fn with_gates<I, S>(gates: I) -> Result<Self, GateError>
    where
        I: IntoIterator<Item = (S, GateSpec)>,
        S: Into<String>,
    {
        let gate = Self::new();
        for (name, spec) in gates {
            gate.register(name, spec)?;
        }
        Ok(gate)
    }

    /// Pre-register a gate with its default.
    pub fn register(&self, name: impl Into<String>, spec: GateSpec) -> Result<(), GateError> {
        let name = name.into();
        let mut gates = self.gates.write();
        if gates.contains_key(&name) {
            return Err(GateError::AlreadyRegistered(name));
        }
        gates.insert(
            name,
            GateState {
                spec,
                enabled: spec.default_enabled,
            },
        );
        Ok(())
    }

    /// Return a gate to its default state.
    pub fn reset(&self, name: &str) -> Result<(), GateError> {
        let mut gates = self.gates.write();
        let state = gates
            .get_mut(name)
            .ok_or_else(|| GateError::UnknownGate(name.to_string()))?;
        state.enabled = state.spec.default_enabled;
        Ok(())
    }

    /// Get the registered spec of a gate.
    pub fn spec(&self, name: &str) -> Option<GateSpec> {
        self.gates.read().get(name).map(|state| state.spec)
    }

    /// Registered gate names in sorted order.
    pub fn known_gates(&self) -> Vec<String> {
        self.gates.read().keys().cloned().collect()
    }

    /// Whether a name has been registered.
    pub fn is_known(&self, name: &str) -> bool {
        self.gates.read().contains_key(name)
    }
}

impl FeatureGate for MemoryFeatureGate {
    fn enabled(&self, name: &str) -> Result<bool, GateError> {
        self.gates
            .read()
            .get(name)
            .map(|state| state.enabled)
            .ok_or_else(|| GateError::UnknownGate(name.to_string()))
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), GateError> {
        let mut gates = self.gates.write();
        match gates.get_mut(name) {
            Some(state) => {
                state.check(name, enabled)?;
                state.enabled = enabled;
            }
            None => {
                gates.insert(
                    name.to_string(),
                    GateState {
                        spec: GateSpec::new(GateStage::Alpha, enabled),
                        enabled,
                    },
                );
            }
        }
        info!(gate = %name, enabled, "feature gate updated");
        Ok(())
    }

    fn check_enabled(&self, name: &str, enabled: bool) -> Result<(), GateError> {
        match self.gates.read().get(name) {
            Some(state) => state.check(name, enabled),
            None => Ok(()),
        }
    }
}
