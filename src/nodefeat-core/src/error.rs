//! Error types for the feature registry.

use thiserror::Error;

/// Errors raised by a [`FeatureGate`](crate::FeatureGate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The gate was never registered.
    #[error("unknown feature gate requested: {0}")]
    UnknownGate(String),

    /// The gate was registered twice.
    #[error("feature gate already registered: {0}")]
    AlreadyRegistered(String),

    /// The gate is locked to its default and cannot change.
    #[error("feature gate '{name}' is locked to {value}")]
    Locked { name: String, value: bool },
}

/// Errors raised while building or querying a [`FeatureRegistry`](crate::FeatureRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A feature reported an empty name.
    #[error("feature name must not be empty")]
    EmptyName,

    /// Two features share a name.
    #[error("duplicate feature registered: {0}")]
    DuplicateFeature(String),

    /// A registered feature has no matching gate.
    #[error("feature '{0}' has no registered feature gate")]
    MissingGate(String),

    /// Gate lookup failed during discovery.
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or has the wrong shape.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serialization back to TOML failed.
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A gate override was rejected.
    #[error(transparent)]
    Gate(#[from] GateError),
}
