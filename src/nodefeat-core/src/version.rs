//! Version helpers for skew bounds.

pub use semver::Version;

/// Parse a Kubernetes-style version string.
///
/// Accepts an optional leading `v` and the short `major` / `major.minor` forms,
/// which are padded with zeros before semver parsing.
pub fn parse_version(input: &str) -> Result<Version, semver::Error> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let padded = match core.matches('.').count() {
        0 => format!("{core}.0.0{suffix}"),
        1 => format!("{core}.0{suffix}"),
        _ => trimmed.to_string(),
    };

    Version::parse(&padded)
}

/// Returns true when `version` is strictly above `bound`.
///
/// An absent version or an absent bound never exceeds.
pub fn exceeds(version: Option<&Version>, bound: Option<&Version>) -> bool {
    match (version, bound) {
        (Some(version), Some(bound)) => version > bound,
        _ => false,
    }
}
