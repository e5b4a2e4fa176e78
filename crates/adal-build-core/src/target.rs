use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Platform {
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "Mac")]
    Mac,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Mac => "Mac",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// One entry in the build matrix: a scheme built for a platform, with an
/// ordered list of `xcodebuild` actions (`build`, `test`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub name: String,
    pub scheme: String,
    pub platform: Platform,
    pub operations: Vec<String>,
    #[serde(default)]
    pub arch: Option<String>,
    /// Names of targets that must have succeeded earlier in the same run.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Target {
    pub fn new(name: &str, scheme: &str, platform: Platform, operations: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            scheme: scheme.to_string(),
            platform,
            operations: operations.iter().map(|s| s.to_string()).collect(),
            arch: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_arch(mut self, arch: &str) -> Self {
        self.arch = Some(arch.to_string());
        self
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }
}

/// The ADAL build matrix used when no `adal-build.yaml` is present.
pub fn default_targets() -> Vec<Target> {
    vec![
        Target::new("iOS Framework", "ADAL", Platform::Ios, &["build", "test"]),
        Target::new("iOS Test App", "MyTestiOSApp", Platform::Ios, &["build"]),
        Target::new("Sample Swift App", "SampleSwiftApp", Platform::Ios, &["build"]),
        Target::new("Mac Framework", "ADAL Mac", Platform::Mac, &["build", "test"]),
        Target::new("Mac Framework 32-bit", "ADAL Mac", Platform::Mac, &["build", "test"])
            .with_arch("i386"),
        Target::new("Mac Test App", "MyTestMacOSApp", Platform::Mac, &["build"]),
    ]
}

/// Reject target lists the orchestrator cannot run meaningfully.
///
/// Dependencies on unknown or later targets are allowed here; the orchestrator
/// reports those targets as skipped.
pub fn validate_targets(targets: &[Target]) -> Result<()> {
    let mut seen = HashSet::new();
    for target in targets {
        if target.name.trim().is_empty() {
            return Err(BuildError::InvalidConfig("target with empty name".into()));
        }
        if target.scheme.trim().is_empty() {
            return Err(BuildError::InvalidConfig(format!(
                "target '{}' has an empty scheme",
                target.name
            )));
        }
        if target.operations.is_empty() {
            return Err(BuildError::InvalidConfig(format!(
                "target '{}' has no operations",
                target.name
            )));
        }
        if let Some(op) = target.operations.iter().find(|op| op.trim().is_empty()) {
            return Err(BuildError::InvalidConfig(format!(
                "target '{}' has an empty operation '{op}'",
                target.name
            )));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(BuildError::DuplicateTarget(target.name.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "Succeeded",
            Outcome::Failed => "Failed",
            Outcome::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
