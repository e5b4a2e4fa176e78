use crate::error::Result;
use crate::paths;
use crate::target::{default_targets, validate_targets, Target};
use serde::Deserialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// SimulatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_os")]
    pub os: String,
    /// Look the simulator GUID up with `instruments` instead of passing the
    /// device name to `xcodebuild`.
    #[serde(default)]
    pub resolve: bool,
}

fn default_device() -> String {
    "iPhone 6".to_string()
}

fn default_os() -> String {
    "latest".to_string()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            os: default_os(),
            resolve: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BuildConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default = "default_derived_data_prefix")]
    pub derived_data_prefix: String,
    #[serde(default = "default_formatter")]
    pub formatter: String,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,
}

fn default_workspace() -> String {
    paths::DEFAULT_WORKSPACE.to_string()
}

fn default_derived_data_prefix() -> String {
    paths::DEFAULT_DERIVED_DATA_PREFIX.to_string()
}

fn default_formatter() -> String {
    "xcpretty".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            derived_data_prefix: default_derived_data_prefix(),
            formatter: default_formatter(),
            simulator: SimulatorConfig::default(),
            targets: default_targets(),
        }
    }
}

impl BuildConfig {
    /// Load `adal-build.yaml` from `root`, falling back to the built-in ADAL
    /// matrix when the file does not exist. The target list is validated
    /// either way.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let config = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            tracing::debug!(path = %path.display(), "loading build config");
            Self::from_yaml(&data)?
        } else {
            Self::default()
        };
        validate_targets(&config.targets)?;
        Ok(config)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn ios_destination(&self) -> String {
        format!(
            "platform=iOS Simulator,name={},OS={}",
            self.simulator.device, self.simulator.os
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::target::Platform;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_builtin_matrix() {
        let dir = TempDir::new().unwrap();
        let cfg = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(cfg, BuildConfig::default());
        assert_eq!(cfg.targets.len(), 6);
        assert_eq!(cfg.workspace, "ADAL.xcworkspace");
    }

    #[test]
    fn loads_targets_from_file() {
        let dir = TempDir::new().unwrap();
        let yaml = r#"
workspace: Other.xcworkspace
simulator:
  device: iPhone 8
targets:
  - name: Core
    scheme: Core
    platform: iOS
    operations: [build, test]
  - name: Sample
    scheme: Sample
    platform: iOS
    operations: [build]
    dependencies: [Core]
"#;
        std::fs::write(dir.path().join(paths::CONFIG_FILE), yaml).unwrap();
        let cfg = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.workspace, "Other.xcworkspace");
        assert_eq!(cfg.formatter, "xcpretty");
        assert_eq!(cfg.simulator.device, "iPhone 8");
        assert_eq!(cfg.simulator.os, "latest");
        assert!(!cfg.simulator.resolve);
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[1].dependencies, vec!["Core"]);
    }

    #[test]
    fn file_without_targets_keeps_builtin_matrix() {
        let cfg = BuildConfig::from_yaml("formatter: xcbeautify\n").unwrap();
        assert_eq!(cfg.formatter, "xcbeautify");
        assert_eq!(cfg.targets.len(), 6);
    }

    #[test]
    fn unknown_platform_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let yaml = "targets:\n  - name: TV\n    scheme: TV\n    platform: tvOS\n    operations: [build]\n";
        std::fs::write(dir.path().join(paths::CONFIG_FILE), yaml).unwrap();
        assert!(matches!(
            BuildConfig::load(dir.path()),
            Err(BuildError::Yaml(_))
        ));
    }

    #[test]
    fn duplicate_targets_fail_validation() {
        let dir = TempDir::new().unwrap();
        let yaml = r#"
targets:
  - { name: A, scheme: A, platform: Mac, operations: [build] }
  - { name: A, scheme: A, platform: Mac, operations: [test] }
"#;
        std::fs::write(dir.path().join(paths::CONFIG_FILE), yaml).unwrap();
        assert!(matches!(
            BuildConfig::load(dir.path()),
            Err(BuildError::DuplicateTarget(_))
        ));
    }

    #[test]
    fn empty_target_list_is_allowed() {
        let cfg = BuildConfig::from_yaml("targets: []\n").unwrap();
        assert!(cfg.targets.is_empty());
        validate_targets(&cfg.targets).unwrap();
    }

    #[test]
    fn ios_destination_format() {
        let cfg = BuildConfig::default();
        assert_eq!(
            cfg.ios_destination(),
            "platform=iOS Simulator,name=iPhone 6,OS=latest"
        );
        assert_eq!(cfg.targets[0].platform, Platform::Ios);
    }
}
