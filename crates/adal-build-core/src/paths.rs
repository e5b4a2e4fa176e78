use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "adal-build.yaml";
pub const DEFAULT_WORKSPACE: &str = "ADAL.xcworkspace";
pub const DERIVED_DATA_DIR: &str = "Library/Developer/Xcode/DerivedData";
pub const DEFAULT_DERIVED_DATA_PREFIX: &str = "ADAL-";
pub const PLISTBUDDY: &str = "/usr/libexec/PlistBuddy";

pub const ROOT_ENV: &str = "ADAL_BUILD_ROOT";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn derived_data_dir(home: &Path) -> PathBuf {
    home.join(DERIVED_DATA_DIR)
}

pub fn user_derived_data_dir() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(BuildError::HomeNotFound)?;
    Ok(derived_data_dir(&home))
}

/// Resolve the project root.
///
/// Priority:
/// 1. `explicit` (the `ADAL_BUILD_ROOT` env var)
/// 2. Nearest ancestor of `cwd` holding `adal-build.yaml`
/// 3. Nearest ancestor of `cwd` holding `ADAL.xcworkspace`
/// 4. `cwd`
pub fn resolve_root(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    for marker in [CONFIG_FILE, DEFAULT_WORKSPACE] {
        if let Some(dir) = cwd.ancestors().find(|dir| dir.join(marker).exists()) {
            return dir.to_path_buf();
        }
    }

    cwd.to_path_buf()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()), other.path());
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_config_file_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "targets: []\n").unwrap();
        let subdir = dir.path().join("ADAL/src");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(resolve_root(None, &subdir), dir.path());
    }

    #[test]
    fn finds_workspace_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(DEFAULT_WORKSPACE)).unwrap();
        let subdir = dir.path().join("Samples");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(resolve_root(None, &subdir), dir.path());
    }

    #[test]
    fn falls_back_to_cwd() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(None, dir.path()), dir.path());
    }

    #[test]
    fn path_helpers() {
        let home = Path::new("/Users/dev");
        assert_eq!(
            derived_data_dir(home),
            PathBuf::from("/Users/dev/Library/Developer/Xcode/DerivedData")
        );
        assert_eq!(
            config_path(Path::new("/src/adal")),
            PathBuf::from("/src/adal/adal-build.yaml")
        );
    }
}
