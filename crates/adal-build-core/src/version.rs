use crate::error::{BuildError, Result};
use crate::paths;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

static DEFINE_RE: OnceLock<Regex> = OnceLock::new();

fn define_re() -> &'static Regex {
    DEFINE_RE.get_or_init(|| Regex::new(r"^#define\s+ADAL_VER_(HIGH|LOW|PATCH)\s+(\S+)").unwrap())
}

/// Read `ADAL_VER_HIGH`, `ADAL_VER_LOW` and `ADAL_VER_PATCH` from header text
/// and join them as `H.L.P`. Later definitions override earlier ones.
pub fn parse_version_triple(text: &str) -> Option<String> {
    let (mut high, mut low, mut patch) = (None, None, None);
    for line in text.lines() {
        let Some(caps) = define_re().captures(line) else {
            continue;
        };
        let value = caps[2].to_string();
        match &caps[1] {
            "HIGH" => high = Some(value),
            "LOW" => low = Some(value),
            _ => patch = Some(value),
        }
    }
    Some(format!("{}.{}.{}", high?, low?, patch?))
}

pub fn read_version_triple(path: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_version_triple(&text))
}

// ---------------------------------------------------------------------------
// PlistPatcher
// ---------------------------------------------------------------------------

/// Writes `CFBundleShortVersionString` into bundle property lists.
#[derive(Debug, Clone)]
pub struct PlistPatcher {
    tool: PathBuf,
}

impl Default for PlistPatcher {
    fn default() -> Self {
        Self::new(PathBuf::from(paths::PLISTBUDDY))
    }
}

impl PlistPatcher {
    pub fn new(tool: PathBuf) -> Self {
        Self { tool }
    }

    pub fn try_patch(&self, plist: &Path, version: &str) -> Result<()> {
        if !plist.exists() {
            return Err(BuildError::NotFound(plist.display().to_string()));
        }
        if !self.tool.exists() {
            return Err(BuildError::NotFound(self.tool.display().to_string()));
        }

        let status = Command::new(&self.tool)
            .arg("-c")
            .arg(format!("Set CFBundleShortVersionString {version}"))
            .arg(plist)
            .status()
            .map_err(|source| BuildError::SpawnFailed {
                program: self.tool.display().to_string(),
                source,
            })?;
        if !status.success() {
            return Err(BuildError::CommandFailed {
                program: self.tool.display().to_string(),
                code: status.code().unwrap_or(1),
            });
        }
        Ok(())
    }

    /// Line printed when updating `plist` failed with `err`.
    pub fn failure_message(plist: &Path, err: &BuildError) -> String {
        match err {
            BuildError::CommandFailed { .. } | BuildError::SpawnFailed { .. } => {
                format!("Failed to update {}", plist.display())
            }
            other => other.to_string(),
        }
    }

    /// Same as [`try_patch`](Self::try_patch), reporting failure as `false`.
    pub fn patch(&self, plist: &Path, version: &str) -> bool {
        match self.try_patch(plist, version) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(plist = %plist.display(), "failed to update version: {e}");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "\
// ADAL version
#define ADAL_VER_HIGH       2
#define ADAL_VER_LOW        1
#define ADAL_VER_PATCH      0

#define STR_HELPER(x) #x
";

    #[test]
    fn parses_triple() {
        assert_eq!(parse_version_triple(HEADER).as_deref(), Some("2.1.0"));
    }

    #[test]
    fn missing_component_is_none() {
        let text = "#define ADAL_VER_HIGH 2\n#define ADAL_VER_LOW 1\n";
        assert_eq!(parse_version_triple(text), None);
    }

    #[test]
    fn indented_define_is_ignored() {
        let text = "#define ADAL_VER_HIGH 2\n#define ADAL_VER_LOW 1\n  #define ADAL_VER_PATCH 3\n";
        assert_eq!(parse_version_triple(text), None);
    }

    #[test]
    fn last_definition_wins() {
        let text = format!("{HEADER}#define ADAL_VER_PATCH 7\n");
        assert_eq!(parse_version_triple(&text).as_deref(), Some("2.1.7"));
    }

    #[test]
    fn reads_header_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ADAL_Internal.h");
        std::fs::write(&path, HEADER).unwrap();
        assert_eq!(read_version_triple(&path).unwrap().as_deref(), Some("2.1.0"));
        assert!(read_version_triple(&dir.path().join("missing.h")).is_err());
    }

    #[test]
    fn missing_plist_is_reported() {
        let dir = TempDir::new().unwrap();
        let patcher = PlistPatcher::new(dir.path().join("PlistBuddy"));
        let plist = dir.path().join("Info.plist");
        let err = patcher.try_patch(&plist, "2.1.0").unwrap_err();
        assert_eq!(
            PlistPatcher::failure_message(&plist, &err),
            format!("{} does not exist", plist.display())
        );
        assert!(matches!(err, BuildError::NotFound(p) if p.ends_with("Info.plist")));
    }

    #[test]
    fn missing_tool_is_reported() {
        let dir = TempDir::new().unwrap();
        let plist = dir.path().join("Info.plist");
        std::fs::write(&plist, "<plist/>").unwrap();
        let patcher = PlistPatcher::new(dir.path().join("PlistBuddy"));
        assert!(!patcher.patch(&plist, "2.1.0"));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("PlistBuddy");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn passes_set_command_to_tool() {
        let dir = TempDir::new().unwrap();
        let plist = dir.path().join("Info.plist");
        std::fs::write(&plist, "<plist/>").unwrap();
        let log = dir.path().join("args.txt");
        let tool = fake_tool(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", log.display()),
        );

        assert!(PlistPatcher::new(tool).patch(&plist, "2.1.0"));
        let args = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = args.lines().collect();
        assert_eq!(lines[0], "-c");
        assert_eq!(lines[1], "Set CFBundleShortVersionString 2.1.0");
        assert_eq!(lines[2], plist.display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn tool_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let plist = dir.path().join("Info.plist");
        std::fs::write(&plist, "<plist/>").unwrap();
        let tool = fake_tool(dir.path(), "exit 3");

        let err = PlistPatcher::new(tool).try_patch(&plist, "2.1.0").unwrap_err();
        assert!(matches!(err, BuildError::CommandFailed { code: 3, .. }));
        assert_eq!(
            PlistPatcher::failure_message(&plist, &err),
            format!("Failed to update {}", plist.display())
        );
    }
}
