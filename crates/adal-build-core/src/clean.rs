use crate::error::{BuildError, Result};
use crate::paths;
use std::path::PathBuf;

/// Pre-run cleanup of cached build products.
pub trait Cleaner {
    /// Returns the number of entries removed.
    fn clean(&mut self) -> Result<usize>;
}

/// Removes the project's folders from Xcode's DerivedData, e.g.
/// `~/Library/Developer/Xcode/DerivedData/ADAL-*`.
#[derive(Debug, Clone)]
pub struct DerivedDataCleaner {
    dir: Option<PathBuf>,
    prefix: String,
}

impl DerivedDataCleaner {
    pub fn new(dir: PathBuf, prefix: &str) -> Self {
        Self {
            dir: Some(dir),
            prefix: prefix.to_string(),
        }
    }

    /// Cleaner for the current user's DerivedData directory. A missing home
    /// directory surfaces as an error from [`Cleaner::clean`].
    pub fn for_user(prefix: &str) -> Self {
        Self {
            dir: paths::user_derived_data_dir().ok(),
            prefix: prefix.to_string(),
        }
    }
}

impl Cleaner for DerivedDataCleaner {
    fn clean(&mut self) -> Result<usize> {
        let dir = self.dir.as_ref().ok_or(BuildError::HomeNotFound)?;
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut stale = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&self.prefix) {
                stale.push(entry.path());
            }
        }
        Ok(remove_entries(&stale))
    }
}

/// Remove each path, logging failures and carrying on with the rest.
/// Returns how many were removed.
fn remove_entries(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        let result = std::fs::symlink_metadata(path).and_then(|meta| {
            if meta.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            }
        });
        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed derived data");
                removed += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), "failed to remove derived data: {e}"),
        }
    }
    removed
}
