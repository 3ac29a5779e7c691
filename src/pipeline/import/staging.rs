//! Request-scoped staging area for uploaded files.
//!
//! Each request gets its own directory under the process work root. The
//! directory and everything in it are removed when the [`RequestWorkspace`]
//! is dropped, whether the request succeeded, failed or panicked.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::format::sanitize_filename;
use super::ImportError;

pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    /// Create a fresh `request-*` directory inside `work_root`.
    pub fn create(work_root: &Path) -> Result<Self, ImportError> {
        std::fs::create_dir_all(work_root)?;
        let dir = tempfile::Builder::new()
            .prefix("request-")
            .tempdir_in(work_root)?;

        tracing::debug!(dir = %dir.path().display(), "Request workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the upload under its sanitized name and return the staged path.
    pub fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ImportError> {
        let target = self.dir.path().join(sanitize_filename(file_name));
        std::fs::write(&target, bytes)?;

        tracing::debug!(
            path = %target.display(),
            size = bytes.len(),
            "Upload staged"
        );
        Ok(target)
    }

    /// Remove the workspace now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<(), ImportError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(dir = %path.display(), "Request workspace removed");
        Ok(())
    }
}

/// Remove `request-*` directories left behind by a crashed process.
///
/// Only needed for an operator-configured work root; the default root is a
/// fresh temp dir per process. Returns how many were removed.
pub fn cleanup_orphaned_workspaces(work_root: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(work_root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let is_workspace = entry.file_name().to_string_lossy().starts_with("request-")
            && entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_workspace {
            continue;
        }
        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                path = %entry.path().display(),
                error = %e,
                "Failed to remove orphaned workspace"
            ),
        }
    }
    removed
}
