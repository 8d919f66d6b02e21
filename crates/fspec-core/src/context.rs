use crate::paths;
use std::path::{Path, PathBuf};

/// Explicit project context threaded through every operation that touches
/// the filesystem. There is no process-wide "current project" singleton;
/// callers construct one from a resolved root and pass it by reference.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn spec_dir(&self) -> PathBuf {
        paths::spec_dir(&self.root)
    }

    pub fn features_dir(&self) -> PathBuf {
        paths::features_dir(&self.root)
    }

    pub fn work_units_path(&self) -> PathBuf {
        paths::work_units_path(&self.root)
    }

    pub fn epics_path(&self) -> PathBuf {
        paths::epics_path(&self.root)
    }

    pub fn prefixes_path(&self) -> PathBuf {
        paths::prefixes_path(&self.root)
    }

    pub fn tags_path(&self) -> PathBuf {
        paths::tags_path(&self.root)
    }

    pub fn foundation_path(&self) -> PathBuf {
        paths::foundation_path(&self.root)
    }

    pub fn feature_file_path(&self, name: &str) -> PathBuf {
        paths::feature_file_path(&self.root, name)
    }

    pub fn is_initialized(&self) -> bool {
        self.work_units_path().exists()
    }
}
