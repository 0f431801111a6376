//! Project model read from a directory on disk.

use std::path::{Path, PathBuf};

use autobuild_core::ProjectModel;

/// Files that mark a directory as a Gradle build.
pub const GRADLE_MARKERS: &[&str] = &[
    "settings.gradle",
    "settings.gradle.kts",
    "build.gradle",
    "build.gradle.kts",
];

/// A project rooted at a directory. Outside an IDE there is no indexing or
/// external sync, so the project is ready as soon as the directory exists.
#[derive(Debug, Clone)]
pub struct FsProjectModel {
    root: PathBuf,
}

impl FsProjectModel {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProjectModel for FsProjectModel {
    fn name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    fn base_path(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn is_initialized(&self) -> bool {
        self.root.is_dir()
    }

    fn is_indexing(&self) -> bool {
        false
    }

    fn linked_gradle_projects(&self) -> Vec<PathBuf> {
        if GRADLE_MARKERS
            .iter()
            .any(|marker| self.root.join(marker).is_file())
        {
            vec![self.root.clone()]
        } else {
            Vec::new()
        }
    }
}
