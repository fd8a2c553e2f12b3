//! File discovery for finding images under the input root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::ImageRecord;

/// Discovers image files in directories.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    config: ProcessingConfig,
    exclude: Option<PathBuf>,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            exclude: None,
        }
    }

    /// Never descend into `dir`. Used to keep the symlink farm out of the
    /// walk when it lives inside the input tree.
    pub fn excluding(mut self, dir: &Path) -> Self {
        self.exclude = Some(absolute(dir));
        self
    }

    /// Recursively find every supported image under `root`.
    ///
    /// Paths are made absolute and paired with their path relative to `root`.
    /// Results are sorted by path for deterministic ordering.
    pub fn discover(&self, root: &Path) -> Vec<ImageRecord> {
        let root = absolute(root);

        let mut files: Vec<ImageRecord> = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_supported(e.path()))
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&root).ok()?.to_path_buf();
                Some(ImageRecord {
                    path: e.path().to_path_buf(),
                    relative,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Map each file name to the first matching file under `root`.
    ///
    /// Any extension matches; the lookup is by name only. The walk is sorted
    /// by file name so "first" is stable across runs.
    pub fn index_by_name(&self, root: &Path) -> HashMap<String, PathBuf> {
        let mut index = HashMap::new();
        for entry in WalkDir::new(absolute(root))
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            index
                .entry(name)
                .or_insert_with(|| entry.path().to_path_buf());
        }
        index
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude
            .as_deref()
            .is_some_and(|excluded| path.starts_with(excluded))
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
