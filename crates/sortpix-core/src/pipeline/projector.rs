//! Symlink farm: one directory per tag, mirroring the input tree.
//!
//! An image at `<input>/sub/dir/img.jpg` tagged `cat` is linked from
//! `<output>/cat/sub/dir/img.jpg`. Creation is existence-checked, so re-runs
//! converge and concurrent workers touching the same tag folder do not
//! error.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::ImageRecord;

/// Places shortcuts to images under per-tag directories.
#[derive(Debug, Clone)]
pub struct TagProjector {
    output_root: PathBuf,
}

impl TagProjector {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Where the shortcut for `record` under `tag` lives.
    ///
    /// Returns `None` when the tag cannot be used as a directory name.
    pub fn link_path(&self, record: &ImageRecord, tag: &str) -> Option<PathBuf> {
        let tag = sanitize_tag(tag)?;
        Some(self.output_root.join(tag).join(&record.relative))
    }

    /// Link `record` into every tag directory. Returns how many links were new.
    pub fn place(&self, record: &ImageRecord, tags: &[String]) -> PipelineResult<usize> {
        let mut created = 0;
        for tag in tags {
            let Some(link) = self.link_path(record, tag) else {
                tracing::warn!("Ignoring unusable tag {:?} for {:?}", tag, record.path);
                continue;
            };
            if create_link(&record.path, &link).map_err(|source| PipelineError::Projection {
                path: link.clone(),
                source,
            })? {
                created += 1;
            }
        }
        Ok(created)
    }
}

/// Create `link` → `target` unless something already sits at `link`.
fn create_link(target: &Path, link: &Path) -> io::Result<bool> {
    if let Some(parent) = link.parent() {
        // create_dir_all tolerates a concurrent creator of the same directory.
        std::fs::create_dir_all(parent)?;
    }

    if link.symlink_metadata().is_ok() {
        return Ok(false);
    }

    match symlink(target, link) {
        Ok(()) => {
            tracing::trace!("Linked {:?} -> {:?}", link, target);
            Ok(true)
        }
        // Another worker won the race for the same link.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Make a tag usable as a single path component.
fn sanitize_tag(tag: &str) -> Option<String> {
    let cleaned: String = tag
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn record(root: &Path, relative: &str) -> ImageRecord {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"img").unwrap();
        ImageRecord {
            path,
            relative: PathBuf::from(relative),
        }
    }

    #[test]
    fn test_place_mirrors_relative_path() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let img = record(input.path(), "sub/dir/img.jpg");

        let projector = TagProjector::new(output.path());
        let created = projector.place(&img, &["cat".to_string()]).unwrap();

        let link = output.path().join("cat/sub/dir/img.jpg");
        assert_eq!(created, 1);
        assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_link(&link).unwrap(), img.path);
    }

    #[test]
    fn test_place_is_idempotent() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let img = record(input.path(), "a.jpg");
        let tags = vec!["dog".to_string(), "frisbee".to_string()];

        let projector = TagProjector::new(output.path());
        assert_eq!(projector.place(&img, &tags).unwrap(), 2);
        assert_eq!(projector.place(&img, &tags).unwrap(), 0);
        assert_eq!(std::fs::read_dir(output.path().join("dog")).unwrap().count(), 1);
    }

    #[test]
    fn test_same_name_in_different_subtrees_does_not_collide() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let a = record(input.path(), "2023/img.jpg");
        let b = record(input.path(), "2024/img.jpg");

        let projector = TagProjector::new(output.path());
        projector.place(&a, &["cat".to_string()]).unwrap();
        projector.place(&b, &["cat".to_string()]).unwrap();

        assert_eq!(
            std::fs::read_link(output.path().join("cat/2023/img.jpg")).unwrap(),
            a.path
        );
        assert_eq!(
            std::fs::read_link(output.path().join("cat/2024/img.jpg")).unwrap(),
            b.path
        );
    }

    #[test]
    fn test_unusable_tags_are_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let img = record(input.path(), "a.jpg");

        let projector = TagProjector::new(output.path());
        let created = projector
            .place(&img, &["..".to_string(), "  ".to_string(), "a/b".to_string()])
            .unwrap();
        assert_eq!(created, 1);
        assert!(output.path().join("a_b/a.jpg").symlink_metadata().is_ok());
    }

    #[test]
    fn test_concurrent_placement_into_same_tag_dir() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let images: Vec<ImageRecord> = (0..8)
            .map(|i| record(input.path(), &format!("deep/tree/img{i}.jpg")))
            .collect();

        let projector = Arc::new(TagProjector::new(output.path()));
        let barrier = Arc::new(Barrier::new(images.len()));
        let handles: Vec<_> = images
            .iter()
            .cloned()
            .map(|img| {
                let projector = projector.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    projector.place(&img, &["cat".to_string()])
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 1);
        }
        for img in &images {
            assert!(projector.link_path(img, "cat").unwrap().symlink_metadata().is_ok());
        }
    }

    #[test]
    fn test_sanitize_tag() {
        assert_eq!(sanitize_tag("hot dog").as_deref(), Some("hot dog"));
        assert_eq!(sanitize_tag("Unknown(5)").as_deref(), Some("Unknown(5)"));
        assert_eq!(sanitize_tag("a\\b").as_deref(), Some("a_b"));
        assert_eq!(sanitize_tag("."), None);
    }
}
