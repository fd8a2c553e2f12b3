//! Skip list and manual-tag overrides.
//!
//! Both files are optional. Loading is forgiving: a missing file is an empty
//! collection, and an unreadable or malformed one is an empty collection plus
//! a warning. Editing is strict and refuses to overwrite a file it cannot
//! parse.
//!
//! ```json
//! { "SkipImages": [ { "ImageName": "blurry.jpg" } ] }
//! { "ManualTagImages": [ { "ImageName": "cat.jpg", "Tags": ["cat", "sofa"] } ] }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::OverrideError;

/// On-disk skip-list document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipListFile {
    #[serde(rename = "SkipImages")]
    pub skip_images: Vec<SkipImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipImage {
    #[serde(rename = "ImageName")]
    pub image_name: String,
}

/// On-disk manual-tag document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualTagFile {
    #[serde(rename = "ManualTagImages")]
    pub manual_tag_images: Vec<ManualTagImage>,
}

/// One manually tagged image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTagImage {
    #[serde(rename = "ImageName")]
    pub image_name: String,
    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
}

/// Immutable override tables for one run.
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    skipped: HashSet<String>,
    manual: Vec<ManualTagImage>,
    by_name: HashMap<String, usize>,
}

impl OverrideStore {
    /// Load both override files. Never fails.
    pub fn load(skip_path: &Path, manual_path: &Path) -> Self {
        let skip: SkipListFile = load_or_default(skip_path);
        let manual: ManualTagFile = load_or_default(manual_path);

        let store = Self::from_parts(
            skip.skip_images.into_iter().map(|s| s.image_name),
            manual.manual_tag_images,
        );

        tracing::info!(
            "Loaded overrides: {} skipped, {} manually tagged",
            store.skipped.len(),
            store.manual.len()
        );
        store
    }

    /// Build a store from in-memory tables.
    ///
    /// A repeated manual entry replaces the earlier one in place.
    pub fn from_parts(
        skipped: impl IntoIterator<Item = String>,
        manual: impl IntoIterator<Item = ManualTagImage>,
    ) -> Self {
        let mut entries: Vec<ManualTagImage> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for entry in manual {
            match by_name.get(&entry.image_name) {
                Some(&i) => entries[i] = entry,
                None => {
                    by_name.insert(entry.image_name.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        Self {
            skipped: skipped.into_iter().collect(),
            manual: entries,
            by_name,
        }
    }

    pub fn is_skipped(&self, image_name: &str) -> bool {
        self.skipped.contains(image_name)
    }

    pub fn manual_tags_for(&self, image_name: &str) -> Option<&[String]> {
        self.by_name
            .get(image_name)
            .map(|&i| self.manual[i].tags.as_slice())
    }

    /// Manual entries in file order.
    pub fn manual_entries(&self) -> &[ManualTagImage] {
        &self.manual
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        tracing::debug!("No override file at {:?}", path);
        return T::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read {:?}, ignoring it: {}", path, e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Malformed override file {:?}, ignoring it: {}", path, e);
            T::default()
        }
    }
}

// ── Editing ────────────────────────────────────────────────────────────────

/// Record `tags` as the manual tags for `image_name`, replacing any prior entry.
pub fn set_manual_tags(
    path: &Path,
    image_name: &str,
    tags: Vec<String>,
) -> Result<(), OverrideError> {
    if tags.is_empty() {
        return Err(OverrideError::NoTags(image_name.to_string()));
    }

    let mut doc: ManualTagFile = read_strict(path)?;
    doc.manual_tag_images
        .retain(|entry| entry.image_name != image_name);
    doc.manual_tag_images.push(ManualTagImage {
        image_name: image_name.to_string(),
        tags,
    });
    write_pretty(path, &doc)
}

/// Drop the manual entry for `image_name`. Returns whether one existed.
pub fn remove_manual_tags(path: &Path, image_name: &str) -> Result<bool, OverrideError> {
    let mut doc: ManualTagFile = read_strict(path)?;
    let before = doc.manual_tag_images.len();
    doc.manual_tag_images
        .retain(|entry| entry.image_name != image_name);
    if doc.manual_tag_images.len() == before {
        return Ok(false);
    }
    write_pretty(path, &doc)?;
    Ok(true)
}

/// Add `image_name` to the skip list. Returns false if it was already there.
pub fn add_skip(path: &Path, image_name: &str) -> Result<bool, OverrideError> {
    let mut doc: SkipListFile = read_strict(path)?;
    if doc.skip_images.iter().any(|s| s.image_name == image_name) {
        return Ok(false);
    }
    doc.skip_images.push(SkipImage {
        image_name: image_name.to_string(),
    });
    write_pretty(path, &doc)?;
    Ok(true)
}

/// Remove `image_name` from the skip list. Returns whether it was present.
pub fn remove_skip(path: &Path, image_name: &str) -> Result<bool, OverrideError> {
    let mut doc: SkipListFile = read_strict(path)?;
    let before = doc.skip_images.len();
    doc.skip_images.retain(|s| s.image_name != image_name);
    if doc.skip_images.len() == before {
        return Ok(false);
    }
    write_pretty(path, &doc)?;
    Ok(true)
}

fn read_strict<T: DeserializeOwned + Default>(path: &Path) -> Result<T, OverrideError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| OverrideError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&content).map_err(|source| OverrideError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_pretty<T: Serialize>(path: &Path, doc: &T) -> Result<(), OverrideError> {
    let io_err = |source| OverrideError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    std::fs::write(path, json).map_err(io_err)
}
