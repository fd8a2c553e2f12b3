//! Append-only plain-text record of raw model output per image.
//!
//! Each block is rendered in memory and written with a single `write_all`
//! under a mutex, so blocks from concurrent workers never interleave. Block
//! order follows worker completion, not discovery order.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PipelineError, PipelineResult};
use crate::types::InferenceOutput;

/// Shared handle to the confidence log file.
pub struct ConfidenceLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ConfidenceLog {
    /// Open the log, truncating any previous run's content.
    pub fn create(path: &Path) -> PipelineResult<Self> {
        let log_err = |source| PipelineError::Log {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(log_err)?;
        }
        // Truncate, then reopen in append mode for the workers.
        File::create(path).map_err(log_err)?;
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(log_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the block for one image.
    pub fn log(&self, image_name: &str, output: &InferenceOutput) -> PipelineResult<()> {
        self.write(&render_entry(image_name, output))
    }

    /// Append a free-form line.
    pub fn append_line(&self, line: &str) -> PipelineResult<()> {
        self.write(&format!("{line}\n"))
    }

    fn write(&self, text: &str) -> PipelineResult<()> {
        let log_err = |source| PipelineError::Log {
            path: self.path.clone(),
            source,
        };
        let mut file = self.file.lock().map_err(|e| {
            log_err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("log lock poisoned: {e}"),
            ))
        })?;
        file.write_all(text.as_bytes()).map_err(log_err)?;
        file.flush().map_err(log_err)
    }
}

/// Render one image's block, terminated by a blank line.
pub fn render_entry(image_name: &str, output: &InferenceOutput) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "{image_name}");
    if output.detections.is_empty() {
        let _ = writeln!(block, "  detection: none");
    }
    for d in &output.detections {
        let _ = writeln!(block, "  detection: {} ({:.4})", d.tag, d.confidence);
    }
    let c = &output.classification;
    let _ = writeln!(block, "  classification: {} ({:.4})", c.label, c.confidence);
    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, Detection};
    use std::sync::Arc;

    fn output(detections: &[(&str, f32)]) -> InferenceOutput {
        InferenceOutput {
            detections: detections
                .iter()
                .map(|(tag, confidence)| Detection {
                    tag: tag.to_string(),
                    confidence: *confidence,
                })
                .collect(),
            classification: Classification {
                label: "tabby".into(),
                confidence: 0.5,
            },
        }
    }

    #[test]
    fn test_render_entry() {
        let block = render_entry("cat.jpg", &output(&[("cat", 0.91), ("couch", 0.4)]));
        assert_eq!(
            block,
            "cat.jpg\n  detection: cat (0.9100)\n  detection: couch (0.4000)\n  classification: tabby (0.5000)\n\n"
        );
    }

    #[test]
    fn test_render_entry_without_detections() {
        let block = render_entry("empty.png", &output(&[]));
        assert!(block.contains("  detection: none\n"));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/confidence_log.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale run\n").unwrap();

        let log = ConfidenceLog::create(&path).unwrap();
        log.append_line("Macro F1: no data").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Macro F1: no data\n");
    }

    #[test]
    fn test_concurrent_blocks_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confidence_log.txt");
        let log = Arc::new(ConfidenceLog::create(&path).unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || {
                    let detections: Vec<(&str, f32)> = vec![("cat", 0.5); 20];
                    log.log(&format!("img{i}.jpg"), &output(&detections)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let blocks: Vec<&str> = content.split("\n\n").filter(|b| !b.is_empty()).collect();
        assert_eq!(blocks.len(), 16);
        for block in blocks {
            let lines: Vec<&str> = block.lines().collect();
            assert!(lines[0].starts_with("img"));
            assert_eq!(lines.len(), 22);
        }
    }
}
