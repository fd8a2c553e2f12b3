//! Batch driver: discover, fan out to a bounded worker pool, collect, evaluate.
//!
//! Each image is one unit of work that runs to completion on a blocking
//! thread (resolve → infer → project → log). At most `parallel_workers`
//! units run at once. A failing unit is recorded and the batch carries on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, Result};
use crate::evaluation::Evaluator;
use crate::inference::InferenceAdapter;
use crate::overrides::OverrideStore;
use crate::types::{BatchReport, EvaluationReport, ImageRecord, Resolution, UnitOutcome, UnitResult};

use super::confidence_log::ConfidenceLog;
use super::discovery::FileDiscovery;
use super::projector::TagProjector;
use super::resolve::{placement_tags, resolve};

/// State shared read-only by every unit of work.
struct UnitContext {
    adapter: Arc<dyn InferenceAdapter>,
    overrides: Arc<OverrideStore>,
    projector: TagProjector,
    log: ConfidenceLog,
}

impl UnitContext {
    fn process(&self, record: &ImageRecord) -> PipelineResult<UnitOutcome> {
        let name = record.name();
        let resolution = resolve(&self.overrides, &name);
        if resolution == Resolution::Skipped {
            tracing::debug!("Skipping {:?}", record.path);
            return Ok(UnitOutcome::Skipped);
        }

        // Manual images are inferred too, so the log shows what the models
        // would have said.
        let output = self.adapter.infer(&record.path)?;
        let tags = placement_tags(&resolution, &output);
        let links_created = self.projector.place(record, &tags)?;
        self.log.log(&name, &output)?;

        tracing::debug!("Tagged {:?} with {:?}", record.relative, tags);
        Ok(match resolution {
            Resolution::Manual(_) => UnitOutcome::Manual {
                tags,
                links_created,
            },
            _ => UnitOutcome::Automatic {
                tags,
                links_created,
            },
        })
    }
}

/// Runs the whole tagging batch followed by the evaluation pass.
pub struct BatchDriver {
    adapter: Arc<dyn InferenceAdapter>,
    overrides: Arc<OverrideStore>,
    discovery: FileDiscovery,
    input_root: PathBuf,
    output_root: PathBuf,
    log_path: PathBuf,
    parallel_workers: usize,
}

impl BatchDriver {
    pub fn new(
        config: &Config,
        adapter: Arc<dyn InferenceAdapter>,
        overrides: Arc<OverrideStore>,
    ) -> Self {
        let output_root = config.output_dir();
        Self {
            adapter,
            overrides,
            discovery: FileDiscovery::new(config.processing.clone()).excluding(&output_root),
            input_root: config.input_dir(),
            output_root,
            log_path: config.confidence_log(),
            parallel_workers: config.processing.parallel_workers.max(1),
        }
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// All images the batch would process.
    pub fn discover(&self) -> Vec<ImageRecord> {
        self.discovery.discover(&self.input_root)
    }

    /// Process every image, then evaluate.
    ///
    /// `on_result` is called from worker threads as each unit finishes.
    pub async fn run<F>(&self, on_result: F) -> Result<BatchReport>
    where
        F: Fn(&UnitResult) + Send + Sync + 'static,
    {
        let files = self.discover();
        self.run_files(files, on_result).await
    }

    /// Process an already-discovered set of images, then evaluate.
    pub async fn run_files<F>(&self, files: Vec<ImageRecord>, on_result: F) -> Result<BatchReport>
    where
        F: Fn(&UnitResult) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let log = ConfidenceLog::create(&self.log_path)?;
        let ctx = Arc::new(UnitContext {
            adapter: self.adapter.clone(),
            overrides: self.overrides.clone(),
            projector: TagProjector::new(&self.output_root),
            log,
        });

        tracing::info!(
            "Processing {} image(s) with {} worker(s)",
            files.len(),
            self.parallel_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.parallel_workers));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(files.len());

        for record in &files {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Worker pool closed unexpectedly, stopping batch");
                break;
            };

            let ctx = ctx.clone();
            let on_result = on_result.clone();
            let record = record.clone();
            let path = record.path.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let result = match ctx.process(&record) {
                    Ok(outcome) => UnitResult::Success(record.path.clone(), outcome),
                    Err(e) => UnitResult::Failure(record.path.clone(), e.to_string()),
                };
                drop(permit);
                on_result(&result);
                result
            });
            handles.push((path, handle));
        }

        let mut report = BatchReport {
            discovered: files.len(),
            automatic: 0,
            manual: 0,
            skipped: 0,
            failures: Vec::new(),
            links_created: 0,
            elapsed: start.elapsed(),
            evaluation: EvaluationReport::NoData,
        };

        for (path, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                // The unit died before reporting; report it here instead.
                let err = PipelineError::Worker {
                    path: path.clone(),
                    message: e.to_string(),
                };
                let result = UnitResult::Failure(path, err.to_string());
                on_result(&result);
                result
            });
            match result {
                UnitResult::Success(_, UnitOutcome::Skipped) => report.skipped += 1,
                UnitResult::Success(_, UnitOutcome::Manual { links_created, .. }) => {
                    report.manual += 1;
                    report.links_created += links_created;
                }
                UnitResult::Success(_, UnitOutcome::Automatic { links_created, .. }) => {
                    report.automatic += 1;
                    report.links_created += links_created;
                }
                UnitResult::Failure(path, message) => {
                    tracing::error!("Failed: {:?} - {}", path, message);
                    report.failures.push((path, message));
                }
            }
        }

        tracing::info!(
            "Batch done: {} automatic, {} manual, {} skipped, {} failed",
            report.automatic,
            report.manual,
            report.skipped,
            report.failed()
        );

        // All workers have joined; evaluation sees the finished output.
        report.evaluation = self.evaluate().await;
        ctx.log.append_line(&report.evaluation.to_string())?;

        report.elapsed = start.elapsed();
        Ok(report)
    }

    /// Run only the evaluation pass.
    pub async fn evaluate(&self) -> EvaluationReport {
        let evaluator = Evaluator::new(self.adapter.clone(), self.discovery.clone());
        let overrides = self.overrides.clone();
        let input_root = self.input_root.clone();

        tokio::task::spawn_blocking(move || evaluator.evaluate(&input_root, &overrides))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Evaluation task failed: {e}");
                EvaluationReport::NoData
            })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::overrides::ManualTagImage;
    use crate::types::{Classification, Detection, InferenceOutput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Detects "dog", classifies "beagle". Fails for files named `corrupt*`
    /// and panics for files named `panic*`.
    struct ScriptedAdapter {
        calls: AtomicUsize,
    }

    impl InferenceAdapter for ScriptedAdapter {
        fn infer(&self, path: &Path) -> std::result::Result<InferenceOutput, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = path.file_name().unwrap().to_string_lossy();
            if name.starts_with("panic") {
                panic!("model crashed on {name}");
            }
            if name.starts_with("corrupt") {
                return Err(InferenceError::Decode {
                    path: path.to_path_buf(),
                    message: "bad data".into(),
                });
            }
            Ok(InferenceOutput {
                detections: vec![Detection {
                    tag: "dog".into(),
                    confidence: 0.8,
                }],
                classification: Classification {
                    label: "beagle".into(),
                    confidence: 0.6,
                },
            })
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        config: Config,
    }

    fn fixture(images: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.input_dir = dir.path().join("images");
        config.paths.output_dir = dir.path().join("processed");
        config.paths.confidence_log = dir.path().join("confidence_log.txt");
        config.processing.parallel_workers = 3;
        for image in images {
            let path = config.paths.input_dir.join(image);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"img").unwrap();
        }
        Fixture { _dir: dir, config }
    }

    fn driver(config: &Config, overrides: OverrideStore) -> (BatchDriver, Arc<ScriptedAdapter>) {
        let adapter = Arc::new(ScriptedAdapter {
            calls: AtomicUsize::new(0),
        });
        let driver = BatchDriver::new(config, adapter.clone(), Arc::new(overrides));
        (driver, adapter)
    }

    fn manual(name: &str, tags: &[&str]) -> ManualTagImage {
        ManualTagImage {
            image_name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_precedence_skip_manual_automatic() {
        let fx = fixture(&["auto.jpg", "manual.jpg", "both.jpg"]);
        let overrides = OverrideStore::from_parts(
            vec!["both.jpg".to_string()],
            vec![manual("manual.jpg", &["sofa"]), manual("both.jpg", &["x"])],
        );
        let (driver, adapter) = driver(&fx.config, overrides);

        let report = driver.run(|_| {}).await.unwrap();
        assert_eq!(report.discovered, 3);
        assert_eq!(report.automatic, 1);
        assert_eq!(report.manual, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed(), 0);

        let out = fx.config.output_dir();
        assert!(out.join("dog/auto.jpg").symlink_metadata().is_ok());
        assert!(out.join("beagle/auto.jpg").symlink_metadata().is_ok());
        assert!(out.join("sofa/manual.jpg").symlink_metadata().is_ok());
        assert!(out.join("dog/manual.jpg").symlink_metadata().is_err());
        assert!(out.join("x/both.jpg").symlink_metadata().is_err());

        let log = std::fs::read_to_string(fx.config.confidence_log()).unwrap();
        assert!(log.contains("auto.jpg\n"));
        assert!(log.contains("manual.jpg\n"));
        assert!(!log.contains("both.jpg"));

        // Two batch inferences, then both manual entries are inferred again
        // for evaluation even though one of them is skipped.
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 4);
        assert!(log.trim_end().ends_with("Macro F1: 0.0000"));
    }

    #[tokio::test]
    async fn test_failed_unit_does_not_stop_batch() {
        let fx = fixture(&["a.jpg", "corrupt.png", "sub/b.jpeg"]);
        let (driver, _) = driver(&fx.config, OverrideStore::default());

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let report = driver
            .run(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(report.automatic, 2);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].0.ends_with("corrupt.png"));

        let out = fx.config.output_dir();
        assert!(out.join("dog/sub/b.jpeg").symlink_metadata().is_ok());
        assert!(out.join("dog/corrupt.png").symlink_metadata().is_err());
        let log = std::fs::read_to_string(fx.config.confidence_log()).unwrap();
        assert!(!log.contains("corrupt.png"));
        assert!(log.trim_end().ends_with("Macro F1: no data"));
    }

    #[tokio::test]
    async fn test_panicking_unit_is_reported_once() {
        let fx = fixture(&["a.jpg", "panic.jpg", "b.jpg"]);
        let (driver, _) = driver(&fx.config, OverrideStore::default());

        let reported = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reported.clone();
        let report = driver
            .run(move |r: &UnitResult| sink.lock().unwrap().push(r.path().clone()))
            .await
            .unwrap();

        let reported = reported.lock().unwrap();
        assert_eq!(reported.len(), 3);
        assert_eq!(
            reported.iter().filter(|p| p.ends_with("panic.jpg")).count(),
            1
        );
        assert_eq!(report.automatic, 2);
        assert_eq!(report.failed(), 1);
        assert!(report.failures[0].1.contains("Worker failed"));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let fx = fixture(&["a.jpg", "x/y/b.jpg"]);
        let (driver, _) = driver(&fx.config, OverrideStore::default());

        let first = driver.run(|_| {}).await.unwrap();
        let log_first = std::fs::read_to_string(fx.config.confidence_log()).unwrap();
        let second = driver.run(|_| {}).await.unwrap();
        let log_second = std::fs::read_to_string(fx.config.confidence_log()).unwrap();

        assert_eq!(first.links_created, 4);
        assert_eq!(second.links_created, 0);
        assert_eq!(log_first.len(), log_second.len());
        assert_eq!(
            std::fs::read_dir(fx.config.output_dir().join("dog")).unwrap().count(),
            2
        );
    }

    #[tokio::test]
    async fn test_output_inside_input_is_not_rediscovered() {
        let mut fx = fixture(&["a.jpg"]);
        fx.config.paths.output_dir = fx.config.paths.input_dir.join("processed");
        let (driver, _) = driver(&fx.config, OverrideStore::default());

        driver.run(|_| {}).await.unwrap();
        let second = driver.run(|_| {}).await.unwrap();
        assert_eq!(second.discovered, 1);
    }

    #[tokio::test]
    async fn test_evaluate_only() {
        let fx = fixture(&["m.jpg"]);
        let overrides =
            OverrideStore::from_parts(Vec::new(), vec![manual("m.jpg", &["dog", "beagle"])]);
        let (driver, _) = driver(&fx.config, overrides);

        let report = driver.evaluate().await;
        assert_eq!(report.to_string(), "Macro F1: 1.0000");
    }
}
