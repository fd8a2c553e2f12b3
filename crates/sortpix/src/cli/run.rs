//! The `sortpix run` command: tag a directory tree and evaluate.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use sortpix_core::{BatchReport, Config, SortPix, UnitResult};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory to tag (defaults to paths.input_dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the per-tag folders (defaults to paths.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel workers (defaults to processing.parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

impl RunArgs {
    /// Fold command-line overrides into the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.paths.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output_dir = output.clone();
        }
        if let Some(parallel) = self.parallel {
            config.processing.parallel_workers = parallel;
        }
    }
}

/// Execute the run command.
pub async fn execute(mut config: Config, args: RunArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let input = config.input_dir();
    if !input.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", input.display());
    }

    let sortpix = SortPix::new(config)?;
    let files = sortpix.driver().discover();
    if files.is_empty() {
        tracing::warn!("No supported images found under {:?}", input);
    } else {
        tracing::info!("Found {} image(s) under {:?}", files.len(), input);
    }

    let progress = create_progress_bar(files.len() as u64);
    let start = Instant::now();
    let bar = progress.clone();
    let on_result = move |result: &UnitResult| {
        if let UnitResult::Failure(path, _) = result {
            bar.println(format!("  ✗ {}", path.display()));
        }
        bar.inc(1);
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            bar.set_message(format!("{:.1} img/sec", bar.position() as f64 / elapsed));
        }
    };

    let report = sortpix.driver().run_files(files, on_result).await?;
    progress.finish_and_clear();

    print_summary(&report);
    println!("{}", report.evaluation);
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the batch.
fn print_summary(report: &BatchReport) {
    let secs = report.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        report.succeeded() as f64 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Automatic:    {:>8}", report.automatic);
    eprintln!("    Manual:       {:>8}", report.manual);
    if report.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", report.skipped);
    }
    if report.failed() > 0 {
        eprintln!("    Failed:       {:>8}", report.failed());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.discovered);
    eprintln!("    New links:    {:>8}", report.links_created);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");

    for (path, message) in &report.failures {
        eprintln!("    ✗ {}: {}", path.display(), message);
    }
}
