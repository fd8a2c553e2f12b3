//! The `sortpix evaluate` command: score the models without tagging.

use std::path::PathBuf;

use clap::Args;
use sortpix_core::{Config, EvaluationReport, SortPix};

/// Arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory to search for manually tagged images (defaults to paths.input_dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Execute the evaluate command.
pub async fn execute(mut config: Config, args: EvaluateArgs) -> anyhow::Result<()> {
    if let Some(input) = args.input {
        config.paths.input_dir = input;
    }

    let sortpix = SortPix::new(config)?;
    if sortpix.overrides().manual_entries().is_empty() {
        tracing::warn!("No manual tags recorded; add some with `sortpix tag`");
    }

    let report = sortpix.evaluate().await;
    if let EvaluationReport::Score { images, labels, .. } = &report {
        eprintln!("Scored {images} image(s) over {labels} label(s)");
    }
    println!("{report}");
    Ok(())
}
