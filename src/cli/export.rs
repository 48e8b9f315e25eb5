use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::result::BatchResult;
use crate::export::{export, export_to_file, ExportFormat};

#[derive(Args)]
pub struct ExportArgs {
    /// JSON results written by `classify`
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output format: json, csv or tsv (default: from the output extension, else csv)
    #[arg(long)]
    pub output_format: Option<String>,

    /// Output file (stdout if not given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the export command
///
/// # Errors
///
/// Returns an error if the format is unsupported, the input is not a saved
/// batch, or the output cannot be written.
pub fn run(args: ExportArgs, _format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let format = match &args.output_format {
        Some(name) => name.parse()?,
        None => args
            .output
            .as_deref()
            .and_then(ExportFormat::from_path)
            .unwrap_or(ExportFormat::Csv),
    };

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let batch: BatchResult = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not a saved classification result", args.input.display()))?;

    if verbose {
        eprintln!("Loaded {} results from {}", batch.len(), args.input.display());
    }
    if !batch.complete {
        eprintln!("Warning: {} holds a partial (cancelled) batch", args.input.display());
    }

    match &args.output {
        Some(path) => export_to_file(&batch, &format.to_string(), path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let text = export(&batch, format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
