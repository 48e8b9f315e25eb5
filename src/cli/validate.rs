use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::parsing::fasta::{is_fasta_file, read_queries};
use crate::utils::validation::validate_sequences;

#[derive(Args)]
pub struct ValidateArgs {
    /// Protein FASTA file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Exit with an error if any sequence has a problem
    #[arg(long)]
    pub strict: bool,
}

/// Run the validate command
///
/// # Errors
///
/// Returns an error if the file cannot be parsed, or with `--strict` if
/// any sequence has a problem.
pub fn run(args: ValidateArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    if !is_fasta_file(&args.input) {
        eprintln!(
            "Warning: {} does not have a FASTA extension",
            args.input.display()
        );
    }

    let queries = read_queries(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let reports = validate_sequences(&queries);

    match format {
        OutputFormat::Text => {
            println!("Sequences: {}", queries.len());
            println!("With issues: {}", reports.len());
            for (id, issues) in &reports {
                println!("\n{id}:");
                for issue in issues {
                    println!("  - {issue}");
                }
            }
        }
        OutputFormat::Json => {
            let value = json!({
                "sequences": queries.len(),
                "with_issues": reports.len(),
                "issues": reports
                    .iter()
                    .map(|(id, issues)| json!({
                        "sequence_id": id,
                        "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Tsv => {
            println!("sequence_id\tissue");
            for (id, issues) in &reports {
                for issue in issues {
                    println!("{id}\t{issue}");
                }
            }
        }
    }

    if args.strict && !reports.is_empty() {
        anyhow::bail!("{} of {} sequences have problems", reports.len(), queries.len());
    }
    Ok(())
}
