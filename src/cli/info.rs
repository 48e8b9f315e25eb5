use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::cli::{CatalogSource, OutputFormat};
use crate::config::ClassifierConfig;
use crate::parsing::blast::OUTFMT_COLUMNS;
use crate::pipeline::blastp::blastp_version;

#[derive(Args)]
pub struct InfoArgs {
    /// blastp executable to check
    #[arg(long, default_value = "blastp")]
    pub blastp: PathBuf,

    /// Also report statistics for this catalog
    #[command(flatten)]
    pub catalog: CatalogSource,
}

/// Run the info command
///
/// # Errors
///
/// Returns an error only if a catalog was given and fails to load.
pub fn run(args: InfoArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let blastp = runtime.block_on(blastp_version(&args.blastp));

    let stats = if args.catalog.is_given() {
        Some(args.catalog.load()?.statistics())
    } else {
        None
    };
    let defaults = ClassifierConfig::default();

    match format {
        OutputFormat::Json => {
            let value = json!({
                "version": env!("CARGO_PKG_VERSION"),
                "blastp": match &blastp {
                    Ok(version) => json!({ "available": true, "version": version }),
                    Err(e) => json!({ "available": false, "error": e.to_string() }),
                },
                "blast_outfmt": format!("6 {OUTFMT_COLUMNS}"),
                "default_config": defaults,
                "catalog": stats,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("cog-classifier {}", env!("CARGO_PKG_VERSION"));
            match &blastp {
                Ok(version) => println!("blastp:       {version}"),
                Err(e) => println!("blastp:       not available ({e})"),
            }
            println!("Hits format:  -outfmt \"6 {OUTFMT_COLUMNS}\"");
            println!("\nDefaults:");
            println!("  max_evalue:             {:e}", defaults.max_evalue);
            println!("  max_hits_per_query:     {}", defaults.max_hits_per_query);
            println!("  thread_count:           {}", defaults.thread_count);
            println!("  per_query_timeout_secs: {}", defaults.per_query_timeout_secs);

            if let Some(stats) = stats {
                println!("\nCatalog:");
                println!("  COGs:                  {}", stats.total_cogs);
                println!("  Protein assignments:   {}", stats.total_proteins);
                println!("  Functional categories: {}", stats.functional_categories);
            }
        }
    }
    Ok(())
}
