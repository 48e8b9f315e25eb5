use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::catalog::index::{CogSearch, SearchField};
use crate::catalog::snapshot::save_snapshot;
use crate::catalog::store::{CogCatalog, CogRecord};
use crate::cli::{CatalogSource, OutputFormat};

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Show catalog statistics
    Stats {
        #[command(flatten)]
        catalog: CatalogSource,
    },

    /// List the functional categories
    Categories {
        #[command(flatten)]
        catalog: CatalogSource,
    },

    /// Show details of a COG
    Show {
        /// COG id (e.g. COG0001)
        #[arg(required = true)]
        cog_id: String,

        #[command(flatten)]
        catalog: CatalogSource,
    },

    /// Find the COG a protein accession is assigned to
    Lookup {
        /// Protein accession (e.g. WP_000001.1 or ref|WP_000001.1|)
        #[arg(required = true)]
        accession: String,

        #[command(flatten)]
        catalog: CatalogSource,
    },

    /// Search COG definitions
    Search {
        /// Text to search for (case-insensitive)
        #[arg(required = true)]
        text: String,

        /// Field to search
        #[arg(long, value_enum, default_value_t = SearchField::Description)]
        field: SearchField,

        /// Maximum number of results to show
        #[arg(long, default_value = "25")]
        limit: usize,

        #[command(flatten)]
        catalog: CatalogSource,
    },

    /// Write a binary snapshot of the catalog for faster loading
    Snapshot {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        #[command(flatten)]
        catalog: CatalogSource,
    },
}

pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::Stats { catalog } => run_stats(&catalog.load()?, format),
        CatalogCommands::Categories { catalog } => run_categories(&catalog.load()?, format),
        CatalogCommands::Show { cog_id, catalog } => run_show(&catalog.load()?, &cog_id, format),
        CatalogCommands::Lookup { accession, catalog } => {
            run_lookup(&catalog.load()?, &accession, format)
        }
        CatalogCommands::Search {
            text,
            field,
            limit,
            catalog,
        } => run_search(&catalog.load()?, &text, field, limit, format, verbose),
        CatalogCommands::Snapshot { output, catalog } => {
            let catalog = catalog.load()?;
            let info = save_snapshot(&catalog, &output)
                .with_context(|| format!("Failed to write snapshot {}", output.display()))?;
            eprintln!(
                "Wrote snapshot of {} COGs and {} protein assignments to {}",
                info.num_cogs,
                info.num_accessions,
                output.display()
            );
            Ok(())
        }
    }
}

fn run_stats(catalog: &CogCatalog, format: OutputFormat) -> anyhow::Result<()> {
    let stats = catalog.statistics();

    match format {
        OutputFormat::Text => {
            println!("COG catalog\n");
            println!("COGs:                  {}", stats.total_cogs);
            println!("Protein assignments:   {}", stats.total_proteins);
            println!("Functional categories: {}", stats.functional_categories);

            println!("\n{:<4} {:>6} {:>7}  Name", "Code", "COGs", "%");
            println!("{}", "-".repeat(80));
            for (code, count) in &stats.category_distribution {
                let pct = if stats.total_cogs == 0 {
                    0.0
                } else {
                    count_to_f64(*count) / count_to_f64(stats.total_cogs) * 100.0
                };
                println!(
                    "{:<4} {:>6} {:>6.1}%  {}",
                    code,
                    count,
                    pct,
                    catalog.category_name(*code).unwrap_or("-")
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Tsv => {
            println!("category\tname\tcogs");
            for (code, count) in &stats.category_distribution {
                println!(
                    "{}\t{}\t{}",
                    code,
                    catalog.category_name(*code).unwrap_or(""),
                    count
                );
            }
        }
    }

    Ok(())
}

fn run_categories(catalog: &CogCatalog, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for (code, name) in catalog.categories().iter() {
                println!("{code}  {name}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(catalog.categories())?);
        }
        OutputFormat::Tsv => {
            println!("code\tname");
            for (code, name) in catalog.categories().iter() {
                println!("{code}\t{name}");
            }
        }
    }
    Ok(())
}

fn record_json(catalog: &CogCatalog, record: &CogRecord) -> serde_json::Value {
    json!({
        "cog_id": record.id,
        "name": record.name,
        "categories": record.categories,
        "category_names": catalog.category_names(record),
        "gene": record.gene,
        "pathway": record.pathway,
    })
}

fn print_record(catalog: &CogCatalog, record: &CogRecord) {
    println!("COG:        {}", record.id);
    println!("Name:       {}", record.name);
    let codes: String = record.categories.iter().map(|c| c.as_char()).collect();
    println!(
        "Categories: {} ({})",
        codes,
        catalog.category_names(record).join("; ")
    );
    if let Some(gene) = &record.gene {
        println!("Gene:       {gene}");
    }
    if let Some(pathway) = &record.pathway {
        println!("Pathway:    {pathway}");
    }
}

fn run_show(catalog: &CogCatalog, cog_id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let record = CogSearch::new(catalog)
        .find_id(cog_id)
        .ok_or_else(|| anyhow::anyhow!("COG '{}' not found", cog_id))?;

    match format {
        OutputFormat::Text => print_record(catalog, record),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record_json(catalog, record))?);
        }
        OutputFormat::Tsv => {
            println!("cog_id\tname\tcategory\tgene\tpathway");
            print_tsv_row(record);
        }
    }
    Ok(())
}

fn run_lookup(catalog: &CogCatalog, accession: &str, format: OutputFormat) -> anyhow::Result<()> {
    let record = catalog.lookup(accession)?;

    match format {
        OutputFormat::Text => {
            println!("Accession:  {accession}");
            print_record(catalog, record);
        }
        OutputFormat::Json => {
            let mut value = record_json(catalog, record);
            value["accession"] = json!(accession);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Tsv => {
            println!("accession\tcog_id\tname\tcategory\tgene\tpathway");
            print!("{accession}\t");
            print_tsv_row(record);
        }
    }
    Ok(())
}

fn print_tsv_row(record: &CogRecord) {
    let codes: String = record.categories.iter().map(|c| c.as_char()).collect();
    println!(
        "{}\t{}\t{}\t{}\t{}",
        record.id,
        record.name,
        codes,
        record.gene.as_deref().unwrap_or(""),
        record.pathway.as_deref().unwrap_or("")
    );
}

fn run_search(
    catalog: &CogCatalog,
    text: &str,
    field: SearchField,
    limit: usize,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let found = CogSearch::new(catalog).search(text, field);
    if verbose {
        eprintln!("{} COGs match '{}'", found.len(), text);
    }
    let shown = &found[..found.len().min(limit)];

    match format {
        OutputFormat::Text => {
            if shown.is_empty() {
                println!("No COGs match '{text}'");
                return Ok(());
            }
            println!("{:<10} {:<6} Name", "COG", "Cat");
            println!("{}", "-".repeat(80));
            for record in shown {
                let codes: String = record.categories.iter().map(|c| c.as_char()).collect();
                println!("{:<10} {:<6} {}", record.id, codes, record.name);
            }
            if found.len() > shown.len() {
                println!(
                    "\n... and {} more (use --limit to show more)",
                    found.len() - shown.len()
                );
            }
        }
        OutputFormat::Json => {
            let values: Vec<_> = shown.iter().map(|r| record_json(catalog, r)).collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Tsv => {
            println!("cog_id\tname\tcategory\tgene\tpathway");
            for record in shown {
                print_tsv_row(record);
            }
        }
    }
    Ok(())
}
