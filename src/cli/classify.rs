use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Args};
use tracing::{info, warn};

use crate::cli::{CatalogSource, OutputFormat};
use crate::config::ClassifierConfig;
use crate::core::result::{BatchResult, BatchSummary};
use crate::export::{export, export_to_file, ExportFormat};
use crate::matching::aggregate::AggregationError;
use crate::parsing::blast::{group_by_query, parse_tabular_file};
use crate::parsing::fasta::read_queries;
use crate::pipeline::aligner::{Aligner, PrecomputedHits};
use crate::pipeline::blastp::{BlastOptions, BlastpAligner};
use crate::pipeline::runner::{BatchRunner, CancelHandle};
use crate::utils::validation::format_evalue;

#[derive(Args)]
#[command(group(ArgGroup::new("hit_source").required(true).args(["hits", "blast_db"])))]
pub struct ClassifyArgs {
    /// Protein FASTA file (.fa, .fasta, .faa, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogSource,

    /// Precomputed BLAST tabular hits (outfmt 6 with the columns shown by `info`)
    #[arg(long, value_name = "FILE")]
    pub hits: Option<PathBuf>,

    /// BLAST protein database to search with blastp
    #[arg(long, value_name = "DB")]
    pub blast_db: Option<PathBuf>,

    /// blastp executable
    #[arg(long, default_value = "blastp")]
    pub blastp: PathBuf,

    /// Output file (stdout if not given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: json, csv or tsv (default: from the output extension, else json)
    #[arg(long)]
    pub output_format: Option<String>,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum e-value (inclusive)
    #[arg(long)]
    pub max_evalue: Option<f64>,

    /// Number of ranked hits kept per query
    #[arg(long)]
    pub max_hits: Option<usize>,

    /// Minimum percent identity (inclusive)
    #[arg(long)]
    pub min_identity: Option<f64>,

    /// Minimum percent query coverage (inclusive)
    #[arg(long)]
    pub min_coverage: Option<f64>,

    /// Mark queries AMBIGUOUS when the top two bit scores differ by at most this much
    #[arg(long)]
    pub ambiguity_delta: Option<f64>,

    /// Number of concurrent alignments
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Per-query alignment timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,
}

impl ClassifyArgs {
    /// File config (or defaults) with command-line overrides applied
    fn resolve_config(&self) -> anyhow::Result<ClassifierConfig> {
        let mut config = match &self.config {
            Some(path) => ClassifierConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ClassifierConfig::default(),
        };

        if let Some(v) = self.max_evalue {
            config.max_evalue = v;
        }
        if let Some(v) = self.max_hits {
            config.max_hits_per_query = v;
        }
        if self.min_identity.is_some() {
            config.min_identity = self.min_identity;
        }
        if self.min_coverage.is_some() {
            config.min_coverage = self.min_coverage;
        }
        if self.ambiguity_delta.is_some() {
            config.ambiguity_delta = self.ambiguity_delta;
        }
        if let Some(v) = self.threads {
            config.thread_count = v;
        }
        if let Some(v) = self.timeout {
            config.per_query_timeout_secs = v;
        }

        config.validate()?;
        Ok(config)
    }

    fn export_format(&self) -> anyhow::Result<ExportFormat> {
        if let Some(name) = &self.output_format {
            return Ok(name.parse()?);
        }
        Ok(self
            .output
            .as_deref()
            .and_then(ExportFormat::from_path)
            .unwrap_or(ExportFormat::Json))
    }
}

/// Run the classify command
///
/// # Errors
///
/// Returns an error if inputs cannot be read, the catalog fails to load,
/// the configuration is invalid, or the run was cancelled.
pub fn run(args: ClassifyArgs, format: OutputFormat, _verbose: bool) -> anyhow::Result<()> {
    // Fail on a bad format name before doing any work
    let export_format = args.export_format()?;
    let config = args.resolve_config()?;

    let queries = read_queries(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    info!("Read {} query sequences", queries.len());

    let catalog = Arc::new(args.catalog.load()?);

    let aligner: Arc<dyn Aligner> = if let Some(path) = &args.hits {
        let hits = parse_tabular_file(path)
            .with_context(|| format!("Failed to parse hits file {}", path.display()))?;
        let precomputed = PrecomputedHits::new(group_by_query(hits));

        let ids: HashSet<&str> = queries.iter().map(|q| q.id.as_str()).collect();
        if let Some(unknown) = precomputed.unknown_queries(|id| ids.contains(id)).next() {
            return Err(AggregationError::UnknownQuery(unknown.to_string()))
                .with_context(|| format!("Hits file {} does not match {}", path.display(), args.input.display()));
        }
        Arc::new(precomputed)
    } else if let Some(db) = &args.blast_db {
        let mut options = BlastOptions::new(db);
        options.binary = args.blastp.clone();
        options.evalue = config.max_evalue;
        Arc::new(BlastpAligner::new(options))
    } else {
        anyhow::bail!("Either --hits or --blast-db is required");
    };

    let runner = BatchRunner::new(catalog, aligner, config);
    let runtime = tokio::runtime::Runtime::new()?;
    let batch = runtime.block_on(async move {
        let cancel = CancelHandle::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing with partial results");
                on_interrupt.cancel();
            }
        });
        runner.run(queries, &cancel).await
    })?;

    match &args.output {
        Some(path) => {
            export_to_file(&batch, &export_format.to_string(), path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let text = export(&batch, export_format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    print_summary(&batch, format)?;

    if !batch.complete {
        anyhow::bail!(
            "Classification was cancelled; {} of {} queries finished",
            batch.summary.total_queries - batch.summary.cancelled,
            batch.summary.total_queries
        );
    }
    Ok(())
}

/// Write the batch summary to stderr
fn print_summary(batch: &BatchResult, format: OutputFormat) -> anyhow::Result<()> {
    let summary = &batch.summary;
    match format {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Tsv => {
            eprintln!("metric\tvalue");
            for (name, value) in summary_rows(summary) {
                eprintln!("{name}\t{value}");
            }
        }
        OutputFormat::Text => {
            eprintln!("Classification summary");
            eprintln!("{}", "-".repeat(40));
            for (name, value) in summary_rows(summary) {
                eprintln!("{name:<24} {value:>15}");
            }

            if !summary.category_counts.is_empty() {
                eprintln!("\nCategories:");
                for (code, count) in &summary.category_counts {
                    eprintln!("  {code}  {count:>8}");
                }
            }
            if !summary.top_cogs.is_empty() {
                eprintln!("\nMost frequent COGs:");
                for cog in summary.top_cogs.iter().take(10) {
                    eprintln!("  {:<10} {:>8}", cog.cog_id, cog.count);
                }
            }
            if let Some(best) = batch
                .results
                .iter()
                .filter_map(|r| r.best_hit.as_ref())
                .map(|h| h.evalue)
                .min_by(f64::total_cmp)
            {
                eprintln!("\nBest e-value: {}", format_evalue(best));
            }
        }
    }
    Ok(())
}

fn summary_rows(summary: &BatchSummary) -> Vec<(&'static str, String)> {
    vec![
        ("total_queries", summary.total_queries.to_string()),
        ("classified", summary.classified.to_string()),
        ("ambiguous", summary.ambiguous.to_string()),
        ("no_hit", summary.no_hit.to_string()),
        ("classification_rate", format!("{:.1}%", summary.classification_rate)),
        ("unresolved_hits", summary.unresolved_hits.to_string()),
        ("rejected_hits", summary.rejected_hits.to_string()),
        ("timed_out", summary.timed_out.to_string()),
        ("aligner_failures", summary.aligner_failures.to_string()),
        ("cancelled", summary.cancelled.to_string()),
        ("empty_sequences", summary.empty_sequences.to_string()),
    ]
}
