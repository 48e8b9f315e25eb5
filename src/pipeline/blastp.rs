//! Aligner backed by a local NCBI BLAST+ `blastp` installation.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::DEFAULT_MAX_EVALUE;
use crate::core::hit::RawHit;
use crate::core::query::QuerySequence;
use crate::parsing::blast::{parse_tabular, OUTFMT_COLUMNS};

use super::aligner::{AlignFuture, Aligner, AlignerError};

/// Options passed through to `blastp`
#[derive(Debug, Clone, PartialEq)]
pub struct BlastOptions {
    /// Program to run; looked up on `PATH` when not a path
    pub binary: PathBuf,
    /// BLAST protein database prefix (as given to `makeblastdb -out`)
    pub database: PathBuf,
    pub evalue: f64,
    pub word_size: u32,
    pub max_target_seqs: u32,
    /// Threads for each `blastp` process
    pub threads: u32,
}

impl BlastOptions {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("blastp"),
            database: database.into(),
            evalue: DEFAULT_MAX_EVALUE,
            word_size: 3,
            max_target_seqs: 500,
            threads: 1,
        }
    }
}

/// Runs `blastp` once per query against a prepared database
#[derive(Debug, Clone)]
pub struct BlastpAligner {
    options: BlastOptions,
}

impl BlastpAligner {
    #[must_use]
    pub fn new(options: BlastOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &BlastOptions {
        &self.options
    }

    fn command_args(&self, query_path: &Path) -> Vec<OsString> {
        let opts = &self.options;
        vec![
            "-query".into(),
            query_path.into(),
            "-db".into(),
            opts.database.clone().into(),
            "-evalue".into(),
            opts.evalue.to_string().into(),
            "-max_target_seqs".into(),
            opts.max_target_seqs.to_string().into(),
            "-num_threads".into(),
            opts.threads.to_string().into(),
            "-word_size".into(),
            opts.word_size.to_string().into(),
            "-outfmt".into(),
            format!("6 {OUTFMT_COLUMNS}").into(),
        ]
    }

    async fn run(&self, query: &QuerySequence) -> Result<Vec<RawHit>, AlignerError> {
        let mut fasta = tempfile::Builder::new()
            .prefix("cog-query-")
            .suffix(".faa")
            .tempfile()?;
        fasta.write_all(query.to_fasta().as_bytes())?;
        fasta.flush()?;

        debug!("Running {} for {}", self.options.binary.display(), query.id);

        // kill_on_drop: a timed-out or cancelled alignment must not linger
        let output = Command::new(&self.options.binary)
            .args(self.command_args(fasta.path()))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AlignerError::Launch {
                program: self.options.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(AlignerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_tabular(output.stdout.as_slice())?)
    }
}

impl Aligner for BlastpAligner {
    fn align<'a>(&'a self, query: &'a QuerySequence) -> AlignFuture<'a> {
        Box::pin(self.run(query))
    }

    fn name(&self) -> &str {
        "blastp"
    }
}

/// Version line reported by `<binary> -version`, e.g. `blastp: 2.15.0+`
///
/// # Errors
///
/// Returns `AlignerError::Launch` if the program cannot be started or
/// `AlignerError::Failed` if it exits unsuccessfully.
pub async fn blastp_version(binary: &Path) -> Result<String, AlignerError> {
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| AlignerError::Launch {
            program: binary.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(AlignerError::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let aligner = BlastpAligner::new(BlastOptions::new("/data/cog/cog-20"));
        let args: Vec<String> = aligner
            .command_args(Path::new("/tmp/q.faa"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let value_of = |flag: &str| {
            let pos = args.iter().position(|a| a == flag).unwrap();
            args[pos + 1].clone()
        };
        assert_eq!(value_of("-query"), "/tmp/q.faa");
        assert_eq!(value_of("-db"), "/data/cog/cog-20");
        assert_eq!(value_of("-evalue"), "0.00001");
        assert_eq!(value_of("-word_size"), "3");
        assert_eq!(value_of("-outfmt"), format!("6 {OUTFMT_COLUMNS}"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let mut options = BlastOptions::new("db");
        options.binary = PathBuf::from("/nonexistent/blastp");
        let aligner = BlastpAligner::new(options);

        let err = aligner
            .align(&QuerySequence::new("q1", "MKTAYIAKQR"))
            .await
            .unwrap_err();
        assert!(matches!(err, AlignerError::Launch { .. }));

        let err = blastp_version(Path::new("/nonexistent/blastp")).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/blastp"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_reported() {
        let mut options = BlastOptions::new("db");
        options.binary = PathBuf::from("false");
        let aligner = BlastpAligner::new(options);

        let err = aligner
            .align(&QuerySequence::new("q1", "MKTAYIAKQR"))
            .await
            .unwrap_err();
        assert!(matches!(err, AlignerError::Failed { .. }));
    }
}
