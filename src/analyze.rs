//! Analysis entry point: locate the sample log, read it, group outages,
//! build the report.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

use crate::config::AnalyzerConfig;
use crate::outage::group_outages;
use crate::report::{build_report, Report, ReportError};
use crate::sample::{read_sample_log, SampleLogError};
use crate::trace::TraceDir;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("CSV not found: {}", first_path(.tried))]
    NoSampleLog { tried: Vec<PathBuf> },
    #[error("Failed to read sample log: {0}")]
    Read(#[from] SampleLogError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("Reader task failed: {0}")]
    Task(#[from] JoinError),
}

fn first_path(paths: &[PathBuf]) -> String {
    paths
        .first()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

impl AnalyzeError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalyzeError::NoSampleLog { .. } => 2,
            _ => 1,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub enum Outcome {
    /// The log held no usable rows.
    Empty { sample_log: PathBuf },
    Analyzed {
        sample_log: PathBuf,
        report: Box<Report>,
        skipped_rows: usize,
    },
}

pub async fn analyze(cfg: &AnalyzerConfig) -> Result<Outcome, AnalyzeError> {
    let Some(location) = cfg.locate_sample_log() else {
        return Err(AnalyzeError::NoSampleLog {
            tried: cfg.candidate_logs().into(),
        });
    };
    if location.fallback {
        let [configured, _] = cfg.candidate_logs();
        tracing::warn!(
            "CSV not found at {}, using fallback {}",
            configured.display(),
            location.sample_log.display()
        );
    }
    tracing::info!("Reading samples from {}", location.sample_log.display());

    let path = location.sample_log.clone();
    let log = tokio::task::spawn_blocking(move || read_sample_log(&path)).await??;
    if log.samples.is_empty() {
        return Ok(Outcome::Empty {
            sample_log: location.sample_log,
        });
    }
    tracing::info!(
        "Loaded {} samples ({} skipped, {} with derived status)",
        log.samples.len(),
        log.skipped_rows,
        log.derived_status
    );

    let grouped = group_outages(&log.samples);
    tracing::info!("Found {} outages", grouped.outages.len());

    let report = build_report(
        log.samples.into(),
        Arc::new(grouped),
        Arc::new(TraceDir::new(&location.log_dir)),
        cfg.top_hours,
    )
    .await?;

    Ok(Outcome::Analyzed {
        sample_log: location.sample_log,
        report: Box::new(report),
        skipped_rows: log.skipped_rows,
    })
}
