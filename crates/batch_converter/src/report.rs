//! Per-file statuses and the end-of-run summary.

use std::fmt;
use std::path::PathBuf;

use code_synthesizer::SynthesisError;
use source_extractor::{ExtractError, ExtractionWarning};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("parse failed: {0}")]
    Parse(#[from] ExtractError),

    #[error("generation failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

#[derive(Debug)]
pub enum FileStatus {
    Converted {
        tools: Vec<String>,
        warnings: Vec<ExtractionWarning>,
    },
    AlreadyConverted,
    NotApplicable,
    Failed(ConvertError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Nothing was written, even for `Converted`.
    pub dry_run: bool,
}

impl FileReport {
    /// One line for the console.
    pub fn status_line(&self) -> String {
        let path = self.path.display();
        match &self.status {
            FileStatus::Converted { tools, warnings } => {
                let verb = if self.dry_run { "would convert" } else { "converted" };
                let mut line = format!("{}: {} ({} tool(s))", verb, path, tools.len());
                for warning in warnings {
                    line.push_str(&format!("; warning: {}", warning));
                }
                line
            }
            FileStatus::AlreadyConverted => format!("skipped: {} (already converted)", path),
            FileStatus::NotApplicable => format!("skipped: {} (no framework markers)", path),
            FileStatus::Failed(err) => format!("failed: {} ({})", path, err),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub converted: usize,
    pub already_converted: usize,
    pub not_applicable: usize,
    pub failed: usize,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn record(&mut self, report: FileReport) {
        match report.status {
            FileStatus::Converted { .. } => self.converted += 1,
            FileStatus::AlreadyConverted => self.already_converted += 1,
            FileStatus::NotApplicable => self.not_applicable += 1,
            FileStatus::Failed(_) => self.failed += 1,
        }
        self.reports.push(report);
    }

    /// A task that died before producing a report.
    pub fn record_lost_task(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.converted + self.already_converted + self.not_applicable + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s): {} converted, {} already converted, {} not applicable, {} failed",
            self.total(),
            self.converted,
            self.already_converted,
            self.not_applicable,
            self.failed
        )
    }
}
