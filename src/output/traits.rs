//! Report writer trait and output errors

use crate::crawler::CrawlReport;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A file format a finished run can be written as
pub trait ReportWriter {
    /// Short format name used in log lines
    fn name(&self) -> &'static str;

    /// Renders the complete file contents
    fn render(&self, report: &CrawlReport) -> OutputResult<String>;

    /// Renders the report and writes it to `path`
    ///
    /// Missing parent directories are created. An existing file is replaced.
    fn write_to(&self, report: &CrawlReport, path: &Path) -> OutputResult<()> {
        let contents = self.render(report)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    OutputError::Write(format!("{}: {}", parent.display(), e))
                })?;
            }
        }
        fs::write(path, contents)?;

        tracing::info!("Wrote {} output to {}", self.name(), path.display());
        Ok(())
    }
}
