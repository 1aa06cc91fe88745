//! Output module for writing harvest results
//!
//! This module handles:
//! - The structured XML document of pages and emails
//! - The email CSV export
//! - The console summary and end-of-run diagnostics

mod csv;
pub mod stats;
mod traits;
mod xml;

pub use self::csv::{format_csv, CsvWriter, CSV_HEADER};
pub use self::xml::{escape_xml, format_xml, XmlWriter, UNKNOWN_CONTEXT};
pub use stats::{format_summary, log_diagnostics, print_summary, RunStatistics};
pub use traits::{OutputError, OutputResult, ReportWriter};

use crate::config::OutputConfig;
use crate::crawler::CrawlReport;
use std::path::{Path, PathBuf};

/// Paths of the files a run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReports {
    pub xml: PathBuf,
    pub csv: PathBuf,
}

/// Writes the XML document and the CSV export for a finished run
///
/// # Arguments
///
/// * `report` - The finished run
/// * `config` - Output paths
///
/// # Returns
///
/// * `Ok(WrittenReports)` - Both files were written
/// * `Err(OutputError)` - A file could not be written
pub fn write_reports(report: &CrawlReport, config: &OutputConfig) -> OutputResult<WrittenReports> {
    let xml = Path::new(&config.xml_path).to_path_buf();
    let csv = Path::new(&config.csv_path).to_path_buf();

    XmlWriter.write_to(report, &xml)?;
    CsvWriter.write_to(report, &csv)?;

    Ok(WrittenReports { xml, csv })
}
