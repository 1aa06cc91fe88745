//! Email CSV export
//!
//! Header `email,url,context`, one row per registry record in first-seen
//! order. A missing context is an empty field. Fields are quoted only when
//! they hold a delimiter, a quote or a line break.

use super::traits::{OutputError, OutputResult, ReportWriter};
use crate::crawler::CrawlReport;
use crate::state::EmailRecord;

pub const CSV_HEADER: [&str; 3] = ["email", "url", "context"];

/// Writes the email CSV
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvWriter;

impl ReportWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "CSV"
    }

    fn render(&self, report: &CrawlReport) -> OutputResult<String> {
        format_csv(&report.emails)
    }
}

/// Formats email records as CSV text
pub fn format_csv(records: &[EmailRecord]) -> OutputResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.email.as_str(),
            record.url.as_str(),
            record.context.map_or("", |c| c.as_str()),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ContextLabel;

    fn record(email: &str, url: &str, context: Option<ContextLabel>) -> EmailRecord {
        EmailRecord {
            email: email.to_string(),
            url: url.to_string(),
            context,
        }
    }

    #[test]
    fn test_rows_follow_header() {
        let csv = format_csv(&[
            record(
                "info@site.test",
                "https://site.test/",
                Some(ContextLabel::Information),
            ),
            record("x@site.test", "https://site.test/a", None),
        ])
        .unwrap();

        assert_eq!(
            csv,
            "email,url,context\n\
             info@site.test,https://site.test/,Information Email\n\
             x@site.test,https://site.test/a,\n"
        );
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(format_csv(&[]).unwrap(), "email,url,context\n");
    }

    #[test]
    fn test_fields_are_quoted() {
        let csv = format_csv(&[
            record("a@site.test", "https://site.test/?a=1,2", None),
            record("b@site.test", "https://site.test/say\"hi\"", None),
            record("c@site.test", "https://site.test/line\nbreak", None),
        ])
        .unwrap();

        let rows: Vec<_> = csv.split_inclusive('\n').skip(1).collect();
        assert_eq!(rows[0], "a@site.test,\"https://site.test/?a=1,2\",\n");
        assert_eq!(rows[1], "b@site.test,\"https://site.test/say\"\"hi\"\"\",\n");
        assert_eq!(rows[2], "c@site.test,\"https://site.test/line\n");
        assert_eq!(rows[3], "break\",\n");
    }
}
