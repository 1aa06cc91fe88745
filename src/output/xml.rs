//! Structured XML document
//!
//! Layout:
//!
//! ```text
//! <website domain="..." date_scraped="YYYY-MM-DD HH:MM:SS">
//!   <summary><total_pages/><total_emails/></summary>
//!   <pages>
//!     <page>
//!       <url_info><full_url/><path/></url_info>
//!       <title/>
//!       <content/>
//!       <emails><email><address/><context/></email></emails>
//!     </page>
//!   </pages>
//! </website>
//! ```
//!
//! A page lists the registry records whose first-seen URL is that page.

use super::traits::{OutputResult, ReportWriter};
use crate::crawler::CrawlReport;
use crate::state::{EmailRecord, PageResult};
use url::Url;

const INDENT: &str = "  ";

/// Label written when a record has no context
pub const UNKNOWN_CONTEXT: &str = "Unknown";

/// Writes the XML document
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlWriter;

impl ReportWriter for XmlWriter {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn render(&self, report: &CrawlReport) -> OutputResult<String> {
        Ok(format_xml(report))
    }
}

/// Formats a finished run as the XML document
pub fn format_xml(report: &CrawlReport) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<website domain=\"{}\" date_scraped=\"{}\">\n",
        escape_xml(&report.base_domain),
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    ));

    xml.push_str(&format!("{}<summary>\n", INDENT));
    push_leaf(&mut xml, 2, "total_pages", &report.pages.len().to_string());
    push_leaf(&mut xml, 2, "total_emails", &report.emails.len().to_string());
    xml.push_str(&format!("{}</summary>\n", INDENT));

    if report.pages.is_empty() {
        xml.push_str(&format!("{}<pages/>\n", INDENT));
    } else {
        xml.push_str(&format!("{}<pages>\n", INDENT));
        for page in &report.pages {
            push_page(&mut xml, page, &report.emails);
        }
        xml.push_str(&format!("{}</pages>\n", INDENT));
    }

    xml.push_str("</website>\n");
    xml
}

fn push_page(xml: &mut String, page: &PageResult, emails: &[EmailRecord]) {
    let pad = INDENT.repeat(2);
    xml.push_str(&format!("{}<page>\n", pad));

    xml.push_str(&format!("{}<url_info>\n", INDENT.repeat(3)));
    push_leaf(xml, 4, "full_url", &page.url);
    push_leaf(xml, 4, "path", &url_path(&page.url));
    xml.push_str(&format!("{}</url_info>\n", INDENT.repeat(3)));

    push_leaf(xml, 3, "title", &page.title);
    push_leaf(xml, 3, "content", &page.content);

    let page_emails: Vec<_> = emails.iter().filter(|e| e.url == page.url).collect();
    if page_emails.is_empty() {
        xml.push_str(&format!("{}<emails/>\n", INDENT.repeat(3)));
    } else {
        xml.push_str(&format!("{}<emails>\n", INDENT.repeat(3)));
        for record in page_emails {
            xml.push_str(&format!("{}<email>\n", INDENT.repeat(4)));
            push_leaf(xml, 5, "address", &record.email);
            push_leaf(
                xml,
                5,
                "context",
                record.context.map_or(UNKNOWN_CONTEXT, |c| c.as_str()),
            );
            xml.push_str(&format!("{}</email>\n", INDENT.repeat(4)));
        }
        xml.push_str(&format!("{}</emails>\n", INDENT.repeat(3)));
    }

    xml.push_str(&format!("{}</page>\n", pad));
}

fn push_leaf(xml: &mut String, depth: usize, tag: &str, text: &str) {
    let pad = INDENT.repeat(depth);
    if text.is_empty() {
        xml.push_str(&format!("{}<{}/>\n", pad, tag));
    } else {
        xml.push_str(&format!("{}<{}>{}</{}>\n", pad, tag, escape_xml(text), tag));
    }
}

/// Path component of `url`, empty if it does not parse
fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}

/// Escapes the five XML special characters and drops characters XML 1.0
/// cannot represent
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}
