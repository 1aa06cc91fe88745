//! Email discovery over raw page text and markup
//!
//! Two independent scans run over the same text: a literal
//! `local@domain.tld` pattern, and a lightly obfuscated
//! `local at domain dot tld` pattern (also `[at]`/`(at)` and
//! `[dot]`/`(dot)`) whose matches are rewritten to the literal form. Each
//! distinct address gets a context label from the text around its first
//! occurrence.

use crate::state::{ContextLabel, EmailRegistry, Registration};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Characters of surrounding text inspected on each side of an address
const CONTEXT_RADIUS: usize = 200;

/// Keyword groups in priority order; the first group with a hit wins
const CONTEXT_KEYWORDS: &[(ContextLabel, &[&str])] = &[
    (ContextLabel::Contact, &["contact", "reach", "email", "write"]),
    (
        ContextLabel::Booking,
        &["book", "reserv", "stay", "accommodation"],
    ),
    (ContextLabel::Support, &["support", "help", "assist"]),
    (ContextLabel::Information, &["info", "enquir", "inquir"]),
];

/// "Top-level domains" that are really asset extensions (`logo@2x.png`)
const ASSET_SUFFIXES: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "css", "js"];

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();

    static ref OBFUSCATED_EMAIL_REGEX: Regex = Regex::new(
        r"(?i)\b([a-z0-9._%+-]+)\s*(?:\[at\]|\(at\)|\sat\s)\s*([a-z0-9-]+(?:\.[a-z0-9-]+)*)\s*(?:\[dot\]|\(dot\)|\sdot\s)\s*([a-z]{2,})\b"
    ).unwrap();
}

/// A distinct address found in one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailFinding {
    pub email: String,
    pub context: Option<ContextLabel>,
}

/// Counts from scanning one piece of text into the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailScan {
    /// Distinct addresses in the text
    pub found: usize,
    /// Addresses the registry had not seen before
    pub inserted: usize,
    /// Known addresses whose missing context was filled in
    pub context_filled: usize,
}

/// Finds every distinct email address in `text`
///
/// Literal matches come first, in order of first occurrence, followed by
/// obfuscated matches not already found literally.
///
/// # Examples
///
/// ```
/// use site_harvest::extract::extract_emails;
///
/// let found = extract_emails("Write to john at example dot com or jane@example.com");
/// let emails: Vec<_> = found.iter().map(|f| f.email.as_str()).collect();
/// assert_eq!(emails, vec!["jane@example.com", "john@example.com"]);
/// ```
pub fn extract_emails(text: &str) -> Vec<EmailFinding> {
    let mut seen = HashSet::new();
    let mut findings = Vec::new();
    let lower = text.to_ascii_lowercase();

    for m in EMAIL_REGEX.find_iter(text) {
        let email = m.as_str();
        if is_asset_reference(email) || !seen.insert(email.to_string()) {
            continue;
        }
        findings.push(EmailFinding {
            email: email.to_string(),
            context: context_at_first_occurrence(text, &lower, email),
        });
    }

    for caps in OBFUSCATED_EMAIL_REGEX.captures_iter(text) {
        let (Some(local), Some(domain), Some(tld)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };

        let email = format!("{}@{}.{}", local.as_str(), domain.as_str(), tld.as_str())
            .to_lowercase();
        if is_asset_reference(&email) || !seen.insert(email.clone()) {
            continue;
        }
        findings.push(EmailFinding {
            context: context_at_first_occurrence(text, &lower, &email),
            email,
        });
    }

    findings
}

/// Extracts emails from `text` and registers each under `source_url`
pub fn scan_into_registry(text: &str, source_url: &str, registry: &EmailRegistry) -> EmailScan {
    let findings = extract_emails(text);
    let mut scan = EmailScan {
        found: findings.len(),
        ..EmailScan::default()
    };

    for finding in findings {
        match registry.register(&finding.email, source_url, finding.context) {
            Registration::Inserted => scan.inserted += 1,
            Registration::ContextFilled => scan.context_filled += 1,
            Registration::Unchanged => {}
        }
    }

    scan
}

/// Labels `email` from the text around its first case-insensitive
/// occurrence in `text`
///
/// `lower` is `text` with ASCII letters lowercased, so byte offsets agree.
/// A rewritten obfuscated address has no literal occurrence and gets no
/// label.
fn context_at_first_occurrence(text: &str, lower: &str, email: &str) -> Option<ContextLabel> {
    let start = lower.find(&email.to_ascii_lowercase())?;
    classify_context(text, start, start + email.len())
}

/// Labels an address from the lowercased text around `start..end`
pub fn classify_context(text: &str, start: usize, end: usize) -> Option<ContextLabel> {
    let window = context_window(text, start, end, CONTEXT_RADIUS).to_lowercase();

    CONTEXT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| window.contains(keyword)))
        .map(|(label, _)| *label)
}

/// Slices `radius` characters either side of `start..end`, clamped to the text
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);

    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);

    &text[lo..hi]
}

fn is_asset_reference(email: &str) -> bool {
    email
        .rsplit('.')
        .next()
        .map(|suffix| {
            ASSET_SUFFIXES
                .iter()
                .any(|asset| suffix.eq_ignore_ascii_case(asset))
        })
        .unwrap_or(false)
}
