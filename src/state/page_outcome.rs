/// Page outcome definitions
///
/// Every frontier URL ends in exactly one [`PageOutcome`]: a scraped
/// [`PageResult`] or a failure with its reason. Failures are final; nothing
/// is retried.
use serde::Serialize;
use std::fmt;

/// Cleaned content of one successfully scraped page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Why a page produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The render session could not be opened for this page
    SessionUnavailable,

    /// Navigation itself failed or exceeded its timeout
    Navigation,

    /// The document never exposed `body` within the ready timeout
    NotReady,

    /// Title, text or markup could not be read after loading
    ReadFailed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionUnavailable => "session_unavailable",
            Self::Navigation => "navigation",
            Self::NotReady => "not_ready",
            Self::ReadFailed => "read_failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one Page Extractor invocation
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Scraped(PageResult),
    Failed {
        url: String,
        kind: FailureKind,
        reason: String,
    },
}

impl PageOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Scraped(page) => &page.url,
            Self::Failed { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scraped(_))
    }

    /// Consumes the outcome, keeping only a successful result
    pub fn into_result(self) -> Option<PageResult> {
        match self {
            Self::Scraped(page) => Some(page),
            Self::Failed { .. } => None,
        }
    }
}
