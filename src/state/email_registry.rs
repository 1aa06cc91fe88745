//! Run-scoped registry of discovered email addresses
//!
//! The registry is the only mutable state shared between extraction
//! workers. It exposes two operations, [`EmailRegistry::register`] and
//! [`EmailRegistry::snapshot`], and holds its lock across the whole
//! lookup-then-insert-or-update sequence so two workers that find the same
//! address at once cannot both insert it, and a context back-fill cannot
//! race with another.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Heuristic purpose of an email address, derived from nearby text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextLabel {
    Contact,
    Booking,
    Support,
    Information,
}

impl ContextLabel {
    /// The label as written to reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "Contact Email",
            Self::Booking => "Booking Email",
            Self::Support => "Support Email",
            Self::Information => "Information Email",
        }
    }
}

impl fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One distinct email address and where it was first seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRecord {
    /// The address as matched (obfuscated forms already rewritten)
    pub email: String,

    /// Page on which the address was first registered
    pub url: String,

    /// Context label, back-filled at most once
    pub context: Option<ContextLabel>,
}

/// What a call to [`EmailRegistry::register`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First sighting; a new record was created
    Inserted,
    /// Known address without context; the context was filled in
    ContextFilled,
    /// Known address; nothing changed
    Unchanged,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Address -> position in `records`
    index: HashMap<String, usize>,
    /// Records in first-seen order
    records: Vec<EmailRecord>,
}

/// Deduplicated, run-scoped store of email records
#[derive(Debug, Default)]
pub struct EmailRegistry {
    inner: Mutex<RegistryInner>,
}

impl EmailRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting of `email` on `url`
    ///
    /// The first sighting of an address fixes its `url`. A later sighting
    /// that carries a context fills in the stored context only if none was
    /// stored yet; a stored context is never replaced or cleared.
    pub fn register(&self, email: &str, url: &str, context: Option<ContextLabel>) -> Registration {
        // Mutations never leave a record half-written, so a poisoned lock is safe to reuse.
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = inner.index.get(email).copied();
        if let Some(position) = existing {
            let record = &mut inner.records[position];
            return match (record.context, context) {
                (None, Some(label)) => {
                    record.context = Some(label);
                    tracing::debug!("Back-filled context {} for {}", label, email);
                    Registration::ContextFilled
                }
                _ => Registration::Unchanged,
            };
        }

        let position = inner.records.len();
        inner.records.push(EmailRecord {
            email: email.to_string(),
            url: url.to_string(),
            context,
        });
        inner.index.insert(email.to_string(), position);
        tracing::debug!("Registered new email {} from {}", email, url);
        Registration::Inserted
    }

    /// Returns a copy of every record in first-seen order
    pub fn snapshot(&self) -> Vec<EmailRecord> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    /// Number of distinct addresses registered so far
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
