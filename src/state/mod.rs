//! State module for tracking harvest results
//!
//! # Components
//!
//! - `EmailRegistry`: the deduplicated, run-scoped store of email records,
//!   shared by every extraction worker
//! - `PageOutcome`: the result of scraping one frontier URL

mod email_registry;
mod page_outcome;

// Re-export main types
pub use email_registry::{ContextLabel, EmailRecord, EmailRegistry, Registration};
pub use page_outcome::{FailureKind, PageOutcome, PageResult};
