//! URL handling module for Site-Harvest
//!
//! This module decides which discovered links belong in the frontier:
//! resolution against the start URL, domain scoping with `www.` folded
//! away, and the skip predicate for non-content links.

mod domain;
mod resolve;
mod skip;

// Re-export main functions
pub use domain::{base_domain, extract_authority, is_in_domain, normalize_domain};
pub use resolve::absolutize;
pub use skip::should_skip;
