//! Frontier construction and session assignment
//!
//! The frontier is built once from the homepage's raw hrefs and never
//! changes afterwards. Each URL is then assigned to a session lane by
//! position (`index mod N`); a lane is driven by exactly one task, so no
//! session is ever used by two tasks at once.

use crate::url::{absolutize, is_in_domain, should_skip};
use std::collections::HashSet;
use url::Url;

/// Builds the ordered, deduplicated frontier
///
/// The start URL always comes first. Every other entry is a discovered href,
/// absolutized against the start URL, that lies in the base domain and is
/// not skipped.
///
/// # Arguments
///
/// * `start_url` - The parsed start URL
/// * `base_domain` - Normalized authority of the start URL
/// * `hrefs` - Raw hrefs from link discovery
///
/// # Returns
///
/// Absolute URL strings, unique by exact string equality
pub fn build_frontier(start_url: &Url, base_domain: &str, hrefs: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut frontier = Vec::new();

    let start = start_url.to_string();
    seen.insert(start.clone());
    frontier.push(start);

    for href in hrefs {
        let Some(absolute) = absolutize(start_url, href) else {
            tracing::debug!("Dropping unresolvable href {}", href);
            continue;
        };

        if !is_in_domain(&absolute, base_domain, start_url) {
            tracing::trace!("Out of domain: {}", absolute);
            continue;
        }
        if should_skip(&absolute) {
            tracing::trace!("Skipped: {}", absolute);
            continue;
        }
        if seen.insert(absolute.clone()) {
            frontier.push(absolute);
        }
    }

    frontier
}

/// Number of extraction sessions to open for a frontier
pub fn pool_size(frontier_len: usize, max_sessions: usize) -> usize {
    frontier_len.min(max_sessions)
}

/// Frontier URLs split into per-session lanes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    lanes: Vec<Vec<String>>,
}

impl DispatchPlan {
    /// Assigns URL `i` to lane `i mod N`, with `N = min(frontier, max_sessions)`
    pub fn round_robin(frontier: Vec<String>, max_sessions: usize) -> Self {
        let size = pool_size(frontier.len(), max_sessions);
        let mut lanes = vec![Vec::new(); size];
        if size > 0 {
            for (index, url) in frontier.into_iter().enumerate() {
                lanes[index % size].push(url);
            }
        }
        Self { lanes }
    }

    pub fn lanes(&self) -> &[Vec<String>] {
        &self.lanes
    }

    pub fn into_lanes(self) -> Vec<Vec<String>> {
        self.lanes
    }

    /// Number of sessions the plan needs
    pub fn session_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn url_count(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }
}
