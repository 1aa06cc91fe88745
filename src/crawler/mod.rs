//! Crawler module: discovery, expansion, extraction and coordination
//!
//! This module contains the crawl pipeline:
//! - Link discovery on the homepage
//! - Frontier construction and round-robin session assignment
//! - Dynamic content expansion
//! - Per-page extraction
//! - Overall run coordination

mod coordinator;
mod discovery;
mod expander;
mod fetcher;
mod scheduler;
pub mod selectors;

pub use coordinator::{Coordinator, CrawlDiagnostics, CrawlReport, FailedPage};
pub use discovery::{discover_links, DiscoveryReport};
pub use expander::{activate, expand, ExpansionReport, StepOutcome};
pub use fetcher::{extract_page, ExtractedPage, ExtractionContext};
pub use scheduler::{build_frontier, pool_size, DispatchPlan};

use crate::config::{BackendKind, Config};
use crate::render::{ChromiumFactory, StaticFactory};
use crate::Result;

/// Runs a complete harvest with the configured render backend
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Harvest finished
/// * `Err(HarvestError)` - The backend could not start or the homepage failed
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    match config.browser.backend {
        BackendKind::Chromium => {
            let factory = ChromiumFactory::launch(&config.browser).await?;
            Coordinator::new(config, factory).run().await
        }
        BackendKind::Static => {
            let factory = StaticFactory::new(&config.browser)?;
            Coordinator::new(config, factory).run().await
        }
    }
}
