//! Link discovery on a rendered page
//!
//! Reads anchors from every accessible embedded frame first, then from the
//! main document through each structural selector in
//! [`LINK_SELECTORS`](super::selectors::LINK_SELECTORS). Overlapping
//! selectors are expected; duplicates collapse on exact string equality and
//! the first sighting fixes the order.
//!
//! Nothing here aborts: an inaccessible frame, an unparseable selector or a
//! detached anchor is counted and skipped.

use super::selectors::{FRAME_LINK_SELECTOR, LINK_SELECTORS};
use crate::render::RenderSession;
use std::collections::HashSet;
use std::time::Duration;

/// Raw hrefs found on one page plus what could not be read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Unique raw href values in first-seen order
    pub hrefs: Vec<String>,

    /// Embedded frames on the page
    pub frames_seen: usize,

    /// Frames that could not be entered
    pub frames_skipped: usize,

    /// Selector queries or attribute reads that failed
    pub failed_reads: usize,
}

#[derive(Default)]
struct LinkSet {
    seen: HashSet<String>,
    hrefs: Vec<String>,
}

impl LinkSet {
    fn insert(&mut self, href: String) -> bool {
        if self.seen.contains(&href) {
            return false;
        }
        self.seen.insert(href.clone());
        self.hrefs.push(href);
        true
    }
}

/// Collects every href reachable from the loaded page
///
/// # Arguments
///
/// * `session` - Session with the page already loaded
/// * `settle` - Delay before querying, for script-injected navigation
///
/// # Returns
///
/// A [`DiscoveryReport`]; the session is back in the main document context
pub async fn discover_links<S: RenderSession + ?Sized>(
    session: &mut S,
    settle: Duration,
) -> DiscoveryReport {
    tokio::time::sleep(settle).await;

    let mut links = LinkSet::default();
    let mut report = DiscoveryReport::default();

    read_frames(session, &mut links, &mut report).await;

    for (selector, region) in LINK_SELECTORS {
        let elements = match session.query_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!("Link query for {} failed: {}", region, e);
                report.failed_reads += 1;
                continue;
            }
        };
        let added = collect_hrefs(session, &elements, &mut links, &mut report).await;
        tracing::debug!(
            "{} region: {} anchors, {} new links",
            region,
            elements.len(),
            added
        );
    }

    report.hrefs = links.hrefs;
    tracing::info!(
        "Discovered {} unique links ({} of {} frames skipped, {} failed reads)",
        report.hrefs.len(),
        report.frames_skipped,
        report.frames_seen,
        report.failed_reads
    );
    report
}

async fn read_frames<S: RenderSession + ?Sized>(
    session: &mut S,
    links: &mut LinkSet,
    report: &mut DiscoveryReport,
) {
    let count = match session.frame_count().await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Could not count embedded frames: {}", e);
            report.failed_reads += 1;
            return;
        }
    };
    report.frames_seen = count;

    for index in 0..count {
        match session.enter_frame(index).await {
            Ok(()) => match session.query_all(FRAME_LINK_SELECTOR).await {
                Ok(elements) => {
                    let added = collect_hrefs(session, &elements, links, report).await;
                    tracing::debug!("Frame {}: {} new links", index, added);
                }
                Err(e) => {
                    tracing::debug!("Link query in frame {} failed: {}", index, e);
                    report.failed_reads += 1;
                }
            },
            Err(e) => {
                tracing::debug!("Skipping frame {}: {}", index, e);
                report.frames_skipped += 1;
            }
        }

        if let Err(e) = session.exit_frame().await {
            tracing::warn!("Could not leave frame {}: {}", index, e);
        }
    }
}

/// Reads `href` from each element into `links`; returns how many were new
async fn collect_hrefs<S: RenderSession + ?Sized>(
    session: &S,
    elements: &[S::Element],
    links: &mut LinkSet,
    report: &mut DiscoveryReport,
) -> usize {
    let mut added = 0;
    for element in elements {
        match session.attribute(element, "href").await {
            Ok(Some(href)) if !href.trim().is_empty() => {
                if links.insert(href) {
                    added += 1;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Could not read href: {}", e);
                report.failed_reads += 1;
            }
        }
    }
    added
}
