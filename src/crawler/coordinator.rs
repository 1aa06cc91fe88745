//! Crawl coordinator - run orchestration
//!
//! A run moves through fixed stages:
//! - Init: open the homepage session and load the start URL (the only
//!   failure that aborts a run)
//! - Discover: collect hrefs from the homepage
//! - Filter: build the frontier
//! - Dispatch: open one session per lane and spawn one task per session
//! - Collect: receive page outcomes as they complete
//! - Teardown: close every session, then the engine
//!
//! The email registry is created per run and shared with every task.

use super::discovery::{discover_links, DiscoveryReport};
use super::expander::ExpansionReport;
use super::fetcher::{extract_page, ExtractedPage, ExtractionContext};
use super::scheduler::{build_frontier, DispatchPlan};
use crate::config::Config;
use crate::render::{RenderSession, SessionFactory};
use crate::state::{EmailRecord, EmailRegistry, FailureKind, PageOutcome, PageResult};
use crate::url::base_domain;
use crate::{HarvestError, Result};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// A frontier URL that produced no page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub url: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Contained failures and counters for one run
#[derive(Debug, Clone, Default)]
pub struct CrawlDiagnostics {
    /// Homepage link discovery, hrefs omitted
    pub discovery: DiscoveryReport,
    pub frontier_size: usize,
    /// Extraction sessions opened (homepage session excluded)
    pub sessions_opened: usize,
    pub sessions_unavailable: usize,
    pub failed_pages: Vec<FailedPage>,
    /// Expansion totals across every page
    pub expansion: ExpansionReport,
    /// Addresses added to this run's registry
    pub emails_registered: usize,
    /// Lanes whose task ended abnormally; their sessions were never closed
    pub sessions_lost: usize,
    /// Session or engine close calls that failed, lost sessions included
    pub teardown_failures: usize,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_url: String,
    pub base_domain: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Successful pages in completion order
    pub pages: Vec<PageResult>,
    /// Registry snapshot in first-seen order
    pub emails: Vec<EmailRecord>,
    pub diagnostics: CrawlDiagnostics,
}

impl CrawlReport {
    /// Number of registered emails first seen on `url`
    pub fn emails_on(&self, url: &str) -> usize {
        self.emails.iter().filter(|record| record.url == url).count()
    }
}

/// Main crawl coordinator
pub struct Coordinator<F: SessionFactory> {
    config: Arc<Config>,
    factory: F,
}

/// A lane's session handed back once its URLs are done
struct LaneDone<S> {
    session: S,
    processed: usize,
}

impl<F: SessionFactory> Coordinator<F> {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    /// * `factory` - Opens the render sessions for this run
    pub fn new(config: Config, factory: F) -> Self {
        Self {
            config: Arc::new(config),
            factory,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Runs the crawl to completion
    ///
    /// Every call starts from an empty email registry.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run finished; individual pages may have failed
    /// * `Err(HarvestError::HomepageUnavailable)` - The start URL could not be loaded
    pub async fn run(&self) -> Result<CrawlReport> {
        let started_at = Local::now();
        let start_url = Url::parse(&self.config.site.start_url)?;
        let base = base_domain(&self.config.site.start_url)?;
        let timing = &self.config.timing;
        let registry = Arc::new(EmailRegistry::new());
        let mut diagnostics = CrawlDiagnostics::default();

        tracing::info!("Starting harvest of {} (domain {})", start_url, base);

        // Init
        let mut home = match self.factory.open().await {
            Ok(session) => session,
            Err(source) => {
                tracing::error!("Could not open the homepage session: {}", source);
                self.teardown(Vec::new(), &mut diagnostics).await;
                return Err(HarvestError::HomepageUnavailable {
                    url: start_url.to_string(),
                    source,
                });
            }
        };
        if let Err(source) = home
            .navigate(start_url.as_str(), self.config.browser.navigation_timeout())
            .await
        {
            tracing::error!("Homepage {} failed to load: {}", start_url, source);
            self.teardown(vec![home], &mut diagnostics).await;
            return Err(HarvestError::HomepageUnavailable {
                url: start_url.to_string(),
                source,
            });
        }
        tokio::time::sleep(timing.homepage_settle()).await;

        // Discover
        let mut discovery = discover_links(&mut home, timing.link_settle()).await;

        // Filter
        let frontier = build_frontier(&start_url, &base, &discovery.hrefs);
        discovery.hrefs.clear();
        diagnostics.discovery = discovery;
        diagnostics.frontier_size = frontier.len();
        tracing::info!("Found {} pages to scrape", frontier.len());

        // Dispatch
        let total = frontier.len();
        let plan = DispatchPlan::round_robin(frontier, self.config.browser.max_sessions);
        tracing::info!(
            "Dispatching {} pages across {} sessions",
            plan.url_count(),
            plan.session_count()
        );

        let ctx = ExtractionContext {
            registry: Arc::clone(&registry),
            timing: timing.clone(),
            navigation_timeout: self.config.browser.navigation_timeout(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel::<ExtractedPage>();
        let mut tasks = JoinSet::new();

        for (lane_index, lane) in plan.into_lanes().into_iter().enumerate() {
            match self.factory.open().await {
                Ok(session) => {
                    diagnostics.sessions_opened += 1;
                    let ctx = ctx.clone();
                    let tx = tx.clone();
                    tasks.spawn(run_lane(session, lane, ctx, tx));
                }
                Err(e) => {
                    tracing::warn!(
                        "Session {} could not be opened, {} pages dropped: {}",
                        lane_index,
                        lane.len(),
                        e
                    );
                    diagnostics.sessions_unavailable += 1;
                    for url in lane {
                        diagnostics.failed_pages.push(FailedPage {
                            url,
                            kind: FailureKind::SessionUnavailable,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        drop(tx);

        // Collect
        let mut pages = Vec::new();
        let mut completed = 0;
        while let Some(extracted) = rx.recv().await {
            completed += 1;
            diagnostics.expansion.merge(&extracted.expansion);
            diagnostics.emails_registered += extracted.new_emails;
            match extracted.outcome {
                PageOutcome::Scraped(page) => {
                    tracing::debug!("Collected {} ({}/{})", page.url, completed, total);
                    pages.push(page);
                }
                PageOutcome::Failed { url, kind, reason } => {
                    diagnostics.failed_pages.push(FailedPage { url, kind, reason });
                }
            }
        }

        let mut sessions = vec![home];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => {
                    tracing::debug!("Lane finished after {} pages", done.processed);
                    sessions.push(done.session);
                }
                Err(e) => {
                    tracing::error!("Extraction task ended abnormally, session lost: {}", e);
                    diagnostics.sessions_lost += 1;
                    diagnostics.teardown_failures += 1;
                }
            }
        }

        // Teardown
        self.teardown(sessions, &mut diagnostics).await;

        let emails = registry.snapshot();
        tracing::info!(
            "Harvest complete: {} of {} pages scraped, {} emails",
            pages.len(),
            total,
            emails.len()
        );

        Ok(CrawlReport {
            start_url: start_url.to_string(),
            base_domain: base,
            started_at,
            finished_at: Local::now(),
            pages,
            emails,
            diagnostics,
        })
    }

    /// Closes every session and the engine; failures are logged and counted
    async fn teardown(&self, sessions: Vec<F::Session>, diagnostics: &mut CrawlDiagnostics) {
        for mut session in sessions {
            if let Err(e) = session.close().await {
                tracing::warn!("Failed to close session: {}", e);
                diagnostics.teardown_failures += 1;
            }
        }
        if let Err(e) = self.factory.shutdown().await {
            tracing::warn!("Failed to shut down render engine: {}", e);
            diagnostics.teardown_failures += 1;
        }
    }
}

/// Extracts a lane's URLs in order with one session
async fn run_lane<S: RenderSession + 'static>(
    mut session: S,
    urls: Vec<String>,
    ctx: ExtractionContext,
    tx: mpsc::UnboundedSender<ExtractedPage>,
) -> LaneDone<S> {
    let mut processed = 0;
    for url in urls {
        let extracted = extract_page(&mut session, &url, &ctx).await;
        processed += 1;
        if tx.send(extracted).is_err() {
            tracing::warn!("Collector gone, abandoning lane");
            break;
        }
    }
    LaneDone { session, processed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserConfig, OutputConfig, SiteConfig, TimingConfig};
    use crate::render::{ScriptedFactory, ScriptedPage, ScriptedSite};

    fn config(start_url: &str, max_sessions: usize) -> Config {
        Config {
            site: SiteConfig {
                start_url: start_url.to_string(),
            },
            browser: BrowserConfig {
                max_sessions,
                ..BrowserConfig::default()
            },
            timing: TimingConfig::immediate(),
            output: OutputConfig {
                xml_path: "out.xml".to_string(),
                csv_path: "out.csv".to_string(),
            },
        }
    }

    fn site() -> ScriptedSite {
        ScriptedSite::new()
            .page(
                ScriptedPage::new("https://site.test/")
                    .title("Home")
                    .text("Welcome. Reservations: book@site.test")
                    .link("/rooms")
                    .link("/contact")
                    .link("/blog/news")
                    .link("https://elsewhere.test/"),
            )
            .page(
                ScriptedPage::new("https://site.test/rooms")
                    .title("Rooms")
                    .text("Ocean view"),
            )
            .page(
                ScriptedPage::new("https://site.test/contact")
                    .title("Contact")
                    .text("Contact us: book@site.test or hello@site.test"),
            )
    }

    #[tokio::test]
    async fn test_run_scrapes_frontier() {
        let coordinator =
            Coordinator::new(config("https://site.test/", 4), ScriptedFactory::new(site()));
        let report = coordinator.run().await.unwrap();

        let mut urls: Vec<_> = report.pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                "https://site.test/",
                "https://site.test/contact",
                "https://site.test/rooms"
            ]
        );
        assert_eq!(report.base_domain, "site.test");
        assert_eq!(report.diagnostics.frontier_size, 3);
        assert_eq!(report.diagnostics.sessions_opened, 3);
        assert!(report.diagnostics.failed_pages.is_empty());

        let emails: Vec<_> = report.emails.iter().map(|e| e.email.as_str()).collect();
        assert!(emails.contains(&"book@site.test"));
        assert!(emails.contains(&"hello@site.test"));
        assert_eq!(report.emails.len(), 2);
    }

    #[tokio::test]
    async fn test_pool_capped_by_max_sessions() {
        let factory = ScriptedFactory::new(site());
        let coordinator = Coordinator::new(config("https://site.test/", 2), factory);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.diagnostics.sessions_opened, 2);
        assert_eq!(report.pages.len(), 3);
        // Homepage session plus two extraction sessions
        assert_eq!(coordinator.factory().opened(), 3);
        assert_eq!(coordinator.factory().closed(), 3);
        assert_eq!(coordinator.factory().shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_homepage_failure_aborts_run() {
        let site =
            ScriptedSite::new().page(ScriptedPage::new("https://site.test/").unreachable());
        let coordinator =
            Coordinator::new(config("https://site.test/", 4), ScriptedFactory::new(site));

        let err = coordinator.run().await.unwrap_err();
        assert!(matches!(err, HarvestError::HomepageUnavailable { .. }));
        // The homepage session is still released
        assert_eq!(coordinator.factory().opened(), 1);
        assert_eq!(coordinator.factory().closed(), 1);
    }

    #[tokio::test]
    async fn test_failed_session_open_drops_only_its_lane() {
        // Homepage session and one extraction session succeed
        let factory = ScriptedFactory::new(site()).failing_opens_from(2);
        let coordinator = Coordinator::new(config("https://site.test/", 4), factory);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.diagnostics.sessions_opened, 1);
        assert_eq!(report.diagnostics.sessions_unavailable, 2);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].url, "https://site.test/");
        assert_eq!(report.diagnostics.failed_pages.len(), 2);
        assert!(report
            .diagnostics
            .failed_pages
            .iter()
            .all(|f| f.kind == FailureKind::SessionUnavailable));
    }

    #[tokio::test]
    async fn test_teardown_failures_are_swallowed() {
        let factory = ScriptedFactory::new(site()).failing_close();
        let coordinator = Coordinator::new(config("https://site.test/", 4), factory);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.diagnostics.teardown_failures, 4);
        assert_eq!(coordinator.factory().closed(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_page_fails_alone() {
        let site = site().page(ScriptedPage::new("https://site.test/rooms").unreachable());
        let coordinator =
            Coordinator::new(config("https://site.test/", 4), ScriptedFactory::new(site));
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.diagnostics.failed_pages.len(), 1);
        assert_eq!(
            report.diagnostics.failed_pages[0].url,
            "https://site.test/rooms"
        );
        assert_eq!(
            report.diagnostics.failed_pages[0].kind,
            FailureKind::Navigation
        );
    }

    #[tokio::test]
    async fn test_each_run_starts_with_empty_registry() {
        let coordinator =
            Coordinator::new(config("https://site.test/", 4), ScriptedFactory::new(site()));

        let first = coordinator.run().await.unwrap();
        let second = coordinator.run().await.unwrap();

        assert_eq!(first.diagnostics.emails_registered, 2);
        assert_eq!(second.diagnostics.emails_registered, 2);
        let addresses = |report: &CrawlReport| {
            let mut found: Vec<_> = report.emails.iter().map(|e| e.email.clone()).collect();
            found.sort();
            found
        };
        assert_eq!(addresses(&second), addresses(&first));
    }

    #[tokio::test]
    async fn test_crashed_lane_counts_its_session_as_lost() {
        let site = site().page(ScriptedPage::new("https://site.test/rooms").crashes_on_load());
        let factory = ScriptedFactory::new(site);
        let coordinator = Coordinator::new(config("https://site.test/", 4), factory);
        let report = coordinator.run().await.unwrap();

        assert_eq!(report.pages.len(), 2);
        assert!(report.pages.iter().all(|p| p.url != "https://site.test/rooms"));
        assert_eq!(report.diagnostics.sessions_lost, 1);
        assert_eq!(report.diagnostics.teardown_failures, 1);
        // Homepage session plus three lanes, one of which never comes back
        assert_eq!(coordinator.factory().opened(), 4);
        assert_eq!(coordinator.factory().closed(), 3);
        assert_eq!(coordinator.factory().shutdowns(), 1);
    }
}
