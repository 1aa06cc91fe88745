//! Page extraction
//!
//! Drives one session through one frontier URL: navigate, wait for the
//! document body, let scripts settle, expand collapsed content, then read
//! the title, visible text and markup. Emails are registered from the
//! visible text and again from the markup, which also carries addresses
//! that only appear in attributes or hidden elements.
//!
//! Every failure ends as [`PageOutcome::Failed`]; nothing propagates.
//! Emails registered before a late failure stay registered.

use super::expander::{expand, ExpansionReport};
use crate::config::TimingConfig;
use crate::extract::{clean_text, scan_into_registry};
use crate::render::{wait_for_selector, RenderError, RenderSession};
use crate::state::{EmailRegistry, FailureKind, PageOutcome, PageResult};
use std::sync::Arc;
use std::time::Duration;

/// Everything an extraction needs besides the session
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub registry: Arc<EmailRegistry>,
    pub timing: TimingConfig,
    pub navigation_timeout: Duration,
}

/// Outcome of one page plus its expansion and email totals
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub outcome: PageOutcome,
    pub expansion: ExpansionReport,
    /// Addresses this page added to the registry
    pub new_emails: usize,
}

/// Extracts one page with `session`
///
/// # Arguments
///
/// * `session` - Session owned by the calling task
/// * `url` - Frontier URL to extract
/// * `ctx` - Registry, timing and navigation bound
///
/// # Returns
///
/// An [`ExtractedPage`]; its outcome is `Scraped` only when every read
/// succeeded
pub async fn extract_page<S: RenderSession + ?Sized>(
    session: &mut S,
    url: &str,
    ctx: &ExtractionContext,
) -> ExtractedPage {
    let mut page = ExtractedPage {
        outcome: PageOutcome::Failed {
            url: url.to_string(),
            kind: FailureKind::Navigation,
            reason: String::new(),
        },
        expansion: ExpansionReport::default(),
        new_emails: 0,
    };

    if let Err(e) = session.navigate(url, ctx.navigation_timeout).await {
        tracing::warn!("Navigation to {} failed: {}", url, e);
        page.outcome = failed(url, FailureKind::Navigation, &e);
        return page;
    }

    let timing = &ctx.timing;
    if let Err(e) =
        wait_for_selector(session, "body", timing.ready_timeout(), timing.poll_interval()).await
    {
        tracing::warn!("{} never became ready: {}", url, e);
        page.outcome = failed(url, FailureKind::NotReady, &e);
        return page;
    }
    tokio::time::sleep(timing.render_settle()).await;

    page.expansion = expand(session, timing).await;

    match read_page(session, url, &ctx.registry, &mut page.new_emails).await {
        Ok(result) => {
            tracing::info!(
                "Scraped {} ({} chars, {} new emails)",
                url,
                result.content.len(),
                page.new_emails
            );
            page.outcome = PageOutcome::Scraped(result);
        }
        Err(e) => {
            tracing::warn!("Reading {} failed: {}", url, e);
            page.outcome = failed(url, FailureKind::ReadFailed, &e);
        }
    }
    page
}

async fn read_page<S: RenderSession + ?Sized>(
    session: &S,
    url: &str,
    registry: &EmailRegistry,
    new_emails: &mut usize,
) -> Result<PageResult, RenderError> {
    let title = session.title().await?;
    let text = session.visible_text().await?;
    *new_emails += scan_into_registry(&text, url, registry).inserted;

    let markup = session.markup().await?;
    *new_emails += scan_into_registry(&markup, url, registry).inserted;

    Ok(PageResult {
        url: url.to_string(),
        title: clean_text(&title),
        content: clean_text(&text),
    })
}

fn failed(url: &str, kind: FailureKind, error: &RenderError) -> PageOutcome {
    PageOutcome::Failed {
        url: url.to_string(),
        kind,
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{
        ScriptedFactory, ScriptedNode, ScriptedPage, ScriptedSession, ScriptedSite,
        SessionFactory,
    };
    use crate::state::ContextLabel;

    fn context() -> ExtractionContext {
        ExtractionContext {
            registry: Arc::new(EmailRegistry::new()),
            timing: TimingConfig::immediate(),
            navigation_timeout: Duration::from_secs(1),
        }
    }

    async fn session_for(site: ScriptedSite) -> ScriptedSession {
        ScriptedFactory::new(site).open().await.unwrap()
    }

    #[tokio::test]
    async fn test_scrapes_title_text_and_emails() {
        let site = ScriptedSite::new().page(
            ScriptedPage::new("https://site.test/contact")
                .title("  Contact \n Us ")
                .text("Contact us\n\nfront@site.test")
                .node(ScriptedNode::anchor("mailto:owner@site.test")),
        );
        let mut session = session_for(site).await;
        let ctx = context();

        let page = extract_page(&mut session, "https://site.test/contact", &ctx).await;
        let result = page.outcome.into_result().unwrap();
        assert_eq!(result.title, "Contact Us");
        assert_eq!(result.content, "Contact us front@site.test");

        // The mailto only exists in markup
        let emails: Vec<_> = ctx
            .registry
            .snapshot()
            .into_iter()
            .map(|r| (r.email, r.context))
            .collect();
        assert_eq!(
            emails,
            vec![
                ("front@site.test".to_string(), Some(ContextLabel::Contact)),
                ("owner@site.test".to_string(), Some(ContextLabel::Contact)),
            ]
        );
        assert_eq!(page.new_emails, 2);
    }

    #[tokio::test]
    async fn test_navigation_failure() {
        let mut session = session_for(ScriptedSite::new()).await;
        let page = extract_page(&mut session, "https://site.test/missing", &context()).await;
        assert!(matches!(
            page.outcome,
            PageOutcome::Failed {
                kind: FailureKind::Navigation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_not_ready_page_is_dropped() {
        let site = ScriptedSite::new().page(
            ScriptedPage::new("https://site.test/spa")
                .text("info@site.test")
                .not_ready(),
        );
        let mut session = session_for(site).await;
        let ctx = context();

        let page = extract_page(&mut session, "https://site.test/spa", &ctx).await;
        assert!(matches!(
            page.outcome,
            PageOutcome::Failed {
                kind: FailureKind::NotReady,
                ..
            }
        ));
        assert!(ctx.registry.is_empty());
    }

    #[tokio::test]
    async fn test_expansion_runs_before_reading() {
        let site = ScriptedSite::new().page(
            ScriptedPage::new("https://site.test/faq")
                .text("FAQ")
                .node(ScriptedNode::new("faq").matching(".faq"))
                .node(
                    ScriptedNode::new("q")
                        .matching(crate::crawler::selectors::FAQ_BUTTONS)
                        .inside("faq")
                        .reveals_text("Need help? help@site.test"),
                ),
        );
        let mut session = session_for(site).await;
        let ctx = context();

        let page = extract_page(&mut session, "https://site.test/faq", &ctx).await;
        assert!(page.outcome.is_success());
        assert_eq!(page.expansion.clicked, 1);
        let records = ctx.registry.snapshot();
        assert_eq!(records[0].email, "help@site.test");
        assert_eq!(records[0].context, Some(ContextLabel::Support));
    }
}
