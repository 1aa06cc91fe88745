//! Dynamic content expansion
//!
//! Clicks open collapsed widgets (accordions, toggles, "read more" links)
//! so their text is present when the page is read. Coverage is
//! best-effort: the trigger tables are a heuristic allowlist and every
//! single-element failure is recorded and skipped. Clicking an element that
//! is already open is harmless.

use super::selectors::{EXPAND_TRIGGERS, FAQ_BUTTONS, FAQ_CONTAINERS};
use crate::config::TimingConfig;
use crate::render::{RenderError, RenderSession};
use tokio::time::sleep;

/// What happened to one candidate element
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Clicked,
    /// Present in the document but not displayed
    Hidden,
    Failed(RenderError),
}

/// Totals for one expansion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub clicked: usize,
    pub hidden: usize,
    pub failed: usize,
    pub selector_errors: usize,
    /// The session cannot interact, so nothing was attempted
    pub skipped: bool,
    /// The session died part-way
    pub aborted: bool,
}

impl ExpansionReport {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Clicked => self.clicked += 1,
            StepOutcome::Hidden => self.hidden += 1,
            StepOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Adds another page's totals to this one
    pub fn merge(&mut self, other: &ExpansionReport) {
        self.clicked += other.clicked;
        self.hidden += other.hidden;
        self.failed += other.failed;
        self.selector_errors += other.selector_errors;
    }
}

/// Expands collapsed content on the loaded page
///
/// Runs `timing.expansion_passes` passes over the generic trigger table,
/// then one sweep over FAQ containers clicking their nested buttons.
pub async fn expand<S: RenderSession + ?Sized>(
    session: &S,
    timing: &TimingConfig,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();
    if !session.interactive() {
        report.skipped = true;
        return report;
    }

    sleep(timing.expand_settle()).await;

    for pass in 1..=timing.expansion_passes {
        for (selector, role) in EXPAND_TRIGGERS {
            let elements = match session.query_all(selector).await {
                Ok(elements) => elements,
                Err(e) => {
                    if stop_on(&e, &mut report) {
                        return report;
                    }
                    tracing::debug!("Trigger query {} failed: {}", selector, e);
                    report.selector_errors += 1;
                    continue;
                }
            };

            for element in &elements {
                let outcome = activate(session, element, timing).await;
                if let StepOutcome::Failed(e) = &outcome {
                    if stop_on(e, &mut report) {
                        return report;
                    }
                    tracing::debug!("Pass {}: {} trigger failed: {}", pass, role, e);
                }
                report.record(&outcome);
            }
        }
        sleep(timing.pass_settle()).await;
    }

    for selector in FAQ_CONTAINERS {
        let containers = match session.query_all(selector).await {
            Ok(containers) => containers,
            Err(e) => {
                if stop_on(&e, &mut report) {
                    return report;
                }
                tracing::debug!("FAQ container query {} failed: {}", selector, e);
                report.selector_errors += 1;
                continue;
            }
        };

        for container in &containers {
            if let Err(e) = session.scroll_into_view(container).await {
                if stop_on(&e, &mut report) {
                    return report;
                }
                report.record(&StepOutcome::Failed(e));
                continue;
            }
            sleep(timing.scroll_settle()).await;

            let buttons = match session.query_within(container, FAQ_BUTTONS).await {
                Ok(buttons) => buttons,
                Err(e) => {
                    tracing::debug!("FAQ button query in {} failed: {}", selector, e);
                    report.selector_errors += 1;
                    continue;
                }
            };

            for button in &buttons {
                let outcome = activate(session, button, timing).await;
                if let StepOutcome::Failed(e) = &outcome {
                    if stop_on(e, &mut report) {
                        return report;
                    }
                    tracing::debug!("FAQ button in {} failed: {}", selector, e);
                }
                report.record(&outcome);
            }
        }
    }

    tracing::debug!(
        "Expansion: {} clicked, {} hidden, {} failed, {} selector errors",
        report.clicked,
        report.hidden,
        report.failed,
        report.selector_errors
    );
    report
}

/// Scrolls to `element` and clicks it if displayed
///
/// A script click is tried first; if it fails, a pointer click.
pub async fn activate<S: RenderSession + ?Sized>(
    session: &S,
    element: &S::Element,
    timing: &TimingConfig,
) -> StepOutcome {
    if let Err(e) = session.scroll_into_view(element).await {
        return StepOutcome::Failed(e);
    }
    sleep(timing.scroll_settle()).await;

    match session.is_visible(element).await {
        Ok(true) => {}
        Ok(false) => return StepOutcome::Hidden,
        Err(e) => return StepOutcome::Failed(e),
    }

    let clicked = match session.script_click(element).await {
        Ok(()) => Ok(()),
        Err(script_error) => {
            tracing::trace!("Script click failed ({}), trying pointer click", script_error);
            session.native_click(element).await
        }
    };

    match clicked {
        Ok(()) => {
            sleep(timing.click_settle()).await;
            StepOutcome::Clicked
        }
        Err(e) => StepOutcome::Failed(e),
    }
}

fn stop_on(error: &RenderError, report: &mut ExpansionReport) -> bool {
    if matches!(error, RenderError::Closed) {
        tracing::warn!("Session closed during expansion");
        report.aborted = true;
        return true;
    }
    false
}
