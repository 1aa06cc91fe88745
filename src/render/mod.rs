//! Render capability used by the crawler
//!
//! The crawler never talks to a browser directly. It drives a
//! [`RenderSession`], an isolated page context with its own navigation state,
//! opened by a [`SessionFactory`]. Three backends implement the pair:
//!
//! - `chromium`: headless Chrome over the DevTools protocol
//! - `static_http`: plain HTTP fetch plus HTML parse; no scripts run and
//!   nothing can be clicked
//! - `scripted`: in-memory pages with declared elements and click effects,
//!   used to exercise the crawler deterministically (unit tests and the
//!   `test-support` feature only)
//!
//! A session is used by one task at a time. Element handles are only valid
//! for the session (and frame context) that produced them.

mod chromium;
#[cfg(any(test, feature = "test-support"))]
mod scripted;
mod static_http;

pub use chromium::{ChromiumElement, ChromiumFactory, ChromiumSession};
#[cfg(any(test, feature = "test-support"))]
pub use scripted::{
    ScriptedElement, ScriptedFactory, ScriptedNode, ScriptedPage, ScriptedSession, ScriptedSite,
};
pub use static_http::{StaticElement, StaticFactory, StaticSession};

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised by render sessions
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out waiting for {what} after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("Element is no longer attached to the document")]
    StaleElement,

    #[error("Element cannot be interacted with: {0}")]
    NotInteractable(String),

    #[error("Frame {0} is not accessible")]
    FrameUnavailable(usize),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Render backend error: {0}")]
    Backend(String),

    #[error("Session is closed")]
    Closed,
}

impl RenderError {
    /// Whether the error concerns one element rather than the whole session
    ///
    /// Element-level errors are skipped by the expander and link discovery;
    /// everything else ends the current page.
    pub fn is_element_level(&self) -> bool {
        matches!(
            self,
            Self::StaleElement | Self::NotInteractable(_) | Self::Script(_)
        )
    }
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// One isolated page context
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Opaque handle to an element in the current context
    type Element: Send + Sync;

    /// Loads `url`, failing if the load does not finish within `timeout`
    ///
    /// Navigation always returns the session to the main document context.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()>;

    /// Whether anything in the current context matches `selector`
    async fn exists(&self, selector: &str) -> RenderResult<bool>;

    /// Every element in the current context matching `selector`
    async fn query_all(&self, selector: &str) -> RenderResult<Vec<Self::Element>>;

    /// Descendants of `element` matching `selector`
    async fn query_within(
        &self,
        element: &Self::Element,
        selector: &str,
    ) -> RenderResult<Vec<Self::Element>>;

    /// Number of embedded frames in the main document
    async fn frame_count(&self) -> RenderResult<usize>;

    /// Switches the query context into frame `index`
    async fn enter_frame(&mut self, index: usize) -> RenderResult<()>;

    /// Switches the query context back to the main document
    async fn exit_frame(&mut self) -> RenderResult<()>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> RenderResult<Option<String>>;

    async fn is_visible(&self, element: &Self::Element) -> RenderResult<bool>;

    async fn scroll_into_view(&self, element: &Self::Element) -> RenderResult<()>;

    /// Activates `element` through the page's own scripting
    async fn script_click(&self, element: &Self::Element) -> RenderResult<()>;

    /// Activates `element` with a simulated pointer click
    async fn native_click(&self, element: &Self::Element) -> RenderResult<()>;

    async fn title(&self) -> RenderResult<String>;

    /// Rendered text of the document body
    async fn visible_text(&self) -> RenderResult<String>;

    /// Serialized markup of the current document
    async fn markup(&self) -> RenderResult<String>;

    /// Releases the session; every later call fails with [`RenderError::Closed`]
    async fn close(&mut self) -> RenderResult<()>;

    /// Whether clicks can change the document
    fn interactive(&self) -> bool {
        true
    }
}

/// Opens render sessions that share one underlying engine
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: RenderSession + 'static;

    async fn open(&self) -> RenderResult<Self::Session>;

    /// Releases the engine once every session has been closed
    async fn shutdown(&self) -> RenderResult<()> {
        Ok(())
    }
}

/// Polls until `selector` exists in the current context
///
/// # Arguments
///
/// * `session` - The session to poll
/// * `selector` - CSS selector that signals readiness
/// * `timeout` - Upper bound on the wait
/// * `poll_interval` - Delay between checks
///
/// # Returns
///
/// * `Ok(())` - The selector matched before the deadline
/// * `Err(RenderError::Timeout)` - It never matched
pub async fn wait_for_selector<S: RenderSession + ?Sized>(
    session: &S,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> RenderResult<()> {
    let started = Instant::now();
    loop {
        if session.exists(selector).await? {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(RenderError::Timeout {
                what: format!("'{}'", selector),
                after: timeout,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Quotes `value` as a JavaScript string literal
pub(crate) fn js_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
