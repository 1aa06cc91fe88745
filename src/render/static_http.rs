//! Static render backend
//!
//! Fetches documents over plain HTTP and answers queries by parsing the
//! markup with `scraper`. Nothing is executed, so script-injected content is
//! invisible and clicks are refused; the crawler skips expansion for these
//! sessions. Embedded frames are fetched from their `src` attribute when
//! entered.
//!
//! `scraper::Html` is not `Send`, so every query reparses the stored markup
//! inside a synchronous helper and hands back owned snapshots.

use super::{RenderError, RenderResult, RenderSession, SessionFactory};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

/// Builds sessions sharing one HTTP client
#[derive(Debug, Clone)]
pub struct StaticFactory {
    client: Client,
    navigation_timeout: Duration,
}

impl StaticFactory {
    /// Builds the shared client from the browser configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the user agent and request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(StaticFactory)` - Client built
    /// * `Err(RenderError::Backend)` - The TLS backend could not initialize
    pub fn new(config: &BrowserConfig) -> RenderResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.navigation_timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RenderError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            navigation_timeout: config.navigation_timeout(),
        })
    }
}

#[async_trait]
impl SessionFactory for StaticFactory {
    type Session = StaticSession;

    async fn open(&self) -> RenderResult<StaticSession> {
        Ok(StaticSession {
            client: self.client.clone(),
            navigation_timeout: self.navigation_timeout,
            main: None,
            frame: None,
            closed: false,
        })
    }
}

/// Snapshot of a parsed element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticElement {
    outer_html: String,
    attributes: Vec<(String, String)>,
    hidden: bool,
}

#[derive(Debug, Clone)]
struct FetchedDocument {
    url: Url,
    html: String,
}

/// One fetched document plus an optionally entered frame
#[derive(Debug)]
pub struct StaticSession {
    client: Client,
    navigation_timeout: Duration,
    main: Option<FetchedDocument>,
    frame: Option<FetchedDocument>,
    closed: bool,
}

impl StaticSession {
    fn main(&self) -> RenderResult<&FetchedDocument> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.main
            .as_ref()
            .ok_or_else(|| RenderError::Backend("no document loaded".to_string()))
    }

    fn current(&self) -> RenderResult<&FetchedDocument> {
        let main = self.main()?;
        Ok(self.frame.as_ref().unwrap_or(main))
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> RenderResult<FetchedDocument> {
        let navigation_error = |reason: String| RenderError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = tokio::time::timeout(timeout, self.client.get(url).send())
            .await
            .map_err(|_| RenderError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            })?
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        Ok(FetchedDocument {
            url: final_url,
            html,
        })
    }
}

#[async_trait]
impl RenderSession for StaticSession {
    type Element = StaticElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.frame = None;
        let document = self.fetch(url, timeout).await?;
        tracing::debug!("Fetched {} ({} bytes)", document.url, document.html.len());
        self.main = Some(document);
        Ok(())
    }

    async fn exists(&self, selector: &str) -> RenderResult<bool> {
        Ok(!select_elements(&self.current()?.html, selector)?.is_empty())
    }

    async fn query_all(&self, selector: &str) -> RenderResult<Vec<StaticElement>> {
        select_elements(&self.current()?.html, selector)
    }

    async fn query_within(
        &self,
        element: &StaticElement,
        selector: &str,
    ) -> RenderResult<Vec<StaticElement>> {
        self.current()?;
        select_within(&element.outer_html, selector)
    }

    async fn frame_count(&self) -> RenderResult<usize> {
        Ok(frame_sources(&self.main()?.html).len())
    }

    async fn enter_frame(&mut self, index: usize) -> RenderResult<()> {
        let main = self.main()?;
        let src = frame_sources(&main.html)
            .into_iter()
            .nth(index)
            .flatten()
            .and_then(|src| main.url.join(&src).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or(RenderError::FrameUnavailable(index))?;

        let document = self
            .fetch(src.as_str(), self.navigation_timeout)
            .await.map_err(|e| {
            tracing::debug!("Frame {} at {} unavailable: {}", index, src, e);
            RenderError::FrameUnavailable(index)
        })?;
        self.frame = Some(document);
        Ok(())
    }

    async fn exit_frame(&mut self) -> RenderResult<()> {
        self.frame = None;
        Ok(())
    }

    async fn attribute(
        &self,
        element: &StaticElement,
        name: &str,
    ) -> RenderResult<Option<String>> {
        Ok(element
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone()))
    }

    async fn is_visible(&self, element: &StaticElement) -> RenderResult<bool> {
        Ok(!element.hidden)
    }

    async fn scroll_into_view(&self, _element: &StaticElement) -> RenderResult<()> {
        Ok(())
    }

    async fn script_click(&self, _element: &StaticElement) -> RenderResult<()> {
        Err(RenderError::NotInteractable(
            "static documents run no scripts".to_string(),
        ))
    }

    async fn native_click(&self, _element: &StaticElement) -> RenderResult<()> {
        Err(RenderError::NotInteractable(
            "static documents cannot be clicked".to_string(),
        ))
    }

    async fn title(&self) -> RenderResult<String> {
        Ok(document_title(&self.main()?.html).unwrap_or_default())
    }

    async fn visible_text(&self) -> RenderResult<String> {
        Ok(body_text(&self.main()?.html))
    }

    async fn markup(&self) -> RenderResult<String> {
        Ok(self.main()?.html.clone())
    }

    async fn close(&mut self) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.closed = true;
        self.main = None;
        self.frame = None;
        Ok(())
    }

    fn interactive(&self) -> bool {
        false
    }
}

fn parse_selector(selector: &str) -> RenderResult<Selector> {
    Selector::parse(selector).map_err(|_| RenderError::InvalidSelector(selector.to_string()))
}

fn snapshot(element: ElementRef<'_>) -> StaticElement {
    StaticElement {
        outer_html: element.html(),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        hidden: is_hidden(element),
    }
}

/// Hidden by markup alone: `hidden`, inline `display:none` or
/// `visibility:hidden`, or a hidden input
fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    if value.name() == "input" && value.attr("type") == Some("hidden") {
        return true;
    }
    value
        .attr("style")
        .map(|style| {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn select_elements(html: &str, selector: &str) -> RenderResult<Vec<StaticElement>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).map(snapshot).collect())
}

fn select_within(outer_html: &str, selector: &str) -> RenderResult<Vec<StaticElement>> {
    let selector = parse_selector(selector)?;
    let fragment = Html::parse_fragment(outer_html);

    let Some(container) = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
    else {
        return Ok(Vec::new());
    };

    Ok(container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|element| selector.matches(element))
        .map(snapshot)
        .collect())
}

/// `src` of every `iframe`, in document order
fn frame_sources(html: &str) -> Vec<Option<String>> {
    let Ok(selector) = Selector::parse("iframe") else {
        return Vec::new();
    };
    Html::parse_document(html)
        .select(&selector)
        .map(|frame| frame.value().attr("src").map(str::to_string))
        .collect()
}

fn document_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    Html::parse_document(html)
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Text nodes under `body`, skipping script, style and template content
fn body_text(html: &str) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let document = Html::parse_document(html);
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut text = String::new();
    for node in body.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let in_script = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().map_or(false, |element| {
                matches!(element.name(), "script" | "style" | "noscript" | "template")
            })
        });
        if in_script {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(fragment);
    }
    text
}
