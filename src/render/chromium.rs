//! Headless Chrome backend over the DevTools protocol
//!
//! One browser process is launched per run; each session is a separate
//! page (tab) in it. Elements in the main document are live protocol
//! handles. Elements inside an embedded frame are addressed by
//! `(frame, selector, index)` and resolved through script on every call,
//! since same-origin frame documents are reachable from the parent page
//! while cross-origin ones are not.

use super::{js_string, RenderError, RenderResult, RenderSession, SessionFactory};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const VISIBILITY_FN: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.display !== 'none' && style.visibility !== 'hidden' \
        && (rect.width > 0 || rect.height > 0); }";

const SCROLL_FN: &str = "function() { this.scrollIntoView({block: 'center', inline: 'nearest'}); }";

const CLICK_FN: &str = "function() { this.click(); }";

/// Launches Chrome and opens one page per session
pub struct ChromiumFactory {
    browser: Mutex<Option<Browser>>,
    handler: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumFactory {
    /// Starts the browser process and its protocol event loop
    ///
    /// # Arguments
    ///
    /// * `config` - Window size, headless flag and user agent
    ///
    /// # Returns
    ///
    /// * `Ok(ChromiumFactory)` - Browser is running
    /// * `Err(RenderError::Backend)` - No Chrome executable, or launch failed
    pub async fn launch(config: &BrowserConfig) -> RenderResult<Self> {
        let mut builder = ChromeConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(config.navigation_timeout())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder.build().map_err(RenderError::Backend)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| RenderError::Backend(format!("failed to launch Chrome: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("DevTools handler stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!(
            "Launched Chrome ({}x{}, headless: {})",
            config.window_width,
            config.window_height,
            config.headless
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: std::sync::Mutex::new(Some(handler_task)),
        })
    }
}

#[async_trait]
impl SessionFactory for ChromiumFactory {
    type Session = ChromiumSession;

    async fn open(&self) -> RenderResult<ChromiumSession> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(RenderError::Closed)?;
        let page = browser.new_page("about:blank").await.map_err(map_cdp)?;
        Ok(ChromiumSession {
            page: Some(page),
            frame: None,
        })
    }

    async fn shutdown(&self) -> RenderResult<()> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => {
                let closed = browser.close().await.map(|_| ()).map_err(map_cdp);
                if let Err(e) = browser.wait().await {
                    tracing::debug!("Chrome process did not exit cleanly: {}", e);
                }
                closed
            }
            None => Ok(()),
        };

        let handler = self
            .handler
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(task) = handler {
            task.abort();
        }
        result
    }
}

/// A main-document handle or a script-resolved frame element
pub enum ChromiumElement {
    Node(Element),
    Framed {
        frame: usize,
        selector: String,
        index: usize,
    },
}

/// One Chrome page
pub struct ChromiumSession {
    page: Option<Page>,
    frame: Option<usize>,
}

impl ChromiumSession {
    fn page(&self) -> RenderResult<&Page> {
        self.page.as_ref().ok_or(RenderError::Closed)
    }

    /// Evaluates `expression` and deserializes its value
    async fn eval<T: serde::de::DeserializeOwned + Send>(
        &self,
        expression: String,
    ) -> RenderResult<T> {
        self.page()?
            .evaluate(expression)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    /// Runs `body` (a function of `el`) against a frame element
    async fn eval_framed<T: serde::de::DeserializeOwned + Send>(
        &self,
        frame: usize,
        selector: &str,
        index: usize,
        body: &str,
    ) -> RenderResult<T> {
        let expression = format!(
            "(() => {{ const d = {doc}; if (!d) {{ throw new Error('frame unavailable'); }} \
             const el = d.querySelectorAll({sel})[{index}]; \
             if (!el) {{ throw new Error('stale element'); }} \
             return (function(el) {{ {body} }})(el); }})()",
            doc = frame_document(frame),
            sel = js_string(selector),
            index = index,
            body = body,
        );
        self.eval(expression).await
    }

    /// Calls a function declaration with `this` bound to a live element
    async fn call_on(element: &Element, function: &str) -> RenderResult<Option<bool>> {
        let returns = element.call_js_fn(function, false).await.map_err(map_cdp)?;
        Ok(returns.result.value.and_then(|value| value.as_bool()))
    }
}

/// Expression for frame `index`'s document, `null` when inaccessible
fn frame_document(index: usize) -> String {
    format!(
        "(() => {{ const f = document.querySelectorAll('iframe')[{}]; \
         try {{ return f ? f.contentDocument : null; }} catch (e) {{ return null; }} }})()",
        index
    )
}

fn map_cdp(err: CdpError) -> RenderError {
    match err {
        CdpError::Timeout => RenderError::Timeout {
            what: "DevTools response".to_string(),
            after: Duration::ZERO,
        },
        CdpError::NotFound => RenderError::StaleElement,
        CdpError::JavascriptException(details) => RenderError::Script(details.text.clone()),
        other => RenderError::Backend(other.to_string()),
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    type Element = ChromiumElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()> {
        self.frame = None;
        let page = self.page()?;

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(RenderError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            }),
        }
    }

    async fn exists(&self, selector: &str) -> RenderResult<bool> {
        let doc = match self.frame {
            Some(frame) => frame_document(frame),
            None => "document".to_string(),
        };
        self.eval(format!(
            "(() => {{ const d = {}; return !!d && d.querySelector({}) !== null; }})()",
            doc,
            js_string(selector)
        ))
        .await
    }

    async fn query_all(&self, selector: &str) -> RenderResult<Vec<ChromiumElement>> {
        match self.frame {
            None => {
                let elements = self.page()?.find_elements(selector).await.map_err(|e| {
                    tracing::debug!("Query '{}' failed: {}", selector, e);
                    RenderError::InvalidSelector(selector.to_string())
                })?;
                Ok(elements.into_iter().map(ChromiumElement::Node).collect())
            }
            Some(frame) => {
                let count: usize = self
                    .eval(format!(
                        "(() => {{ const d = {}; \
                         if (!d) {{ throw new Error('frame unavailable'); }} \
                         return d.querySelectorAll({}).length; }})()",
                        frame_document(frame),
                        js_string(selector)
                    ))
                    .await?;
                Ok((0..count)
                    .map(|index| ChromiumElement::Framed {
                        frame,
                        selector: selector.to_string(),
                        index,
                    })
                    .collect())
            }
        }
    }

    async fn query_within(
        &self,
        element: &ChromiumElement,
        selector: &str,
    ) -> RenderResult<Vec<ChromiumElement>> {
        match element {
            ChromiumElement::Node(node) => {
                let nested = node.find_elements(selector).await.map_err(map_cdp)?;
                Ok(nested.into_iter().map(ChromiumElement::Node).collect())
            }
            ChromiumElement::Framed { .. } => Err(RenderError::Script(
                "nested queries inside frames are not supported".to_string(),
            )),
        }
    }

    async fn frame_count(&self) -> RenderResult<usize> {
        self.eval("document.querySelectorAll('iframe').length".to_string())
            .await
    }

    async fn enter_frame(&mut self, index: usize) -> RenderResult<()> {
        let accessible: bool = self
            .eval(format!("!!{}", frame_document(index)))
            .await?;
        if !accessible {
            return Err(RenderError::FrameUnavailable(index));
        }
        self.frame = Some(index);
        Ok(())
    }

    async fn exit_frame(&mut self) -> RenderResult<()> {
        self.page()?;
        self.frame = None;
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ChromiumElement,
        name: &str,
    ) -> RenderResult<Option<String>> {
        match element {
            ChromiumElement::Node(node) => node.attribute(name).await.map_err(map_cdp),
            ChromiumElement::Framed {
                frame,
                selector,
                index,
            } => {
                let body = format!("return el.getAttribute({});", js_string(name));
                self.eval_framed(*frame, selector, *index, &body).await
            }
        }
    }

    async fn is_visible(&self, element: &ChromiumElement) -> RenderResult<bool> {
        match element {
            ChromiumElement::Node(node) => Ok(Self::call_on(node, VISIBILITY_FN)
                .await?
                .unwrap_or(false)),
            ChromiumElement::Framed {
                frame,
                selector,
                index,
            } => {
                let body =
                    "const r = el.getBoundingClientRect(); return r.width > 0 || r.height > 0;";
                self.eval_framed(*frame, selector, *index, body).await
            }
        }
    }

    async fn scroll_into_view(&self, element: &ChromiumElement) -> RenderResult<()> {
        match element {
            ChromiumElement::Node(node) => Self::call_on(node, SCROLL_FN).await.map(|_| ()),
            ChromiumElement::Framed {
                frame,
                selector,
                index,
            } => {
                self.eval_framed::<Option<bool>>(
                    *frame,
                    selector,
                    *index,
                    "el.scrollIntoView({block: 'center'}); return null;",
                )
                .await
                .map(|_| ())
            }
        }
    }

    async fn script_click(&self, element: &ChromiumElement) -> RenderResult<()> {
        match element {
            ChromiumElement::Node(node) => Self::call_on(node, CLICK_FN).await.map(|_| ()),
            ChromiumElement::Framed {
                frame,
                selector,
                index,
            } => {
                let body = "el.click(); return null;";
                self.eval_framed::<Option<bool>>(*frame, selector, *index, body)
                    .await
                    .map(|_| ())
            }
        }
    }

    async fn native_click(&self, element: &ChromiumElement) -> RenderResult<()> {
        match element {
            ChromiumElement::Node(node) => node
                .click()
                .await
                .map(|_| ())
                .map_err(|e| RenderError::NotInteractable(e.to_string())),
            ChromiumElement::Framed { .. } => Err(RenderError::NotInteractable(
                "pointer clicks inside frames are not supported".to_string(),
            )),
        }
    }

    async fn title(&self) -> RenderResult<String> {
        Ok(self
            .page()?
            .get_title()
            .await
            .map_err(map_cdp)?
            .unwrap_or_default())
    }

    async fn visible_text(&self) -> RenderResult<String> {
        self.eval("document.body ? document.body.innerText : ''".to_string())
            .await
    }

    async fn markup(&self) -> RenderResult<String> {
        self.page()?.content().await.map_err(map_cdp)
    }

    async fn close(&mut self) -> RenderResult<()> {
        let page = self.page.take().ok_or(RenderError::Closed)?;
        page.close().await.map_err(map_cdp)
    }
}
