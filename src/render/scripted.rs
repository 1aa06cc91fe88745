//! In-memory render backend
//!
//! Pages are declared up front as a title, body text, and a flat list of
//! nodes. A node matches the selectors it is declared with (exact string
//! comparison, no CSS engine), may start hidden, and may reveal text or
//! other nodes when clicked. Markup is generated from the current visible
//! state, so text hidden behind a collapsed section is absent from both the
//! visible text and the markup until something clicks it open.

use super::{RenderError, RenderResult, RenderSession, SessionFactory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A declared element
#[derive(Debug, Clone)]
pub struct ScriptedNode {
    id: String,
    selectors: Vec<String>,
    attributes: Vec<(String, String)>,
    visible: bool,
    parent: Option<String>,
    reveals_text: Vec<String>,
    reveals_nodes: Vec<String>,
    script_click_fails: bool,
    native_click_fails: bool,
}

impl ScriptedNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            selectors: Vec::new(),
            attributes: Vec::new(),
            visible: true,
            parent: None,
            reveals_text: Vec::new(),
            reveals_nodes: Vec::new(),
            script_click_fails: false,
            native_click_fails: false,
        }
    }

    /// An anchor matching `a[href]`
    pub fn anchor(href: &str) -> Self {
        Self::new(&format!("a:{}", href))
            .matching("a[href]")
            .attr("href", href)
    }

    pub fn matching(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Nests this node under the node with id `parent`
    pub fn inside(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Appends `text` to the body when this node is clicked
    pub fn reveals_text(mut self, text: &str) -> Self {
        self.reveals_text.push(text.to_string());
        self
    }

    /// Makes node `id` visible when this node is clicked
    pub fn reveals(mut self, id: &str) -> Self {
        self.reveals_nodes.push(id.to_string());
        self
    }

    pub fn failing_script_click(mut self) -> Self {
        self.script_click_fails = true;
        self
    }

    pub fn failing_native_click(mut self) -> Self {
        self.native_click_fails = true;
        self
    }

    fn matches(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A declared page
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    url: String,
    title: String,
    text: String,
    nodes: Vec<ScriptedNode>,
    frames: Vec<Option<Vec<ScriptedNode>>>,
    ready: bool,
    reachable: bool,
    crashes: bool,
    load_delay: Duration,
}

impl ScriptedPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            text: String::new(),
            nodes: Vec::new(),
            frames: Vec::new(),
            ready: true,
            reachable: true,
            crashes: false,
            load_delay: Duration::ZERO,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Adds an `a[href]` anchor to the main document
    pub fn link(self, href: &str) -> Self {
        self.node(ScriptedNode::anchor(href))
    }

    pub fn node(mut self, node: ScriptedNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Adds an accessible embedded frame holding `nodes`
    pub fn frame(mut self, nodes: Vec<ScriptedNode>) -> Self {
        self.frames.push(Some(nodes));
        self
    }

    /// Adds an embedded frame that refuses access (cross-origin)
    pub fn inaccessible_frame(mut self) -> Self {
        self.frames.push(None);
        self
    }

    /// The document never exposes `body`
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Navigation to this page fails
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Navigation to this page panics the calling task
    pub fn crashes_on_load(mut self) -> Self {
        self.crashes = true;
        self
    }

    /// Navigation takes `delay` to complete
    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }
}

/// A set of declared pages keyed by URL
#[derive(Debug, Clone, Default)]
pub struct ScriptedSite {
    pages: HashMap<String, ScriptedPage>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: ScriptedPage) -> Self {
        self.pages.insert(page.url.clone(), page);
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    shutdowns: AtomicUsize,
}

/// Opens sessions over a shared [`ScriptedSite`]
#[derive(Debug, Clone)]
pub struct ScriptedFactory {
    site: Arc<ScriptedSite>,
    counters: Arc<Counters>,
    fail_opens_from: Option<usize>,
    fail_close: bool,
}

impl ScriptedFactory {
    pub fn new(site: ScriptedSite) -> Self {
        Self {
            site: Arc::new(site),
            counters: Arc::new(Counters::default()),
            fail_opens_from: None,
            fail_close: false,
        }
    }

    /// Opening the `n`th session (zero-based) and every later one fails
    pub fn failing_opens_from(mut self, n: usize) -> Self {
        self.fail_opens_from = Some(n);
        self
    }

    /// Every session reports an error when closed
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Sessions opened so far, failed attempts excluded
    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Close calls made so far, failing ones included
    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.counters.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    type Session = ScriptedSession;

    async fn open(&self) -> RenderResult<ScriptedSession> {
        if let Some(limit) = self.fail_opens_from {
            if self.opened() >= limit {
                return Err(RenderError::Backend("session limit reached".to_string()));
            }
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(ScriptedSession {
            site: Arc::clone(&self.site),
            counters: Arc::clone(&self.counters),
            fail_close: self.fail_close,
            loaded: Mutex::new(None),
            frame: None,
            clicks: Mutex::new(Vec::new()),
            closed: false,
        })
    }

    async fn shutdown(&self) -> RenderResult<()> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handle to a node: its frame (`None` for the main document) and position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedElement {
    frame: Option<usize>,
    index: usize,
}

#[derive(Debug)]
struct Loaded {
    page: ScriptedPage,
    revealed: Vec<String>,
}

impl Loaded {
    fn nodes(&self, frame: Option<usize>) -> RenderResult<&Vec<ScriptedNode>> {
        match frame {
            None => Ok(&self.page.nodes),
            Some(i) => self
                .page
                .frames
                .get(i)
                .and_then(Option::as_ref)
                .ok_or(RenderError::FrameUnavailable(i)),
        }
    }

    fn nodes_mut(&mut self, frame: Option<usize>) -> RenderResult<&mut Vec<ScriptedNode>> {
        match frame {
            None => Ok(&mut self.page.nodes),
            Some(i) => self
                .page
                .frames
                .get_mut(i)
                .and_then(Option::as_mut)
                .ok_or(RenderError::FrameUnavailable(i)),
        }
    }

    fn node(&self, element: &ScriptedElement) -> RenderResult<&ScriptedNode> {
        self.nodes(element.frame)?
            .get(element.index)
            .ok_or(RenderError::StaleElement)
    }

    fn body_text(&self) -> String {
        let mut text = self.page.text.clone();
        for extra in &self.revealed {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(extra);
        }
        text
    }

    /// Applies the click effects of `element`, once per revealed item
    fn activate(&mut self, element: &ScriptedElement) -> RenderResult<()> {
        let node = self.node(element)?.clone();

        for text in node.reveals_text {
            if !self.revealed.contains(&text) {
                self.revealed.push(text);
            }
        }

        let nodes = self.nodes_mut(element.frame)?;
        for id in &node.reveals_nodes {
            for target in nodes.iter_mut().filter(|n| &n.id == id) {
                target.visible = true;
            }
        }
        Ok(())
    }
}

/// Session over a [`ScriptedSite`]
#[derive(Debug)]
pub struct ScriptedSession {
    site: Arc<ScriptedSite>,
    counters: Arc<Counters>,
    fail_close: bool,
    loaded: Mutex<Option<Loaded>>,
    frame: Option<usize>,
    clicks: Mutex<Vec<String>>,
    closed: bool,
}

impl ScriptedSession {
    /// Ids of the nodes clicked successfully, in order
    pub fn clicked(&self) -> Vec<String> {
        self.clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn guard(&self) -> RenderResult<MutexGuard<'_, Option<Loaded>>> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        Ok(self.loaded.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn with_loaded<R>(&self, f: impl FnOnce(&mut Loaded) -> RenderResult<R>) -> RenderResult<R> {
        let mut guard = self.guard()?;
        match guard.as_mut() {
            Some(loaded) => f(loaded),
            None => Err(RenderError::Backend("no document loaded".to_string())),
        }
    }

    fn select(&self, frame: Option<usize>, selector: &str) -> RenderResult<Vec<ScriptedElement>> {
        self.with_loaded(|loaded| {
            if !loaded.page.ready {
                return Ok(Vec::new());
            }
            Ok(loaded
                .nodes(frame)?
                .iter()
                .enumerate()
                .filter(|(_, node)| node.matches(selector))
                .map(|(index, _)| ScriptedElement { frame, index })
                .collect())
        })
    }

    fn click(&self, element: &ScriptedElement, native: bool) -> RenderResult<()> {
        let id = self.with_loaded(|loaded| {
            let node = loaded.node(element)?;
            if native && (node.native_click_fails || !node.visible) {
                return Err(RenderError::NotInteractable(format!(
                    "{} is obscured",
                    node.id
                )));
            }
            if !native && node.script_click_fails {
                return Err(RenderError::Script(format!("click handler on {} threw", node.id)));
            }
            let id = node.id.clone();
            loaded.activate(element)?;
            Ok(id)
        })?;

        self.clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        Ok(())
    }
}

#[async_trait]
impl RenderSession for ScriptedSession {
    type Element = ScriptedElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.frame = None;

        let page = match self.site.pages.get(url) {
            Some(page) if page.reachable => page.clone(),
            _ => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                })
            }
        };

        if page.crashes {
            panic!("renderer crashed loading {}", url);
        }

        if page.load_delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(RenderError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            });
        }
        tokio::time::sleep(page.load_delay).await;

        *self.loaded.lock().unwrap_or_else(PoisonError::into_inner) = Some(Loaded {
            page,
            revealed: Vec::new(),
        });
        Ok(())
    }

    async fn exists(&self, selector: &str) -> RenderResult<bool> {
        let ready = self.with_loaded(|loaded| Ok(loaded.page.ready))?;
        if selector == "body" {
            return Ok(ready);
        }
        Ok(!self.select(self.frame, selector)?.is_empty())
    }

    async fn query_all(&self, selector: &str) -> RenderResult<Vec<ScriptedElement>> {
        self.select(self.frame, selector)
    }

    async fn query_within(
        &self,
        element: &ScriptedElement,
        selector: &str,
    ) -> RenderResult<Vec<ScriptedElement>> {
        self.with_loaded(|loaded| {
            let parent = loaded.node(element)?.id.clone();
            Ok(loaded
                .nodes(element.frame)?
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    node.parent.as_deref() == Some(&parent) && node.matches(selector)
                })
                .map(|(index, _)| ScriptedElement {
                    frame: element.frame,
                    index,
                })
                .collect())
        })
    }

    async fn frame_count(&self) -> RenderResult<usize> {
        self.with_loaded(|loaded| Ok(loaded.page.frames.len()))
    }

    async fn enter_frame(&mut self, index: usize) -> RenderResult<()> {
        self.with_loaded(|loaded| loaded.nodes(Some(index)).map(|_| ()))?;
        self.frame = Some(index);
        Ok(())
    }

    async fn exit_frame(&mut self) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.frame = None;
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ScriptedElement,
        name: &str,
    ) -> RenderResult<Option<String>> {
        self.with_loaded(|loaded| Ok(loaded.node(element)?.attribute(name).map(str::to_string)))
    }

    async fn is_visible(&self, element: &ScriptedElement) -> RenderResult<bool> {
        self.with_loaded(|loaded| Ok(loaded.node(element)?.visible))
    }

    async fn scroll_into_view(&self, element: &ScriptedElement) -> RenderResult<()> {
        self.with_loaded(|loaded| loaded.node(element).map(|_| ()))
    }

    async fn script_click(&self, element: &ScriptedElement) -> RenderResult<()> {
        self.click(element, false)
    }

    async fn native_click(&self, element: &ScriptedElement) -> RenderResult<()> {
        self.click(element, true)
    }

    async fn title(&self) -> RenderResult<String> {
        self.with_loaded(|loaded| Ok(loaded.page.title.clone()))
    }

    async fn visible_text(&self) -> RenderResult<String> {
        self.with_loaded(|loaded| Ok(loaded.body_text()))
    }

    async fn markup(&self) -> RenderResult<String> {
        self.with_loaded(|loaded| {
            let mut html = format!(
                "<html><head><title>{}</title></head><body><p>{}</p>",
                loaded.page.title,
                loaded.body_text()
            );
            for node in loaded.page.nodes.iter().filter(|n| n.visible) {
                if let Some(href) = node.attribute("href") {
                    html.push_str(&format!("<a href=\"{}\"></a>", href));
                }
            }
            html.push_str("</body></html>");
            Ok(html)
        })
    }

    async fn close(&mut self) -> RenderResult<()> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        self.closed = true;
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(RenderError::Backend("target already detached".to_string()));
        }
        Ok(())
    }
}
