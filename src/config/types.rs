use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

/// The site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Homepage the crawl starts from; its domain scopes the frontier
    #[serde(rename = "start-url")]
    pub start_url: String,
}

/// Which render backend drives the sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Headless Chrome through the DevTools protocol
    #[default]
    Chromium,
    /// Plain HTTP fetch and HTML parse, no script execution
    Static,
}

/// Render session pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Upper bound on concurrently open extraction sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Bound on a single navigation (seconds)
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            max_sessions: default_max_sessions(),
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            navigation_timeout_secs: default_navigation_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

/// Settle delays and wait bounds, all in milliseconds
///
/// Rendered pages give no reliable signal that deferred scripts or CSS
/// transitions have finished, so these fixed delays stand in for one. Tests
/// shrink them to a few milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimingConfig {
    /// After loading the homepage, before link discovery starts
    #[serde(default = "default_homepage_settle")]
    pub homepage_settle: u64,

    /// Before anchors are queried, for script-injected links
    #[serde(default = "default_link_settle")]
    pub link_settle: u64,

    /// After `body` appears, for initial script execution
    #[serde(default = "default_render_settle")]
    pub render_settle: u64,

    /// How long a page may take to expose `body`
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: u64,

    /// Before the first expansion pass
    #[serde(default = "default_expand_settle")]
    pub expand_settle: u64,

    #[serde(default = "default_scroll_settle")]
    pub scroll_settle: u64,

    #[serde(default = "default_click_settle")]
    pub click_settle: u64,

    /// Between expansion passes
    #[serde(default = "default_pass_settle")]
    pub pass_settle: u64,

    /// Interval between readiness checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_expansion_passes")]
    pub expansion_passes: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            homepage_settle: default_homepage_settle(),
            link_settle: default_link_settle(),
            render_settle: default_render_settle(),
            ready_timeout: default_ready_timeout(),
            expand_settle: default_expand_settle(),
            scroll_settle: default_scroll_settle(),
            click_settle: default_click_settle(),
            pass_settle: default_pass_settle(),
            poll_interval: default_poll_interval(),
            expansion_passes: default_expansion_passes(),
        }
    }
}

impl TimingConfig {
    /// Timing with every delay collapsed to a millisecond, for tests
    pub fn immediate() -> Self {
        Self {
            homepage_settle: 1,
            link_settle: 1,
            render_settle: 1,
            ready_timeout: 200,
            expand_settle: 1,
            scroll_settle: 1,
            click_settle: 1,
            pass_settle: 1,
            poll_interval: 5,
            expansion_passes: default_expansion_passes(),
        }
    }

    pub fn homepage_settle(&self) -> Duration {
        Duration::from_millis(self.homepage_settle)
    }

    pub fn link_settle(&self) -> Duration {
        Duration::from_millis(self.link_settle)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout)
    }

    pub fn expand_settle(&self) -> Duration {
        Duration::from_millis(self.expand_settle)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle)
    }

    pub fn pass_settle(&self) -> Duration {
        Duration::from_millis(self.pass_settle)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the structured XML document
    #[serde(rename = "xml-path")]
    pub xml_path: String,

    /// Path to the email CSV export
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

fn default_true() -> bool {
    true
}

fn default_max_sessions() -> usize {
    4
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_homepage_settle() -> u64 {
    5000
}

fn default_link_settle() -> u64 {
    5000
}

fn default_render_settle() -> u64 {
    3000
}

fn default_ready_timeout() -> u64 {
    20_000
}

fn default_expand_settle() -> u64 {
    3000
}

fn default_scroll_settle() -> u64 {
    500
}

fn default_click_settle() -> u64 {
    500
}

fn default_pass_settle() -> u64 {
    1000
}

fn default_poll_interval() -> u64 {
    100
}

fn default_expansion_passes() -> u32 {
    3
}
