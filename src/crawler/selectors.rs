//! Selector tables for link discovery and content expansion
//!
//! These are heuristics tuned to common CMS themes (Elementor, JetElements,
//! Bootstrap). Each entry pairs the CSS selector with the role it plays so
//! diagnostics can say which kind of widget was clicked or which region a
//! link came from.

use std::fmt;

/// Page region an anchor selector targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRegion {
    Document,
    Navigation,
    Footer,
    MainContent,
    MenuItem,
    Navbar,
    Sidebar,
    AriaNavigation,
}

/// Kind of collapsed widget an expand trigger opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerRole {
    FaqQuestion,
    AccordionHeader,
    CollapseHeader,
    AriaCollapsed,
    Toggle,
    DropdownToggle,
    ExpandButton,
    ShowMore,
    ReadMore,
    ElementorTab,
    ElementorAccordion,
    ElementorToggle,
    JetToggle,
}

/// Anchor selectors queried on the main document after frames are read
pub const LINK_SELECTORS: &[(&str, LinkRegion)] = &[
    ("a[href]", LinkRegion::Document),
    (
        "header a, nav a, .header a, .navigation a, .menu a, .nav a",
        LinkRegion::Navigation,
    ),
    ("footer a, .footer a", LinkRegion::Footer),
    (
        "main a, #main a, .main-content a, .content a",
        LinkRegion::MainContent,
    ),
    (".menu-item a", LinkRegion::MenuItem),
    (".navbar a", LinkRegion::Navbar),
    (".sidebar a", LinkRegion::Sidebar),
    ("[role=\"navigation\"] a", LinkRegion::AriaNavigation),
];

/// Anchor selector used inside embedded frames
pub const FRAME_LINK_SELECTOR: &str = "a[href]";

/// Elements clicked during each generic expansion pass, in order
pub const EXPAND_TRIGGERS: &[(&str, TriggerRole)] = &[
    (".faq-question", TriggerRole::FaqQuestion),
    (".accordion-header", TriggerRole::AccordionHeader),
    (".collapse-header", TriggerRole::CollapseHeader),
    ("[aria-expanded=\"false\"]", TriggerRole::AriaCollapsed),
    (".toggle", TriggerRole::Toggle),
    (".dropdown-toggle", TriggerRole::DropdownToggle),
    (".expand-button", TriggerRole::ExpandButton),
    (".show-more", TriggerRole::ShowMore),
    (".read-more", TriggerRole::ReadMore),
    (".elementor-tab-title", TriggerRole::ElementorTab),
    (".elementor-accordion-title", TriggerRole::ElementorAccordion),
    (".elementor-toggle-title", TriggerRole::ElementorToggle),
    (".jet-toggle-title", TriggerRole::JetToggle),
];

/// FAQ and accordion containers swept after the generic passes
pub const FAQ_CONTAINERS: &[&str] = &[
    ".faq",
    "#faq",
    ".faqs",
    ".accordion",
    "[id*=\"faq\"]",
    "[class*=\"faq\"]",
    ".elementor-accordion",
    ".elementor-toggle",
    ".jet-accordion",
    ".jet-toggle",
];

/// Button-like elements clicked inside each FAQ container
pub const FAQ_BUTTONS: &str = "button, [role=\"button\"], .accordion-header, \
    .elementor-tab-title, .elementor-toggle-title, .jet-toggle-title";

impl fmt::Display for LinkRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Document => "document",
            Self::Navigation => "navigation",
            Self::Footer => "footer",
            Self::MainContent => "main content",
            Self::MenuItem => "menu item",
            Self::Navbar => "navbar",
            Self::Sidebar => "sidebar",
            Self::AriaNavigation => "aria navigation",
        };
        f.write_str(name)
    }
}

impl fmt::Display for TriggerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
