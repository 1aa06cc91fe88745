//! Harvests over scripted sites
//!
//! The scripted backend stands in for a browser so collapsed content,
//! embedded frames and session failures can be exercised deterministically.

use site_harvest::config::{BrowserConfig, Config, OutputConfig, SiteConfig, TimingConfig};
use site_harvest::crawler::selectors::FAQ_BUTTONS;
use site_harvest::crawler::Coordinator;
use site_harvest::output::{format_csv, format_xml};
use site_harvest::render::{ScriptedFactory, ScriptedNode, ScriptedPage, ScriptedSite};
use site_harvest::state::ContextLabel;

fn config(max_sessions: usize) -> Config {
    Config {
        site: SiteConfig {
            start_url: "https://www.resort.test/".to_string(),
        },
        browser: BrowserConfig {
            max_sessions,
            ..BrowserConfig::default()
        },
        timing: TimingConfig::immediate(),
        output: OutputConfig {
            xml_path: "unused.xml".to_string(),
            csv_path: "unused.csv".to_string(),
        },
    }
}

/// Homepage, an about page, and an FAQ page whose answers sit in a
/// collapsed accordion
fn faq_site() -> ScriptedSite {
    ScriptedSite::new()
        .page(
            ScriptedPage::new("https://www.resort.test/")
                .title("Resort")
                .text("Welcome to the resort")
                .link("/faq")
                .link("https://resort.test/about"),
        )
        .page(
            ScriptedPage::new("https://www.resort.test/faq")
                .title("FAQ")
                .text("Frequently asked questions")
                .node(ScriptedNode::new("faq").matching(".elementor-accordion"))
                .node(
                    ScriptedNode::new("q-booking")
                        .matching(FAQ_BUTTONS)
                        .inside("faq")
                        .reveals_text("Booking questions go to reservations@resort.test"),
                ),
        )
        .page(
            ScriptedPage::new("https://resort.test/about")
                .title("About")
                .text("Family run since 1990"),
        )
}

#[tokio::test]
async fn test_faq_accordion_content_is_harvested() {
    let coordinator = Coordinator::new(config(4), ScriptedFactory::new(faq_site()));
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.base_domain, "resort.test");
    assert_eq!(report.pages.len(), 3);

    let faq = report
        .pages
        .iter()
        .find(|p| p.url == "https://www.resort.test/faq")
        .expect("faq page missing");
    assert!(faq.content.contains("reservations@resort.test"));

    assert_eq!(report.emails.len(), 1);
    assert_eq!(report.emails[0].email, "reservations@resort.test");
    assert_eq!(report.emails[0].url, "https://www.resort.test/faq");
    assert_eq!(report.emails[0].context, Some(ContextLabel::Booking));
    assert!(report.diagnostics.expansion.clicked >= 1);

    let xml = format_xml(&report);
    assert!(xml.contains("<context>Booking Email</context>"));
    let csv = format_csv(&report.emails).unwrap();
    assert!(csv.contains("reservations@resort.test,https://www.resort.test/faq,Booking Email"));
}

#[tokio::test]
async fn test_same_email_on_every_page_yields_one_record() {
    let mut site = ScriptedSite::new().page(
        ScriptedPage::new("https://www.resort.test/")
            .text("Questions? info@resort.test")
            .link("/a")
            .link("/b")
            .link("/c")
            .link("/d")
            .link("/e"),
    );
    for name in ["a", "b", "c", "d", "e"] {
        site = site.page(
            ScriptedPage::new(&format!("https://www.resort.test/{}", name))
                .text("Send enquiries to info@resort.test"),
        );
    }

    let coordinator = Coordinator::new(config(4), ScriptedFactory::new(site));
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.pages.len(), 6);
    assert_eq!(report.emails.len(), 1);
    assert_eq!(report.emails[0].email, "info@resort.test");
    assert!(report.pages.iter().any(|p| p.url == report.emails[0].url));
}

#[tokio::test]
async fn test_frame_links_join_the_frontier() {
    let site = ScriptedSite::new()
        .page(
            ScriptedPage::new("https://www.resort.test/")
                .frame(vec![ScriptedNode::anchor("/booking-engine")])
                .inaccessible_frame()
                .link("/rooms"),
        )
        .page(ScriptedPage::new("https://www.resort.test/booking-engine").text("Dates"))
        .page(ScriptedPage::new("https://www.resort.test/rooms").text("Rooms"));

    let coordinator = Coordinator::new(config(4), ScriptedFactory::new(site));
    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.diagnostics.discovery.frames_seen, 2);
    assert_eq!(report.diagnostics.discovery.frames_skipped, 1);
    assert_eq!(report.diagnostics.frontier_size, 3);
    assert!(report
        .pages
        .iter()
        .any(|p| p.url == "https://www.resort.test/booking-engine"));
}

#[tokio::test]
async fn test_every_session_is_closed() {
    let coordinator = Coordinator::new(config(2), ScriptedFactory::new(faq_site()));
    coordinator.run().await.expect("Harvest failed");

    let factory = coordinator.factory();
    assert_eq!(factory.opened(), 3);
    assert_eq!(factory.closed(), factory.opened());
    assert_eq!(factory.shutdowns(), 1);
}

#[tokio::test]
async fn test_unreachable_homepage_aborts() {
    let site =
        ScriptedSite::new().page(ScriptedPage::new("https://www.resort.test/").unreachable());
    let coordinator = Coordinator::new(config(4), ScriptedFactory::new(site));

    let err = coordinator.run().await.unwrap_err();
    assert!(err.to_string().contains("https://www.resort.test/"));
    assert_eq!(coordinator.factory().opened(), 1);
    assert_eq!(coordinator.factory().closed(), coordinator.factory().opened());
    assert_eq!(coordinator.factory().shutdowns(), 1);
}
