//! End-to-end harvests with the static backend
//!
//! These tests use wiremock to serve a small site and run the full
//! discover, extract and write cycle against it.

use site_harvest::config::{
    load_config, BackendKind, BrowserConfig, Config, OutputConfig, SiteConfig, TimingConfig,
};
use site_harvest::crawler::crawl;
use site_harvest::output::write_reports;
use site_harvest::state::{ContextLabel, FailureKind};
use site_harvest::HarvestError;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a static-backend configuration rooted at `start_url`
fn create_test_config(start_url: &str, dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            start_url: start_url.to_string(),
        },
        browser: BrowserConfig {
            backend: BackendKind::Static,
            max_sessions: 2,
            navigation_timeout_secs: 5,
            ..BrowserConfig::default()
        },
        timing: TimingConfig::immediate(),
        output: OutputConfig {
            xml_path: dir.path().join("site.xml").display().to_string(),
            csv_path: dir.path().join("emails.csv").display().to_string(),
        },
    }
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <nav><a href="{}/rooms">Rooms</a> <a href="/contact">Contact</a></nav>
            <a href="/blog/summer/">Blog</a>
            <a href="https://www.facebook.com/site">Facebook</a>
            <a href="/brochure.pdf">Brochure</a>
            <a href="/contact#map">Map</a>
            <a href="mailto:hello@example.com">Say hello</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/rooms",
        r#"<html><head><title>Rooms</title></head><body>
        <p>Ocean view suites.</p>
        <p>Book your stay: reservations@example.com</p>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/contact",
        r#"<html><head><title>Contact   Us</title></head><body>
        <script>var tracking = "noreply@tracker.example";</script>
        <p>Reach the front desk at frontdesk@example.com</p>
        </body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let output = config.output.clone();

    let report = crawl(config).await.expect("Harvest failed");

    // Frontier: home, rooms, contact; blog, social, pdf and fragment links skipped
    assert_eq!(report.diagnostics.frontier_size, 3);
    assert_eq!(report.pages.len(), 3);
    assert!(report.diagnostics.failed_pages.is_empty());

    let contact = report
        .pages
        .iter()
        .find(|p| p.url.ends_with("/contact"))
        .expect("contact page missing");
    assert_eq!(contact.title, "Contact Us");
    assert_eq!(contact.content, "Reach the front desk at frontdesk@example.com");

    let frontdesk = report
        .emails
        .iter()
        .find(|e| e.email == "frontdesk@example.com")
        .expect("frontdesk email missing");
    assert_eq!(frontdesk.context, Some(ContextLabel::Contact));
    assert!(frontdesk.url.ends_with("/contact"));

    let reservations = report
        .emails
        .iter()
        .find(|e| e.email == "reservations@example.com")
        .expect("reservations email missing");
    assert_eq!(reservations.context, Some(ContextLabel::Booking));

    // Markup-only addresses are still found
    assert!(report.emails.iter().any(|e| e.email == "hello@example.com"));
    assert!(report.emails.iter().any(|e| e.email == "noreply@tracker.example"));

    let written = write_reports(&report, &output).unwrap();
    let xml = std::fs::read_to_string(&written.xml).unwrap();
    let csv = std::fs::read_to_string(&written.csv).unwrap();

    assert!(xml.contains("<total_pages>3</total_pages>"));
    assert!(xml.contains("<path>/contact</path>"));
    assert!(xml.contains("<address>frontdesk@example.com</address>"));
    assert!(csv.starts_with("email,url,context\n"));
    assert!(csv.contains(&format!(
        "frontdesk@example.com,{}/contact,Contact Email\n",
        base_url
    )));
    assert_eq!(csv.lines().count(), report.emails.len() + 1);
}

#[tokio::test]
async fn test_dead_link_is_dropped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/alive">Alive</a> <a href="/gone">Gone</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/alive",
        "<html><head><title>Alive</title></head><body>Still here</body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&format!("{}/", base_url), &dir))
        .await
        .expect("Harvest failed");

    assert_eq!(report.pages.len(), 2);
    assert!(report.pages.iter().all(|p| !p.url.ends_with("/gone")));
    assert_eq!(report.diagnostics.failed_pages.len(), 1);
    assert_eq!(
        report.diagnostics.failed_pages[0].url,
        format!("{}/gone", base_url)
    );
    assert_eq!(
        report.diagnostics.failed_pages[0].kind,
        FailureKind::Navigation
    );
}

#[tokio::test]
async fn test_frame_links_are_discovered() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <iframe src="/widget"></iframe>
        <a href="/about">About</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/widget",
        r#"<html><body><a href="/booking">Book now</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/about",
        "<html><head><title>About</title></head><body>About us</body></html>".to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/booking",
        "<html><head><title>Booking</title></head><body>Pick a date</body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let report = crawl(create_test_config(&format!("{}/", base_url), &dir))
        .await
        .expect("Harvest failed");

    assert_eq!(report.diagnostics.discovery.frames_seen, 1);
    assert_eq!(report.diagnostics.discovery.frames_skipped, 0);

    let mut titles: Vec<_> = report.pages.iter().map(|p| p.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["About", "Booking", "Home"]);
}

#[tokio::test]
async fn test_homepage_failure_aborts_without_output() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", base_url), &dir);
    let xml_path = config.output.xml_path.clone();

    let err = crawl(config).await.unwrap_err();
    assert!(matches!(err, HarvestError::HomepageUnavailable { .. }));
    assert!(!std::path::Path::new(&xml_path).exists());
}

#[tokio::test]
async fn test_harvest_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Only page</title></head><body>
        <p>General info: info at example dot com</p>
        </body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let xml_path = dir.path().join("nested/out/site.xml");
    let csv_path = dir.path().join("nested/out/emails.csv");

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[site]
start-url = "{}/"

[browser]
backend = "static"
max-sessions = 4
navigation-timeout-secs = 5

[timing]
homepage-settle = 1
link-settle = 1
render-settle = 1
ready-timeout = 200
expand-settle = 1
scroll-settle = 1
click-settle = 1
pass-settle = 1
poll-interval = 5

[output]
xml-path = "{}"
csv-path = "{}"
"#,
        base_url,
        xml_path.display(),
        csv_path.display()
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    let output = config.output.clone();
    let report = crawl(config).await.expect("Harvest failed");
    write_reports(&report, &output).unwrap();

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.emails.len(), 1);
    assert_eq!(report.emails[0].email, "info@example.com");
    // A rewritten obfuscated address has no literal occurrence to label from
    assert_eq!(report.emails[0].context, None);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        csv,
        format!("email,url,context\ninfo@example.com,{}/,\n", base_url)
    );
    assert!(xml_path.exists());
}
