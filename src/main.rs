//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest page and email
//! harvester.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use site_harvest::config::{load_config_with_hash, validate, BackendKind, Config};
use site_harvest::crawler::crawl;
use site_harvest::output::{log_diagnostics, print_summary, write_reports};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: a rendered-page site harvester
///
/// Site-Harvest renders every same-domain page linked from a site's
/// homepage, opens collapsed content, and writes the page text and the
/// contact emails it finds to an XML document and a CSV file.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A rendered-page site harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without rendering anything
    #[arg(long)]
    dry_run: bool,

    /// Render backend, overriding the config file
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Start URL, overriding the config file
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Chromium,
    Static,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Chromium => BackendKind::Chromium,
            BackendArg::Static => BackendKind::Static,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if apply_overrides(&mut config, &cli) {
        validate(&config).context("Invalid command-line override")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides; returns whether anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;
    if let Some(backend) = cli.backend {
        config.browser.backend = backend.into();
        changed = true;
    }
    if let Some(start_url) = &cli.start_url {
        config.site.start_url = start_url.clone();
        changed = true;
    }
    changed
}

/// Handles the --dry-run mode: shows what a harvest would do
fn handle_dry_run(config: &Config) {
    println!("=== Site-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    match site_harvest::url::base_domain(&config.site.start_url) {
        Ok(domain) => println!("  Domain: {}", domain),
        Err(e) => println!("  Domain: unavailable ({})", e),
    }

    println!("\nBrowser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  Max sessions: {}", config.browser.max_sessions);
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!(
        "  Navigation timeout: {}s",
        config.browser.navigation_timeout_secs
    );

    println!("\nTiming:");
    println!("  Homepage settle: {}ms", config.timing.homepage_settle);
    println!("  Ready timeout: {}ms", config.timing.ready_timeout);
    println!("  Expansion passes: {}", config.timing.expansion_passes);

    println!("\nOutput:");
    println!("  XML: {}", config.output.xml_path);
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, quiet: bool) -> anyhow::Result<()> {
    let output = config.output.clone();

    let report = match crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e).context("Harvest aborted, no output written");
        }
    };

    log_diagnostics(&report);

    let written = write_reports(&report, &output).context("Failed to write results")?;
    if !quiet {
        print_summary(&report);
        println!("\nData saved to {}", written.xml.display());
        println!("Emails saved to {}", written.csv.display());
    }

    Ok(())
}
