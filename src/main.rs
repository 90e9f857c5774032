//! Listing-Crawler main entry point
//!
//! This is the command-line interface for one tenant's incremental crawl.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use listing_crawler::config::{load_layered_config, BackendKind, Config};
use listing_crawler::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Listing-Crawler: an incremental real-estate listing harvester
///
/// Discovers listing detail pages on a tenant's site, skips the ones already
/// recorded, extracts the rest and persists each result keyed by tenant and
/// URL.
#[derive(Parser, Debug)]
#[command(name = "listing-crawler")]
#[command(version)]
#[command(about = "An incremental real-estate listing harvester", long_about = None)]
struct Cli {
    /// Path to the tenant TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Shared configuration the tenant file is layered over
    #[arg(long, value_name = "FILE")]
    base_config: Option<PathBuf>,

    /// Override the configured persistence backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Table,
    File,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Table => BackendKind::Table,
            Backend::File => BackendKind::File,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) =
        load_layered_config(cli.base_config.as_deref(), &cli.config).with_context(|| {
            format!("Failed to load configuration {}", cli.config.display())
        })?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(backend) = cli.backend {
        config.storage.backend = backend.into();
    }

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let report = crawl(&config)
        .await
        .with_context(|| format!("Crawl for tenant {} failed", config.tenant.name))?;

    println!("{}: {}", config.tenant.name, report);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("listing_crawler=info,warn"),
                1 => EnvFilter::new("listing_crawler=debug,info"),
                2 => EnvFilter::new("listing_crawler=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Prints the resolved tenant and what a run would do
fn print_dry_run(config: &Config) {
    let tenant = &config.tenant;
    println!("=== Listing-Crawler Dry Run ===\n");

    println!("Tenant: {}", tenant.name);
    match (&tenant.start_page, &tenant.page_template) {
        (Some(start), _) => {
            println!("  Start page: {}", start);
            println!("  Max depth: {}", tenant.max_depth);
            println!("  Max pages: {}", tenant.max_pages);
        }
        (None, Some(template)) => {
            println!("  Page template: {}", template);
            println!(
                "  Listing pages: {}",
                tenant.max_synthetic_pages.unwrap_or(1)
            );
        }
        (None, None) => {}
    }
    println!("  Detail pages: {}", tenant.items_url_pattern);
    if !tenant.keywords.is_empty() {
        println!(
            "  Keywords: {} (weight {})",
            tenant.keywords.join(", "),
            tenant.weight
        );
    }
    if !tenant.allowed_domains.is_empty() {
        println!("  Allowed domains: {}", tenant.allowed_domains.join(", "));
    }
    if !tenant.blocked_domains.is_empty() {
        println!("  Blocked domains: {}", tenant.blocked_domains.join(", "));
    }

    println!("\nFetch:");
    println!("  Concurrency: {}", config.fetch.concurrency);
    println!(
        "  Delay: {}ms + up to {}ms",
        config.fetch.mean_delay_ms, config.fetch.max_range_ms
    );
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Respect robots.txt: {}", config.fetch.respect_robots);

    println!("\nStorage:");
    match config.storage.backend {
        BackendKind::Table => println!(
            "  Table {} in {}",
            config.storage.table_name.as_deref().unwrap_or("-"),
            config.storage.database_path
        ),
        BackendKind::File => println!(
            "  File {}",
            config.storage.output_file.as_deref().unwrap_or("-")
        ),
    }
    println!("  Hash content: {}", config.storage.hash_content);

    println!("\nExtraction:");
    match &config.llm {
        Some(llm) => println!("  Model {} at {}", llm.model(), llm.base_url),
        None => println!("  Disabled (page content only)"),
    }

    println!("\n✓ Configuration is valid");
}
