//! Sitemapper main entry point
//!
//! This is the command-line interface for the sitemapper crawler.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sitemapper::config::{load_config_with_hash, CrawlConfig, FileConfig};
use sitemapper::output::{print_summary, Progress};
use sitemapper::sitemap::{validate_file, BuilderOptions, ChangeFreq, SitemapBuilder, SitemapWriter};
use sitemapper::Crawler;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "sitemap.xml";

/// Sitemapper: an XML sitemap generator
///
/// Crawls a single site breadth-first from a seed URL, staying on the seed's
/// host, and writes the pages it found as a sitemaps.org 0.9 sitemap.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "Generate XML sitemaps by crawling a website", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and write its sitemap
    Generate(GenerateArgs),

    /// Check an existing sitemap file against the protocol limits
    Validate {
        /// Sitemap file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Seed URL; only pages on its host are crawled
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum crawl depth [default: 3]
    #[arg(short, long)]
    depth: Option<u32>,

    /// Output file path [default: sitemap.xml]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum concurrent requests, at most 1024 [default: 5]
    #[arg(short, long)]
    concurrent: Option<usize>,

    /// Request timeout in milliseconds [default: 10000]
    #[arg(short, long = "timeout-ms")]
    timeout: Option<u64>,

    /// Pause between requests of one worker, in milliseconds [default: 1000]
    #[arg(short, long = "rate-limit-ms")]
    rate_limit: Option<u64>,

    /// Regular expression for URLs to skip (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Regular expression URLs must match to be crawled (repeatable)
    #[arg(short, long)]
    include: Vec<String>,

    /// Don't follow HTTP redirects
    #[arg(long)]
    no_follow_redirects: bool,

    /// Keep query strings in sitemap URLs
    #[arg(long)]
    keep_query: bool,

    /// Custom User-Agent string
    #[arg(long)]
    user_agent: Option<String>,

    /// Change frequency written for every URL [default: weekly]
    #[arg(long)]
    changefreq: Option<ChangeFreq>,

    /// Priority written for every URL, 0.0 to 1.0 [default: 0.5]
    #[arg(long)]
    priority: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Generate(args) => {
            let file = load_file_config(cli.config.as_deref())?;
            handle_generate(args, file, cli.quiet).await
        }
        Command::Validate { file } => handle_validate(&file),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Applies defaults, then file values, then command-line flags
fn build_crawl_config(args: &GenerateArgs, file: &FileConfig) -> Result<CrawlConfig> {
    let mut config = CrawlConfig::new(&args.url)?.merge_file(&file.crawler);

    if let Some(depth) = args.depth {
        config = config.with_max_depth(depth);
    }
    if let Some(concurrent) = args.concurrent {
        config = config.with_max_concurrency(concurrent);
    }
    if let Some(ms) = args.timeout {
        config = config.with_request_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.rate_limit {
        config = config.with_rate_limit(Duration::from_millis(ms));
    }
    if let Some(user_agent) = &args.user_agent {
        config = config.with_user_agent(user_agent.clone());
    }
    if args.no_follow_redirects {
        config = config.with_follow_redirects(false);
    }
    if !args.exclude.is_empty() {
        config = config.with_exclude_patterns(args.exclude.clone());
    }
    if !args.include.is_empty() {
        config = config.with_include_patterns(args.include.clone());
    }

    Ok(config)
}

fn build_sitemap_options(args: &GenerateArgs, file: &FileConfig) -> Result<BuilderOptions> {
    let mut options = BuilderOptions::default().merge_file(&file.sitemap)?;

    if let Some(freq) = args.changefreq {
        options.default_changefreq = Some(freq);
    }
    if let Some(priority) = args.priority {
        if !(0.0..=1.0).contains(&priority) {
            bail!("--priority must be between 0.0 and 1.0, got {}", priority);
        }
        options.default_priority = Some(priority);
    }
    if args.keep_query {
        options.strip_query = false;
    }

    Ok(options)
}

/// Handles the generate command: crawl, build, write
async fn handle_generate(args: GenerateArgs, file: FileConfig, quiet: bool) -> Result<()> {
    let config = build_crawl_config(&args, &file)?;
    let options = build_sitemap_options(&args, &file)?;
    let output = args
        .output
        .clone()
        .or_else(|| file.sitemap.output.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let base_url = config.base_url.clone();
    let crawler = Crawler::new(config).context("Failed to set up crawler")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nReceived interrupt signal. Shutting down...");
                cancel.cancel();
            }
        });
    }

    if !quiet {
        println!("Starting crawler for {}", base_url);
    }

    let mut builder = SitemapBuilder::new(&base_url, options);
    let mut progress = Progress::new(!quiet);
    let mut handle = crawler.start(cancel.clone());

    while let Some(result) = handle.next().await {
        match &result.error {
            Some(e) => tracing::debug!("Error crawling {}: {}", result.url, e),
            None => {
                if let Err(e) = builder.add_url(result.url.as_str(), result.last_modified) {
                    tracing::debug!("Not adding {} to sitemap: {}", result.url, e);
                }
            }
        }
        progress.update(&handle.stats());
    }

    progress.done();
    let summary = handle.finish().await;
    let cancelled = cancel.is_cancelled();

    tracing::debug!(
        "Frontier admitted {} URLs, {} left queued",
        crawler.frontier().seen_count(),
        crawler.frontier().outstanding()
    );

    if builder.count() == 0 {
        if cancelled {
            tracing::warn!("Crawl interrupted before any page was fetched; no sitemap written");
        }
        bail!("No pages were crawled successfully; sitemap not written");
    }

    let entries = builder.count();
    let urlset = builder.build().context("Failed to build sitemap")?;
    SitemapWriter::new(true)
        .write_to_file(&urlset, &output)
        .with_context(|| format!("Failed to write sitemap to {}", output.display()))?;

    if !quiet {
        println!();
        print_summary(&summary, entries, cancelled);
        println!("  Output file: {}", output.display());
    }

    Ok(())
}

/// Handles the validate command
fn handle_validate(path: &Path) -> Result<()> {
    let urlset = validate_file(path)
        .with_context(|| format!("Sitemap {} is invalid", path.display()))?;

    println!("✓ {} is valid ({} URLs)", path.display(), urlset.len());
    Ok(())
}
