//! Boilerscan: single-domain crawler with boilerplate-aware word statistics

use anyhow::Result;
use boilerscan::{
    analysis::{PageAnalyzer, UrlLanguageDetector},
    config::{Config, LogLevel, ReportFormat},
    crawl::CrawlCoordinator,
    render::HttpRenderer,
    report::CrawlReport,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

#[derive(Parser)]
#[command(name = "boilerscan")]
#[command(about = "Single-domain crawler with boilerplate-aware word statistics")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a domain and report its word statistics
    Crawl {
        /// Seed URL; the crawl never leaves its domain
        url: String,

        /// Maximum pages to crawl (0 = unlimited)
        #[arg(short, long)]
        max_pages: Option<u64>,

        /// Maximum link depth from the seed (0 = unlimited)
        #[arg(long)]
        max_depth: Option<u32>,

        /// Number of concurrent crawl workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Delay after each processed page in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Show a browser window if a browser-backed renderer is in use
        #[arg(long)]
        no_headless: bool,

        /// Load images, fonts, and styles in a browser-backed renderer
        #[arg(long)]
        no_fast_mode: bool,

        /// Skip the per-category boilerplate differential
        #[arg(long)]
        no_category_diff: bool,

        /// Write the report to this path as well as stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<CliReportFormat>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// CLI report format enum (mirrors ReportFormat but with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliReportFormat {
    /// Human-readable tables
    Text,
    /// Machine-readable JSON
    Json,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(format: CliReportFormat) -> Self {
        match format {
            CliReportFormat::Text => ReportFormat::Text,
            CliReportFormat::Json => ReportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config if present; a malformed or invalid file is fatal
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    // Setup logging
    let log_level = match config.logging.level.with_verbosity(cli.verbose) {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Crawl {
            url,
            max_pages,
            max_depth,
            workers,
            delay_ms,
            no_headless,
            no_fast_mode,
            no_category_diff,
            output,
            format,
        } => {
            // CLI flags override the config file
            if let Some(n) = max_pages {
                config.crawl.max_pages = n;
            }
            if let Some(d) = max_depth {
                config.crawl.max_depth = d;
            }
            if let Some(w) = workers {
                config.crawl.worker_count = w;
            }
            if let Some(ms) = delay_ms {
                config.crawl.delay_ms = ms;
            }
            if no_headless {
                config.fetch.headless = false;
            }
            if no_fast_mode {
                config.fetch.fast_mode = false;
            }
            if no_category_diff {
                config.analysis.category_diff = false;
            }
            if let Some(path) = output {
                config.report.output = Some(path);
            }
            if let Some(f) = format {
                config.report.format = f.into();
            }

            // Overrides can invalidate an otherwise valid config
            config.validate()?;

            run_crawl(config, url).await
        }
        Commands::Init { path } => init_config(path).await,
    }
}

async fn run_crawl(config: Config, seed: String) -> Result<()> {
    let seed_url = Url::parse(&seed)
        .or_else(|_| Url::parse(&format!("https://{}", seed)))
        .map_err(|_| anyhow::anyhow!("Invalid seed URL '{}'", seed))?;
    let host = seed_url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Seed URL '{}' has no host", seed_url))?;

    info!(
        "Crawling {} with {} workers",
        seed_url, config.crawl.worker_count
    );

    let renderer = Arc::new(HttpRenderer::new(config.fetch.to_render_config())?);
    let detector = UrlLanguageDetector::for_host(host);
    let analyzer = PageAnalyzer::new(config.analysis.skip_numeric_tokens, Box::new(detector));

    let coordinator = Arc::new(CrawlCoordinator::new(
        seed_url.clone(),
        &config.crawl,
        renderer,
        analyzer,
    )?);

    // Periodic progress while the crawl runs
    let progress = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(10));
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let stats = coordinator.stats().await;
                let frontier = coordinator.frontier_snapshot().await;
                info!(
                    "Progress: {} pages crawled, {} failed, {} queued, {} in flight",
                    stats.pages_succeeded, stats.pages_failed, frontier.queued, frontier.in_flight
                );
            }
        })
    };

    let crawl_result = coordinator.run().await;
    progress.abort();
    let outcome = crawl_result?;

    info!(
        "Crawl finished: {} pages analyzed, {} failed",
        outcome.stats.pages_succeeded, outcome.stats.pages_failed
    );

    let report = CrawlReport::build(
        &seed_url,
        &outcome.results,
        outcome.stats,
        config.analysis.boilerplate_threshold,
        config.analysis.category_diff,
    );

    let rendered = match config.report.format {
        ReportFormat::Text => report.to_string(),
        ReportFormat::Json => serde_json::to_string_pretty(&report)?,
    };

    println!("{}", rendered);

    if let Some(path) = &config.report.output {
        std::fs::write(path, &rendered)
            .map_err(|e| anyhow::anyhow!("Failed to write report to '{}': {}", path.display(), e))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

async fn init_config(path: PathBuf) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("config.toml");

    let toml_content = format!(
        r#"# Boilerscan configuration

[crawl]
# Number of concurrent crawl workers
worker_count = {}
# Politeness delay after each processed page (milliseconds)
delay_ms = {}
# Maximum pages to crawl, 0 = unlimited
max_pages = {}
# Maximum link depth from the seed, 0 = unlimited
max_depth = {}
# URL patterns to exclude (regular expressions)
exclude_patterns = []

[fetch]
user_agent = "{}"
timeout_secs = {}
connect_timeout_secs = {}
max_content_size = {}
max_redirects = {}
headless = {}
fast_mode = {}

[analysis]
# Fraction of pages a word must appear on to count as boilerplate
boilerplate_threshold = {}
# Also build per-category boilerplate profiles
category_diff = {}
# Drop tokens made entirely of digits
skip_numeric_tokens = {}

[report]
format = "{}"

[logging]
level = "{}"
"#,
        config.crawl.worker_count,
        config.crawl.delay_ms,
        config.crawl.max_pages,
        config.crawl.max_depth,
        config.fetch.user_agent,
        config.fetch.timeout_secs,
        config.fetch.connect_timeout_secs,
        config.fetch.max_content_size,
        config.fetch.max_redirects,
        config.fetch.headless,
        config.fetch.fast_mode,
        config.analysis.boilerplate_threshold,
        config.analysis.category_diff,
        config.analysis.skip_numeric_tokens,
        config.report.format,
        config.logging.level,
    );

    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}
