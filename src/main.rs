use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitemap_indexer::auth::{StaticToken, TokenProvider};
use sitemap_indexer::config::{Config, SitemapConfig};
use sitemap_indexer::error::{Error, ErrorCategory};
use sitemap_indexer::submission::{
    self, NotificationType, RunSummary, SubmissionCoordinator, SubmissionWorker,
};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Parser)]
#[command(
    name = "sitemap-indexer",
    version,
    about = "Submit sitemap URLs to the Google Indexing API",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every sitemap and submit its URLs (default)
    Run {
        /// Sitemap to process as URL or URL,MAX (replaces configured sitemaps)
        #[arg(short, long = "sitemap")]
        sitemaps: Vec<SitemapConfig>,

        /// Number of concurrent submissions
        #[arg(short, long)]
        workers: Option<usize>,

        /// Service-account key file
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Use this access token instead of the key file
        #[arg(long)]
        access_token: Option<String>,

        /// Submission log file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Show the URLs a run would submit without submitting them
    List {
        /// Sitemap to list as URL or URL,MAX (replaces configured sitemaps)
        #[arg(short, long = "sitemap")]
        sitemaps: Vec<SitemapConfig>,
    },

    /// Submit a single URL
    Publish {
        /// URL to announce
        url: String,

        /// Announce removal instead of update
        #[arg(long, default_value = "false")]
        deleted: bool,

        /// Service-account key file
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Use this access token instead of the key file
        #[arg(long)]
        access_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    let command = cli.command.unwrap_or(Commands::Run {
        sitemaps: Vec::new(),
        workers: None,
        key_file: None,
        access_token: None,
        log_file: None,
    });

    match command {
        Commands::Run {
            sitemaps,
            workers,
            key_file,
            access_token,
            log_file,
        } => {
            if !sitemaps.is_empty() {
                config.sitemaps = sitemaps;
            }
            if let Some(workers) = workers {
                config.indexing.workers = workers;
            }
            if let Some(key_file) = key_file {
                config.indexing.key_file = key_file;
            }
            if let Some(log_file) = log_file {
                config.output.log_file = log_file;
            }
            config.validate().context("Invalid configuration")?;

            tracing::info!(
                sitemaps = config.sitemaps.len(),
                workers = config.indexing.workers,
                "Starting run command"
            );
            run(&config, access_token).await?;
        }

        Commands::List { sitemaps } => {
            if !sitemaps.is_empty() {
                config.sitemaps = sitemaps;
            }
            config.validate().context("Invalid configuration")?;

            tracing::info!(sitemaps = config.sitemaps.len(), "Starting list command");
            list(&config).await?;
        }

        Commands::Publish {
            url,
            deleted,
            key_file,
            access_token,
        } => {
            if let Some(key_file) = key_file {
                config.indexing.key_file = key_file;
            }
            config.validate().context("Invalid configuration")?;

            let notification_type = if deleted {
                NotificationType::UrlDeleted
            } else {
                NotificationType::UrlUpdated
            };

            tracing::info!(
                url = %url,
                notification_type = %notification_type,
                "Starting publish command"
            );
            publish(&config, &url, notification_type, access_token).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = path.or_else(|| default_path.exists().then_some(default_path));

    Config::load(path).context("Failed to load configuration")
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("sitemap_indexer=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("sitemap_indexer={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

async fn run(config: &Config, access_token: Option<String>) -> Result<()> {
    let outcome = match access_token {
        Some(token) => {
            let tokens: Arc<dyn TokenProvider> = Arc::new(StaticToken::new(token));
            let coordinator = SubmissionCoordinator::from_config(config)?;
            coordinator.run(&config.sitemaps, tokens).await
        }
        None => submission::execute(config).await,
    };

    match outcome {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) if e.category() == ErrorCategory::Auth => {
            tracing::error!(error = %e, "Error loading credentials, aborting run");
            eprintln!("Error loading credentials: {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn list(config: &Config) -> Result<()> {
    let coordinator = SubmissionCoordinator::from_config(config)?;

    for (sitemap, urls) in coordinator.list(&config.sitemaps).await {
        println!("{} ({} URLs, max {})", sitemap.url, urls.len(), sitemap.max_urls);
        for url in urls {
            println!("  {url}");
        }
    }

    Ok(())
}

async fn publish(
    config: &Config,
    url: &str,
    notification_type: NotificationType,
    access_token: Option<String>,
) -> Result<()> {
    let tokens: Arc<dyn TokenProvider> = match access_token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => match submission::load_credentials(&config.indexing).await {
            Ok(tokens) => tokens,
            Err(e) => {
                let e = Error::from(e);
                tracing::error!(
                    error = %e,
                    category = e.category().as_str(),
                    "Error loading credentials"
                );
                eprintln!("Error loading credentials: {e}");
                return Ok(());
            }
        },
    };

    let worker = SubmissionWorker::from_config(&config.indexing)?;
    let result = worker.publish(url, notification_type, tokens.as_ref()).await;
    println!("{}", result.console_line());

    let mut summary = RunSummary::default();
    summary.record(&result);
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Total URLs submitted successfully: {}", summary.success);
    println!("Total URLs failed: {}", summary.failure);
}
