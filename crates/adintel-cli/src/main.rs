mod commands;
mod output;

use std::sync::Arc;

use adintel_crawler::{BrowserEngine, BrowserSettings, ChromiumEngine, Crawler};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::commands::Context;

#[derive(Debug, Parser)]
#[command(name = "adintel")]
#[command(about = "Meta Ad Library competitive intelligence")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan the library for a keyword and rank the advertisers found
    Scan {
        keyword: String,
        /// Stop after this many ads (default from tuning)
        #[arg(long)]
        max_ads: Option<usize>,
        /// Two-letter country code, overrides `ADINTEL_COUNTRY`
        #[arg(long)]
        country: Option<String>,
    },
    /// Collect every ad one advertiser runs
    Deep {
        page_name: String,
        /// Keyword scan used to seed page ids and landing domains
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Full market analysis for a keyword
    Market {
        keyword: String,
        #[arg(long)]
        top_brands: Option<usize>,
        #[arg(long)]
        ads_per_brand: Option<usize>,
        #[arg(long)]
        country: Option<String>,
    },
}

impl Commands {
    fn country(&self) -> Option<&str> {
        match self {
            Self::Scan { country, .. }
            | Self::Deep { country, .. }
            | Self::Market { country, .. } => country.as_deref(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = adintel_core::load_app_config().context("failed to load app config")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("adintel: choose a command (scan, deep, market); see --help");
        return Ok(());
    };

    let tuning = adintel_core::load_tuning_or_default(&config.tuning_path)
        .with_context(|| format!("failed to load tuning from {}", config.tuning_path.display()))?;

    let mut filters = tuning.crawler.filters.clone();
    filters.country = command
        .country()
        .map_or_else(|| config.country.clone(), str::to_uppercase);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing with partial results");
            on_signal.cancel();
        }
    });

    let engine = Arc::new(
        ChromiumEngine::launch(&BrowserSettings::from_app_config(&config))
            .await
            .context("failed to launch browser")?,
    );
    let crawler = Arc::new(Crawler::new(
        Arc::clone(&engine) as Arc<dyn BrowserEngine>,
        config.max_contexts,
        filters,
    ));

    tracing::info!(
        env = %config.env,
        country = %crawler.filters().country,
        max_contexts = config.max_contexts,
        "adintel starting"
    );

    let ctx = Context {
        config,
        tuning,
        crawler,
        cancel,
    };
    let result = match &command {
        Commands::Scan {
            keyword, max_ads, ..
        } => commands::run_scan(&ctx, keyword, *max_ads).await,
        Commands::Deep {
            page_name, keyword, ..
        } => commands::run_deep(&ctx, page_name, keyword.as_deref()).await,
        Commands::Market {
            keyword,
            top_brands,
            ads_per_brand,
            ..
        } => commands::run_market(&ctx, keyword, *top_brands, *ads_per_brand).await,
    };

    drop(ctx);
    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.shutdown().await {
                tracing::warn!(error = %e, "browser did not shut down cleanly");
            }
        }
        Err(_) => tracing::warn!("browser still in use at exit; leaving it to the OS"),
    }

    result
}
