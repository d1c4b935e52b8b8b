//! `tto` - crawl tech-transfer sites, score and classify listings.

mod config;
mod seeds;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tto_crawler::{
    extract_listing, Band, Classifier, ClassifierKind, ClassifierStrategy, CrawlOrchestrator,
    CrawlReport, FetcherExt, FilterConfig, HeuristicFilter, HttpFetcher, JsonLinesSink,
    ModelConfig, PillarScores, RoutingFetcher, ScoreWeights, SiteState,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "tto")]
#[command(about = "Tech-transfer listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every site in a seed file
    Crawl {
        /// Seed file (JSON)
        seeds: PathBuf,

        /// JSON Lines output (overrides TTO_OUTPUT)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Maximum pages per site (overrides TTO_MAX_PAGES)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Maximum link depth (overrides TTO_MAX_DEPTH)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Only follow links that mention tech-transfer keywords
        #[arg(long)]
        keywords: bool,
    },

    /// Composite due-diligence score from a pillar score file
    Score {
        /// JSON object of pillar scores
        scores: PathBuf,

        /// JSON weight table, `[{"pillar": ..., "weight": ...}]`
        #[arg(long)]
        weights: Option<PathBuf>,
    },

    /// Classify listing text
    Classify {
        /// Text to classify
        text: Option<String>,

        /// Read input from a file instead
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Treat the input as listing HTML and extract details first
        #[arg(long)]
        html: bool,

        /// heuristic | model (overrides TTO_CLASSIFIER)
        #[arg(long)]
        classifier: Option<ClassifierKind>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tto_crawler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Crawl {
            seeds,
            output,
            max_pages,
            max_depth,
            keywords,
        } => {
            let mut config = config;
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(max) = max_pages {
                config.crawl.max_pages = max;
            }
            if let Some(depth) = max_depth {
                config.crawl.max_depth = depth;
            }
            crawl(config, seeds, keywords).await
        }
        Commands::Score { scores, weights } => score(scores, weights),
        Commands::Classify {
            text,
            file,
            html,
            classifier,
        } => classify(text, file, html, classifier.unwrap_or(config.classifier)).await,
    }
}

async fn crawl(config: Config, seeds_path: PathBuf, keywords: bool) -> Result<()> {
    let seeds = seeds::load_seeds(&seeds_path)?;
    tracing::info!(sites = seeds.len(), output = %config.output.display(), "Seeds loaded");

    let rps = config.crawl.requests_per_second;
    let http = HttpFetcher::builder()
        .timeout(config.crawl.fetch_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = RoutingFetcher::new(http.rate_limited(rps));

    let needs_render = seeds.iter().any(|s| s.render_js);
    #[cfg(feature = "browser")]
    let fetcher = if needs_render {
        tracing::info!(tabs = config.browser_tabs, "Launching headless browser");
        let browser = tto_crawler::BrowserFetcher::launch(config.browser_tabs)
            .await
            .context("Failed to launch headless browser")?;
        fetcher.with_renderer(browser.rate_limited(rps))
    } else {
        fetcher
    };
    if !cfg!(feature = "browser") && needs_render {
        tracing::warn!("Some sites need script rendering; rebuild with --features browser");
    }

    let sink = JsonLinesSink::open(&config.output)
        .await
        .with_context(|| format!("Failed to open output {}", config.output.display()))?;

    let mut orchestrator = CrawlOrchestrator::new(fetcher, sink, config.crawl.clone());
    if keywords {
        orchestrator =
            orchestrator.with_filter(HeuristicFilter::new(FilterConfig::tech_transfer()));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight fetches");
            on_signal.cancel();
        }
    });

    let report = orchestrator.run_with_cancel(&seeds, cancel).await;
    print_report(&report, &config);
    Ok(())
}

fn print_report(report: &CrawlReport, config: &Config) {
    println!();
    println!("{} {}", "Run".bold(), report.run_id);
    for site in &report.sites {
        let state = match site.state {
            SiteState::Exhausted => "exhausted".green(),
            SiteState::Bounded => "bounded".cyan(),
            SiteState::Cancelled => "cancelled".yellow(),
            SiteState::Failed => "failed".red(),
            SiteState::Seeded | SiteState::Crawling => "incomplete".yellow(),
        };
        println!(
            "  {:<24} {:<10} {:>4} pages  {:>3} failed  {:>4} rejected  {:>2} cycles",
            site.site, state, site.pages_crawled, site.pages_failed, site.links_rejected,
            site.cycles_detected
        );
        if let Some(error) = &site.error {
            println!("  {:<24} {}", "", error.dimmed());
        }
    }
    println!(
        "{} {} pages across {} sites, records in {}",
        "Done:".bright_green().bold(),
        report.pages_crawled(),
        report.sites.len(),
        config.output.display()
    );
}

fn score(scores_path: PathBuf, weights_path: Option<PathBuf>) -> Result<()> {
    let raw = std::fs::read_to_string(&scores_path)
        .with_context(|| format!("Failed to read {}", scores_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", scores_path.display()))?;
    if !value.is_object() {
        bail!("{} must contain a JSON object of pillar scores", scores_path.display());
    }
    let scores = PillarScores::from_json(&value);

    let weights = match weights_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<ScoreWeights>(&raw)
                .with_context(|| format!("{} is not a valid weight table", path.display()))?
        }
        None => ScoreWeights::default(),
    };

    for pillar in weights.pillars() {
        println!(
            "  {:<30} {:>4.1} x {:.2}",
            pillar,
            scores.get(pillar),
            weights.weight(pillar).unwrap_or(0.0)
        );
    }

    let composite = weights.composite(&scores);
    let band = match composite.band {
        Band::Green => composite.band.to_string().green(),
        Band::Amber => composite.band.to_string().yellow(),
        Band::Red => composite.band.to_string().red(),
    };
    println!("{} {:.1} / 100 ({})", "Composite:".bold(), composite.score_0_100, band);
    Ok(())
}

async fn classify(
    text: Option<String>,
    file: Option<PathBuf>,
    html: bool,
    kind: ClassifierKind,
) -> Result<()> {
    let input = match (text, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => bail!("Pass either text or --file"),
    };

    let text = if html {
        let details = extract_listing(&input, "about:blank");
        println!(
            "{} {} (completeness {:.0}%)",
            "Title:".bold(),
            details.title.as_deref().unwrap_or("-"),
            details.completeness() * 100.0
        );
        details.classification_text()
    } else {
        input
    };

    let classifier = ClassifierStrategy::from_kind(kind, ModelConfig::from_env)
        .context("Failed to build classifier")?;
    let result = classifier
        .classify(&text)
        .await
        .context("Classification failed")?;

    println!(
        "{} {} ({:.2}, {})",
        "Label:".bold(),
        result.label.bright_cyan(),
        result.confidence,
        classifier.name()
    );
    Ok(())
}
