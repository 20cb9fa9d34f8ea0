use clap::{Parser, Subcommand};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use seo_sentinel::config::AppConfig;
use seo_sentinel::generators::robots::{self, RobotsProfile};
use seo_sentinel::keywords::competitors::keyword_report;
use seo_sentinel::keywords::density::analyze_keywords;
use seo_sentinel::network::PageFetcher;
use seo_sentinel::ops::telemetry;
use seo_sentinel::persistence::{render, ReportFormat, ReportKind};
use seo_sentinel::refinery::{SignalExtractor, VisibleText};
use seo_sentinel::server::{start_server, AppState};

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "seo-sentinel")]
#[command(about = "SEO page scoring, generators and site monitoring")]
#[command(version)]
struct Cli {
    /// JSON config file; missing file means defaults
    #[arg(short, long, global = true, default_value = "seo-sentinel.json")]
    config: PathBuf,

    /// Human-readable logs instead of JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (and the scheduler when automation is enabled)
    Serve {
        /// Overrides server.port from the config
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start scheduled tasks
        #[arg(long)]
        no_automation: bool,
    },

    /// Fetch and score one page
    Analyze {
        url: String,

        /// json, html or csv
        #[arg(short, long, default_value = "json")]
        format: ReportFormat,

        /// Also write the rendered report under the data directory
        #[arg(long)]
        save: bool,
    },

    /// Score a list of pages, or the configured monitoring set for a domain
    Batch {
        domain: String,

        /// Explicit URLs; default is sitemap discovery
        #[arg(short, long, num_args = 1..)]
        urls: Vec<String>,

        #[arg(short, long, default_value = "json")]
        format: ReportFormat,

        #[arg(long)]
        save: bool,
    },

    /// Run scheduled tasks until ctrl-c, or one task with --task
    Automate {
        /// hourly, daily, competitor, weekly, monthly or keywords
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Print a generated robots.txt with its validation result
    Robots {
        domain: String,

        /// basic or video-greeting
        #[arg(short, long, default_value = "basic")]
        profile: RobotsProfile,
    },

    /// Keyword strategy report, or keyword density of one page with --url
    Keywords {
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.pretty {
        telemetry::init_tracing_pretty();
    } else {
        telemetry::init_tracing();
    }

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult {
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Serve { port, no_automation } => serve(config, port, no_automation).await,
        Command::Analyze { url, format, save } => analyze(config, &url, format, save).await,
        Command::Batch {
            domain,
            urls,
            format,
            save,
        } => batch(config, &domain, urls, format, save).await,
        Command::Automate { task } => automate(config, task).await,
        Command::Robots { domain, profile } => {
            let content = robots::generate(profile, &domain);
            println!("{}", content);
            let validation = robots::validate(&content);
            eprintln!("{}", serde_json::to_string_pretty(&validation)?);
            Ok(())
        }
        Command::Keywords { url } => keywords(config, url).await,
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>, no_automation: bool) -> CliResult {
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let automate = config.automation.enabled && !no_automation;

    let state = Arc::new(AppState::from_config(config)?);
    state.store.init().await?;

    let (server, local_addr) = start_server(Arc::clone(&state), addr)?;
    tracing::info!(addr = %local_addr, automation = automate, "SEO Sentinel ready");

    let scheduler = automate.then(|| state.scheduler.start());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    server.shutdown().await;
    Ok(())
}

async fn analyze(config: AppConfig, url: &str, format: ReportFormat, save: bool) -> CliResult {
    let state = AppState::from_config(config)?;
    let analysis = state.auditor.audit_url(url).await?;
    let rendered = render(&[&analysis], format)?;

    if save {
        state.store.init().await?;
        let path = state
            .store
            .save_text(ReportKind::Analysis, format.extension(), &rendered)
            .await?;
        tracing::info!(path = %path.display(), "Report saved");
    }

    println!("{}", rendered);
    Ok(())
}

async fn batch(
    config: AppConfig,
    domain: &str,
    urls: Vec<String>,
    format: ReportFormat,
    save: bool,
) -> CliResult {
    let state = AppState::from_config(config)?;
    let urls = (!urls.is_empty()).then_some(urls);
    let report = state.auditor.audit_batch(domain, urls).await;

    let rendered = match format {
        ReportFormat::Json => serde_json::to_string_pretty(&report)?,
        other => render(&report.analyses().collect::<Vec<_>>(), other)?,
    };

    if save {
        state.store.init().await?;
        let path = state
            .store
            .save_text(ReportKind::Batch, format.extension(), &rendered)
            .await?;
        tracing::info!(path = %path.display(), "Batch report saved");
    }

    tracing::info!(
        domain = %report.domain,
        processed = report.processed,
        failed = report.failed,
        skipped = report.skipped,
        "Batch complete"
    );
    println!("{}", rendered);
    Ok(())
}

async fn automate(config: AppConfig, task: Option<String>) -> CliResult {
    let state = AppState::from_config(config)?;
    state.store.init().await?;

    if let Some(name) = task {
        let outcome = state.scheduler.trigger(&name).await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let handle = state.scheduler.start();
    tracing::info!(tasks = handle.task_count(), "Automation running");

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;

    let status = state.scheduler.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn keywords(config: AppConfig, url: Option<String>) -> CliResult {
    let Some(url) = url else {
        println!("{}", serde_json::to_string_pretty(&keyword_report())?);
        return Ok(());
    };

    let fetcher = PageFetcher::with_config(&config.fetch)?;
    let page = fetcher.fetch(&url).await?;
    let signals = SignalExtractor::extract(&page.body, &page.final_url);
    let content = VisibleText::extract(&page.body);
    let title = (!signals.title.is_empty()).then_some(signals.title.as_str());

    let analysis = analyze_keywords(&content, title, &config.monitoring.keywords);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
