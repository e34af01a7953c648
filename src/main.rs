//! Siterake command-line interface
//!
//! `export` mirrors a site to disk and rewrites its URLs, `serve` previews
//! the mirror locally, `report` crawls a site and writes an HTML SEO
//! report.

use clap::{Args, Parser, Subcommand};
use siterake::config::{load_config_or_default, validate, Config};
use siterake::crawler::{
    BrowserFetcher, BrowserOptions, Crawler, CrawlerConfig, Fetcher, HttpFetcher, LinkRejected,
    Page,
};
use siterake::exporter::Export;
use siterake::linter::{check_page, is_noindex_html, parse_sitemap_urls, CheckOptions};
use siterake::reporter::{render_report, CrawlFailure, InternalLink, PageReport, Report};
use siterake::rewriter::Rewriter;
use siterake::url::PageUrl;
use siterake::SiterakeError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Mirror a website to disk and audit it for SEO issues
#[derive(Parser, Debug)]
#[command(name = "siterake")]
#[command(version)]
#[command(about = "Mirror a website to disk and audit it for SEO issues", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter siterake.toml in the current directory
    Init,
    /// Export the website into a self-contained mirror directory
    Export(ExportArgs),
    /// Serve the exported site locally
    Serve(ServeArgs),
    /// Generate an SEO report for a website
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Base URL of the site (overrides siterake.toml)
    url: Option<String>,

    /// Output directory for the exported site
    #[arg(short, long)]
    output: Option<String>,

    /// Base URL of the site
    #[arg(long = "url")]
    url_flag: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Entrypoint paths to seed the crawl (repeatable)
    #[arg(long = "entrypoint")]
    entrypoints: Vec<String>,

    /// Exclude URLs matching a glob pattern (repeatable)
    #[arg(short = 'E', long = "exclude")]
    excludes: Vec<String>,

    /// Harvest links from matching pages without writing their bodies
    /// (repeatable)
    #[arg(long = "extract-only")]
    extract_only: Vec<String>,

    #[command(flatten)]
    js: JsArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory to serve (defaults to the configured output directory)
    dir: Option<String>,

    /// Port to use
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Open in browser
    #[arg(short, long)]
    open: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Base URL of the site to analyze
    url: Option<String>,

    /// Output file for the HTML report
    #[arg(short, long, default_value = "report.html")]
    output: String,

    /// Base URL of the site
    #[arg(long = "url")]
    url_flag: Option<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Entrypoint paths to seed the crawl (repeatable)
    #[arg(long = "entrypoint")]
    entrypoints: Vec<String>,

    /// Exclude URLs matching a glob pattern (repeatable)
    #[arg(short = 'E', long = "exclude")]
    excludes: Vec<String>,

    #[command(flatten)]
    js: JsArgs,
}

#[derive(Args, Debug)]
struct JsArgs {
    /// Enable JavaScript-based crawling for SPAs
    #[arg(long = "js-enabled")]
    js_enabled: bool,

    /// Milliseconds to wait for JS to execute after navigation
    #[arg(long = "js-wait")]
    js_wait: Option<u64>,

    /// Path to the browser executable
    #[arg(long = "js-executable")]
    js_executable: Option<String>,

    /// Additional browser flags (repeatable)
    #[arg(long = "js-flag")]
    js_flags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Init => handle_init(),
        Command::Export(args) => handle_export(args).await,
        Command::Serve(args) => handle_serve(args).await,
        Command::Report(args) => handle_report(args).await,
    };

    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result.map_err(Into::into)
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("siterake=info,warn"),
            1 => EnvFilter::new("siterake=debug,info"),
            2 => EnvFilter::new("siterake=trace,debug"),
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

/// Spawns a task that cancels the token on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}

/// Accepts bare hostnames on the command line.
fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

fn apply_js_args(config: &mut Config, js: &JsArgs) {
    if js.js_enabled {
        config.js.enabled = true;
    }
    if let Some(wait) = js.js_wait {
        config.js.wait_for = wait;
    }
    if let Some(path) = &js.js_executable {
        config.js.executable_path = path.clone();
    }
    config.js.flags.extend(js.js_flags.iter().cloned());
}

async fn build_fetcher(config: &Config) -> Result<Arc<dyn Fetcher>, SiterakeError> {
    if config.js.enabled {
        let fetcher = BrowserFetcher::new(BrowserOptions {
            wait_ms: config.js.wait_for,
            max_tabs: config.js.max_tabs,
            webdriver_url: config.js.webdriver_url.clone(),
            executable_path: config.js.executable_path.clone(),
            flags: config.js.flags.clone(),
        })
        .await?;
        Ok(Arc::new(fetcher))
    } else {
        Ok(Arc::new(HttpFetcher::new(None)?))
    }
}

fn handle_init() -> Result<(), SiterakeError> {
    let path = std::path::Path::new(siterake::config::CONFIG_FILE);
    if path.exists() {
        return Err(siterake::ConfigError::Validation(format!(
            "{} already exists",
            path.display()
        ))
        .into());
    }

    std::fs::write(path, Config::starter().to_toml()?)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn handle_export(args: ExportArgs) -> Result<(), SiterakeError> {
    let mut config = load_config_or_default()?;

    if let Some(url) = args.url.or(args.url_flag) {
        config.url = ensure_scheme(&url);
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(workers) = args.workers {
        config.workers_count = workers;
    }
    if !args.entrypoints.is_empty() {
        config.pages.entrypoints = args.entrypoints;
    }
    config.pages.exclude.extend(args.excludes);
    config.pages.extract_only.extend(args.extract_only);
    apply_js_args(&mut config, &args.js);

    validate(&config)?;

    let cancel = cancel_on_ctrl_c();
    let fetcher = build_fetcher(&config).await?;

    let export = Export::new(config.clone(), Arc::clone(&fetcher));
    let result = export.run(cancel).await;
    fetcher.close().await;
    result?;

    println!("Rewriting URLs...");
    Rewriter::new(&config.output, config.base_url()?).run()?;

    println!("Export finished.");
    Ok(())
}

async fn handle_serve(args: ServeArgs) -> Result<(), SiterakeError> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => load_config_or_default()?.output,
    };

    siterake::serve::run(PathBuf::from(dir), args.port, args.open).await
}

async fn handle_report(args: ReportArgs) -> Result<(), SiterakeError> {
    let mut config = load_config_or_default()?;

    if let Some(url) = args.url.or(args.url_flag) {
        config.url = ensure_scheme(&url);
    }
    if let Some(workers) = args.workers {
        config.workers_count = workers;
    }
    if !args.entrypoints.is_empty() {
        config.pages.entrypoints = args.entrypoints;
    }
    config.pages.exclude.extend(args.excludes);
    apply_js_args(&mut config, &args.js);

    validate(&config)?;
    let base_url = config.base_url()?;
    let exclude = config.exclude_patterns();

    let cancel = cancel_on_ctrl_c();
    let fetcher = build_fetcher(&config).await?;

    println!("Crawling {}...", base_url);

    let pages: Arc<Mutex<Vec<PageReport>>> = Arc::new(Mutex::new(Vec::new()));
    let failures: Arc<Mutex<Vec<CrawlFailure>>> = Arc::new(Mutex::new(Vec::new()));

    let on_new_link = {
        let base_url = base_url.clone();
        move |page: &Page, link: &siterake::crawler::Link| {
            if !page.url.is_html_like() {
                return Err(LinkRejected::SourceNotCrawlable);
            }
            if !link.url.is_internal(&base_url) {
                return Err(LinkRejected::External);
            }
            if exclude.match_any(link.url.path()) {
                return Err(LinkRejected::Excluded);
            }
            Ok(())
        }
    };

    let on_page = {
        let pages = Arc::clone(&pages);
        let base_url = base_url.clone();
        move |page: &Page| {
            // Assets are crawled for completeness but not reported on.
            if !page.url.is_html_like() {
                return;
            }

            let analysis = siterake::analyzer::analyze(&page.body, &page.url);
            let lints = check_page(
                &page.body,
                &page.url,
                &analysis,
                CheckOptions {
                    status_code: page.status,
                    redirect_chain: &page.redirect_chain,
                },
            );

            let internal_links = page
                .links
                .iter()
                .filter(|link| link.url.is_internal(&base_url))
                .map(|link| InternalLink {
                    target_url: link.url.to_string(),
                    is_follow: !link.rel.split_whitespace().any(|token| token == "nofollow"),
                })
                .collect();

            let report = PageReport {
                url: page.url.to_string(),
                title: analysis.title.clone(),
                description: analysis.description.clone(),
                canonical: analysis.canonical.clone(),
                status_code: page.status,
                images: analysis.images,
                internal_links,
                is_noindex: is_noindex_html(&page.body),
                lints,
            };

            tracing::info!(
                "analyzed {} ({} images, {} findings)",
                page.url,
                report.images.len(),
                report.lints.len()
            );
            if let Ok(mut pages) = pages.lock() {
                pages.push(report);
            }
        }
    };

    let on_fetch_error = {
        let failures = Arc::clone(&failures);
        move |url: &PageUrl, err: &siterake::crawler::FetchError| {
            if let Ok(mut failures) = failures.lock() {
                failures.push(CrawlFailure {
                    url: url.to_string(),
                    error: err.to_string(),
                    is_timeout: err.is_timeout(),
                });
            }
        }
    };

    let crawler = Crawler::new(CrawlerConfig {
        base_url: base_url.clone(),
        worker_count: config.workers_count,
        entrypoints: config.pages.entrypoints.clone(),
        fetcher: Arc::clone(&fetcher),
        on_new_link: Arc::new(on_new_link),
        on_page: Arc::new(on_page),
        on_fetch_error: Some(Arc::new(on_fetch_error)),
    });

    let crawl_result = crawler.run(cancel.clone()).await;
    fetcher.close().await;
    match crawl_result {
        Ok(()) => {}
        Err(SiterakeError::Cancelled) => {
            println!("\nCrawl cancelled.");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    let pages = pages.lock().map(|p| p.clone()).unwrap_or_default();
    let failures = failures.lock().map(|f| f.clone()).unwrap_or_default();
    if pages.is_empty() && failures.is_empty() {
        println!("No pages found to report.");
        return Ok(());
    }

    println!("Generating report for {} pages...", pages.len());

    // Sitemap membership and robots rules feed the site-wide lints; both
    // fetches are best-effort.
    let probe = HttpFetcher::new(None)?;
    let sitemap_urls = fetch_sitemap_urls(&probe, &base_url, &cancel).await;
    let robots_txt = fetch_robots_txt(&probe, &base_url, &cancel).await;

    let mut report = Report {
        site_url: base_url.to_string(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        pages,
        failures,
    };

    report.finalize(&sitemap_urls, |url| {
        robots_txt
            .as_ref()
            .map(|content| {
                let mut matcher = robotstxt::DefaultMatcher::default();
                !matcher.one_agent_allowed_by_robots(content, "Googlebot", url)
            })
            .unwrap_or(false)
    });

    std::fs::write(&args.output, render_report(&report))?;
    println!("Report saved to {}", args.output);
    Ok(())
}

async fn fetch_sitemap_urls(
    fetcher: &HttpFetcher,
    base_url: &PageUrl,
    cancel: &CancellationToken,
) -> Vec<String> {
    let Ok(sitemap_url) = base_url.resolve("/sitemap.xml") else {
        return Vec::new();
    };
    match fetcher.fetch(cancel, &sitemap_url).await {
        Ok(result) if result.status == 200 => parse_sitemap_urls(&result.body),
        _ => Vec::new(),
    }
}

async fn fetch_robots_txt(
    fetcher: &HttpFetcher,
    base_url: &PageUrl,
    cancel: &CancellationToken,
) -> Option<String> {
    let robots_url = base_url.resolve("/robots.txt").ok()?;
    match fetcher.fetch(cancel, &robots_url).await {
        Ok(result) if result.status == 200 => Some(String::from_utf8_lossy(&result.body).to_string()),
        _ => None,
    }
}
