use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use papermate_client::PaperMateClient;
use papermate_core::{
    AppConfig, DetailController, FetchError, FilterParams, ListMode, LoadOutcome,
    PaperListController, PaperSource, PublishedFilter, RecommendationMode,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "papermate",
    about = "Browse arXiv papers served by a PaperMate backend",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting PAPERMATE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Only papers tagged with this keyword.
    #[arg(long, default_value = "")]
    keyword: String,

    /// yes: only papers whose comment mentions a recent venue year.
    #[arg(long, default_value = "no")]
    published: PublishedFilter,

    /// Case-insensitive title substring.
    #[arg(long, default_value = "")]
    title: String,
}

impl FilterArgs {
    fn params(&self, page: u32) -> FilterParams {
        FilterParams::new()
            .with_keyword(self.keyword.as_str())
            .with_published(self.published)
            .with_title_search(self.title.as_str())
            .with_page(page)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show one page of papers and the pagination bar.
    List {
        #[arg(long, default_value = "1")]
        page: u32,
        #[command(flatten)]
        filters: FilterArgs,
        /// Viewport width used to size the page window.
        #[arg(long)]
        width: Option<u32>,
    },

    /// Load pages the way infinite scroll does and print everything loaded.
    Scroll {
        /// How many pages to pull in.
        #[arg(long, default_value = "3")]
        pages: u32,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show a single paper.
    Show { id: String },

    /// Show papers similar to the given one.
    Similar {
        id: String,
        /// Sample from the papers on the current page instead of asking the backend.
        /// Implied by `recommendation_mode = "local_shuffle"` in the config.
        #[arg(long)]
        local: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Show the effective config.
    Show,
    /// Write a default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("PAPERMATE_JSON").as_deref() == Ok("1");

    let mut config = AppConfig::load()?;
    if let Ok(url) = std::env::var("PAPERMATE_API_URL") {
        config.set_base_url(url);
        config.validate()?;
    }
    debug!(base_url = %config.api.base_url, "config loaded");

    match cli.command {
        Commands::List {
            page,
            filters,
            width,
        } => {
            let source = open_source(&config)?;
            let list = PaperListController::new(source, ListMode::Paged, filters.params(page));
            list.refresh().await;
            let snap = list.snapshot().await;
            let dur = start.elapsed().as_millis();

            if let Some(err) = &snap.error {
                fail(json_output, dur, err);
            }

            let width = width.unwrap_or(config.ui.viewport_width);
            let window = config.ui.pagination.window(
                snap.current_page,
                snap.total_pages.unwrap_or(1),
                width,
            );

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "items": snap.items,
                        "page": snap.current_page,
                        "total_pages": snap.total_pages,
                        "keywords": snap.keywords,
                        "filters": snap.filters,
                        "window": window.markers,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                if snap.items.is_empty() {
                    println!("No papers match these filters.");
                } else {
                    for paper in &snap.items {
                        print_paper_line(paper);
                    }
                }
                println!();
                println!("{}", window.render_text());
                if !snap.keywords.is_empty() {
                    println!("keywords: {}", snap.keywords.join(", "));
                }
            }
        }

        Commands::Scroll { pages, filters } => {
            let source = open_source(&config)?;
            let list = PaperListController::new(source, ListMode::Infinite, filters.params(1));
            list.refresh().await;
            for _ in 1..pages.max(1) {
                match list.on_sentinel_visible().await {
                    LoadOutcome::Applied => {}
                    LoadOutcome::Failed => break,
                    LoadOutcome::Skipped | LoadOutcome::Discarded => {
                        if !list.snapshot().await.has_more {
                            break;
                        }
                    }
                }
            }
            let snap = list.snapshot().await;
            let dur = start.elapsed().as_millis();

            if snap.items.is_empty() {
                if let Some(err) = &snap.error {
                    fail(json_output, dur, err);
                }
            }

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "items": snap.items,
                        "loaded_pages": snap.loaded_pages,
                        "total_pages": snap.total_pages,
                        "has_more": snap.has_more,
                        "error": snap.error,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for paper in &snap.items {
                    print_paper_line(paper);
                }
                println!(
                    "\n{} papers from {} page(s){}",
                    snap.items.len(),
                    snap.loaded_pages.len(),
                    if snap.has_more { ", more available" } else { "" }
                );
                if let Some(err) = &snap.error {
                    eprintln!("Stopped early: {err}");
                }
            }
        }

        Commands::Show { id } => {
            let source = open_source(&config)?;
            let result = source.fetch_paper(&id).await;
            let dur = start.elapsed().as_millis();

            match result {
                Ok(paper) => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":paper,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", paper.title);
                        println!("{}", paper.authors);
                        if let Some(at) = paper.published_at() {
                            println!("published {}", at.format("%Y-%m-%d"));
                        }
                        println!("arXiv {}  [{}]", paper.arxiv_id(), paper.category_list().join(", "));
                        if !paper.comment.is_empty() {
                            println!("comment: {}", paper.comment);
                        }
                        if let Some(url) = &paper.pdf_url {
                            println!("pdf: {url}");
                        }
                        if let Some(url) = &paper.code_url {
                            println!("code: {url}");
                        }
                        println!("\n{}", paper.abstract_text.trim());
                    }
                }
                Err(err) => fail(json_output, dur, &err),
            }
        }

        Commands::Similar { id, local, filters } => {
            let source = open_source(&config)?;
            let mode = if local {
                RecommendationMode::LocalShuffle
            } else {
                config.api.recommendation_mode
            };
            let detail = DetailController::new(source.clone(), config.ui.cache_recommendations)
                .with_mode(mode);

            let page = if mode == RecommendationMode::LocalShuffle {
                match source.fetch_page(&filters.params(1)).await {
                    Ok(page) => page.page_obj,
                    Err(err) => fail(json_output, start.elapsed().as_millis(), &err),
                }
            } else {
                Vec::new()
            };
            let mut rng = rand::rng();
            detail
                .recommend(&id, &page, config.ui.recommendation_limit, &mut rng)
                .await;

            let snap = detail.snapshot().await;
            let dur = start.elapsed().as_millis();
            if let Some(err) = &snap.error {
                fail(json_output, dur, err);
            }

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":snap.result,"meta":{"duration_ms":dur}}))?;
            } else if let Some(result) = &snap.result {
                println!("Similar to: {}", result.selected_paper.title);
                if result.recommended_papers.is_empty() {
                    println!("  (no recommendations)");
                }
                for paper in &result.recommended_papers {
                    println!("  {}  {}", paper.arxiv_id(), paper.title);
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path},"meta":{"duration_ms":start.elapsed().as_millis()}}))?;
                } else {
                    println!("{}", path.display());
                }
            }

            ConfigAction::Show => {
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                } else {
                    println!("# {}", AppConfig::config_path().display());
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }

            ConfigAction::Init { force } => {
                let path = AppConfig::config_path();
                if path.exists() && !force {
                    eprintln!("Config already exists at {}. Add --force to overwrite.", path.display());
                    std::process::exit(8);
                }
                AppConfig::default().save_to(&path)?;
                let dur = start.elapsed().as_millis();
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":{"path":path},"meta":{"duration_ms":dur}}))?;
                } else {
                    println!("Wrote default config to {}", path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_source(config: &AppConfig) -> Result<Arc<dyn PaperSource>> {
    Ok(Arc::new(PaperMateClient::new(&config.api)?))
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_paper_line(paper: &papermate_core::Paper) {
    let published = if paper.looks_published() { "*" } else { " " };
    println!(
        "{id:<12} {published} {title:<70}  {keywords}",
        id = paper.arxiv_id(),
        title = truncate(&paper.title, 70),
        keywords = paper.keyword_list().join(", "),
    );
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Report a failed request and exit: 2 for a missing paper, 1 otherwise.
fn fail(json_output: bool, dur: u128, err: &FetchError) -> ! {
    if json_output {
        let body = serde_json::json!({
            "status": "error",
            "error": err,
            "message": err.to_string(),
            "meta": { "duration_ms": dur }
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
    }
    std::process::exit(match err {
        FetchError::NotFound(_) => 2,
        _ => 1,
    });
}
