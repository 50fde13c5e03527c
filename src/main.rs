//! CLI entry point for the manga pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use manga_pipeline::action::{DownloadAction, SearchAction};
use manga_pipeline::adapter::{AdapterInfo, HttpJsonAdapter, SearchSummary};
use manga_pipeline::download::HttpDownloader;
use manga_pipeline::http::HttpTimeouts;
use manga_pipeline::pipeline::{EventReceiver, PipelineConfig, PipelineEvent, event_channel};
use manga_pipeline::queue::DEFAULT_QUEUE_CAPACITY;
use manga_pipeline::scheduler::Scheduler;
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::{FileConfig, LoadedConfig, VerbositySetting, load_file_config};
use cli::{Args, Command, ConfigCommand, DownloadArgs, SearchArgs};

/// Effective settings after merging CLI flags over file config.
#[derive(Debug, Clone)]
struct Settings {
    base_url: Option<String>,
    output_dir: PathBuf,
    queue_capacity: usize,
    timeouts: HttpTimeouts,
    verbosity: VerbositySetting,
}

impl Settings {
    fn resolve(args: &Args, file: Option<&FileConfig>) -> Self {
        let defaults = HttpTimeouts::default();
        let file_verbosity = file.and_then(|cfg| cfg.verbosity);
        let verbosity = if args.quiet {
            VerbositySetting::Quiet
        } else {
            match args.verbose {
                0 => file_verbosity.unwrap_or(VerbositySetting::Default),
                1 => VerbositySetting::Verbose,
                _ => VerbositySetting::Debug,
            }
        };

        Self {
            base_url: args
                .base_url
                .clone()
                .or_else(|| file.and_then(|cfg| cfg.base_url.clone())),
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| file.and_then(|cfg| cfg.output_dir.clone()))
                .unwrap_or_else(|| PathBuf::from(".")),
            queue_capacity: args
                .queue_capacity
                .and_then(|n| usize::try_from(n).ok())
                .or_else(|| file.and_then(|cfg| cfg.queue_capacity))
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            timeouts: HttpTimeouts {
                connect_secs: file
                    .and_then(|cfg| cfg.connect_timeout_secs)
                    .unwrap_or(defaults.connect_secs),
                read_secs: file
                    .and_then(|cfg| cfg.read_timeout_secs)
                    .unwrap_or(defaults.read_secs),
            },
            verbosity,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_file_config(args.config_path.as_deref())?;
    let settings = Settings::resolve(&args, loaded.config.as_ref());

    // Priority: RUST_LOG env var > CLI flags > config file > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.verbosity.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, ?settings, "CLI arguments parsed");

    match &args.command {
        Command::Config {
            command: ConfigCommand::Show,
        } => {
            print_config(&args, &loaded, &settings);
            Ok(())
        }
        Command::Search(search) => run_search(&args.adapter_id, &settings, search).await,
        Command::Download(download) => run_download(&args.adapter_id, &settings, download).await,
    }
}

fn print_config(args: &Args, loaded: &LoadedConfig, settings: &Settings) {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!(
        "base_url = {}",
        settings.base_url.as_deref().unwrap_or("<unset>")
    );
    println!("adapter_id = {}", args.adapter_id);
    println!("output_dir = {}", settings.output_dir.display());
    println!("queue_capacity = {}", settings.queue_capacity);
    println!("connect_timeout_secs = {}", settings.timeouts.connect_secs);
    println!("read_timeout_secs = {}", settings.timeouts.read_secs);
    println!("verbosity = {}", settings.verbosity.as_str());
}

fn build_scheduler(adapter_id: &str, settings: &Settings) -> Result<(Scheduler, EventReceiver)> {
    let Some(base_url) = settings.base_url.as_deref() else {
        bail!(
            "No base URL configured\n  Suggestion: Pass --base-url or set base_url in the config file"
        );
    };

    let info = AdapterInfo::new(adapter_id, adapter_id)?;
    let adapter = HttpJsonAdapter::with_timeouts(info, base_url, settings.timeouts)?;
    let downloader = HttpDownloader::with_timeouts(settings.timeouts);
    let config = PipelineConfig {
        queue_capacity: settings.queue_capacity,
        download_root: settings.output_dir.clone(),
    };

    let (tx, rx) = event_channel();
    let mut scheduler = Scheduler::new(Arc::new(downloader), config)?.with_event_sink(tx);
    scheduler.register(Arc::new(adapter))?;
    Ok((scheduler, rx))
}

async fn run_search(adapter_id: &str, settings: &Settings, args: &SearchArgs) -> Result<()> {
    let action = SearchAction::from_fields(&args.to_fields())?;
    let (mut scheduler, mut events) = build_scheduler(adapter_id, settings)?;
    let ticket = scheduler.search(action.params())?;
    info!(%ticket, "search submitted");

    let mut results: Vec<SearchSummary> = Vec::new();
    let mut failed = 0usize;
    while !scheduler.is_idle() {
        scheduler.tick().await;
        while let Ok(event) = events.try_recv() {
            match event {
                PipelineEvent::SearchCompleted { results: hits, .. } => results.extend(hits),
                PipelineEvent::RequestFailed { .. } | PipelineEvent::PipelineHalted { .. } => {
                    failed += 1;
                }
                _ => {}
            }
        }
    }

    for hit in &results {
        println!(
            "{}\t{}\t{}",
            hit.opaque_id,
            hit.title,
            hit.author.as_deref().unwrap_or("-")
        );
    }
    info!(results = results.len(), "search complete");

    if failed > 0 {
        bail!("Search failed on {failed} adapter(s)");
    }
    Ok(())
}

async fn run_download(adapter_id: &str, settings: &Settings, args: &DownloadArgs) -> Result<()> {
    let actions = args
        .chapters
        .iter()
        .map(|&chapter| DownloadAction::from_fields(&args.to_fields(chapter, None)))
        .collect::<Result<Vec<_>, _>>()?;

    let (mut scheduler, mut events) = build_scheduler(adapter_id, settings)?;
    for action in actions {
        let handle = scheduler
            .download(adapter_id, action)
            .context("Failed to queue chapter download")?;
        debug!(ticket = %handle.ticket(), "download submitted");
    }

    let progress = if settings.verbosity == VerbositySetting::Quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut saved = 0usize;
    let mut failed = 0usize;
    while !scheduler.is_idle() {
        scheduler.tick().await;
        while let Ok(event) = events.try_recv() {
            match event {
                PipelineEvent::ChapterQueued { pages, chapter, .. } => {
                    progress.inc_length(u64::try_from(pages).unwrap_or(u64::MAX));
                    progress.set_message(format!("chapter {chapter}"));
                }
                PipelineEvent::PageSaved { .. } => {
                    saved += 1;
                    progress.inc(1);
                }
                PipelineEvent::RequestFailed { request, error, .. } => {
                    failed += 1;
                    progress.suspend(|| warn!(request = %request, error = %error, "request failed"));
                }
                PipelineEvent::PipelineHalted { reason, .. } => {
                    failed += 1;
                    progress.suspend(|| warn!(reason = %reason, "pipeline halted"));
                }
                PipelineEvent::SearchCompleted { .. } => {}
            }
        }
    }
    progress.finish_and_clear();

    info!(
        pages = saved,
        failed,
        output_dir = %settings.output_dir.display(),
        "Download complete"
    );

    if failed > 0 {
        bail!("{failed} request(s) failed; {saved} page(s) saved");
    }
    Ok(())
}
