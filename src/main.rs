mod cli;

use wallshift::{
    cache::{budget_bytes, ContentCache},
    config::{self, Config, FileSettings, SettingsSource},
    history::SqliteHistory,
    scoring::SmartSelector,
    search::{Aggregator, FallbackController},
    service::WallpaperService,
};
use wallshift_common::{DeviceDescriptor, WallpaperCandidate};
use wallshift_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CacheAction, Cli, Commands, HistoryAction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything a pipeline command needs, built from one config.
struct App {
    config: Config,
    service: WallpaperService,
    history: Arc<SqliteHistory>,
    settings: Arc<FileSettings>,
}

impl App {
    fn build(config: Config, config_path: Option<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.search.request_timeout_secs))
            .user_agent(concat!("wallshift/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let db_path = config.history.resolved_db_path();
        let db_path_str = db_path.to_string_lossy();
        tracing::debug!("Opening history database at {}", db_path_str);
        let pool = init_pool(&db_path_str)
            .with_context(|| format!("Failed to open history database {:?}", db_path))?;
        let history = Arc::new(SqliteHistory::new(pool, config.history.keep));

        let aggregator = Arc::new(Aggregator::from_config(&config, client.clone()));
        let fallback = FallbackController::new(aggregator, history.clone(), config.search.per_page);
        let selector = SmartSelector::new(history.clone());
        let cache = Arc::new(ContentCache::new(config.cache.resolved_dir(), client));
        let settings = Arc::new(FileSettings::for_config(config_path, &config));

        let service = WallpaperService::new(
            fallback,
            selector,
            cache,
            history.clone(),
            settings.clone(),
        )
        .with_max_download_attempts(config.search.max_download_attempts);

        Ok(Self {
            config,
            service,
            history,
            settings,
        })
    }

    fn categories(&self, requested: Vec<String>) -> Vec<String> {
        if requested.is_empty() {
            self.config.categories.clone()
        } else {
            requested
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "wallshift=debug,wallshift_db=debug".to_string()
        } else {
            "wallshift=info".to_string()
        }
    });

    // stdout carries command output (paths, JSON); logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().or_else(config::find_config_path);

    match cli.command {
        Commands::Fetch {
            categories,
            page,
            scores,
            json,
        } => {
            let app = App::build(config::load_config_or_default(cli.config.as_deref())?, config_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch(&app, categories, page, scores, json))
        }
        Commands::Next {
            categories,
            width,
            height,
            no_mark,
        } => {
            let app = App::build(config::load_config_or_default(cli.config.as_deref())?, config_path)?;
            let device = match (width, height) {
                (Some(w), Some(h)) => DeviceDescriptor::new(w, h)?,
                _ => app.config.device.descriptor()?,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(next(&app, categories, device, !no_mark))
        }
        Commands::Cache { action } => {
            let app = App::build(config::load_config_or_default(cli.config.as_deref())?, config_path)?;
            cache_command(&app, action)
        }
        Commands::History { action, limit } => {
            let app = App::build(config::load_config_or_default(cli.config.as_deref())?, config_path)?;
            match action {
                Some(HistoryAction::Clear) => {
                    let rt = tokio::runtime::Runtime::new()?;
                    let (rows, files) = rt.block_on(app.service.clear_history())?;
                    println!("Removed {} history entries and {} cached files", rows, files);
                    Ok(())
                }
                None => show_history(&app, limit),
            }
        }
        Commands::SetCacheSize { mb } => {
            let path = config_path.unwrap_or_else(|| PathBuf::from("./wallshift.toml"));
            config::persist::set_cache_size_mb(&path, mb)?;
            println!("Cache budget set to {} MB in {}", mb, path.display());
            Ok(())
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config).or_else(config::find_config_path);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("wallshift {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn fetch(app: &App, categories: Vec<String>, page: u32, scores: bool, json: bool) -> Result<()> {
    let categories = app.categories(categories);
    let outcome = app.service.fetch_detailed(&categories, page).await;

    match outcome.tier {
        Some(tier) => tracing::info!(
            "{} candidates from {} tier ({} already applied, filtered)",
            outcome.candidates.len(),
            tier,
            outcome.seen_filtered
        ),
        None => {
            println!("No wallpaper available");
            return Ok(());
        }
    }

    if scores {
        let device = app.config.device.descriptor()?;
        let ranked = app.service.rank(outcome.candidates, &device).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        } else {
            for scored in &ranked {
                let s = &scored.score;
                println!(
                    "{:.3}  res={:.2} aspect={:.2} pop={:.2} fresh={:.2} quality={:.2}  {}",
                    s.total, s.resolution, s.aspect, s.popularity, s.freshness, s.quality,
                    describe(&scored.candidate)
                );
            }
        }
    } else if json {
        println!("{}", serde_json::to_string_pretty(&outcome.candidates)?);
    } else {
        for candidate in &outcome.candidates {
            println!("{}", describe(candidate));
        }
    }

    Ok(())
}

fn describe(candidate: &WallpaperCandidate) -> String {
    format!(
        "{}  {}x{}  {} likes  [{}] by {}",
        candidate.id,
        candidate.width,
        candidate.height,
        candidate.likes,
        candidate.category,
        candidate.photographer
    )
}

async fn next(app: &App, categories: Vec<String>, device: DeviceDescriptor, mark: bool) -> Result<()> {
    let categories = app.categories(categories);
    let Some(prepared) = app.service.next_wallpaper(&categories, &device).await else {
        anyhow::bail!("No wallpaper available");
    };

    if mark {
        app.service.mark_applied(&prepared.candidate.id).await?;
    }

    tracing::info!(
        "Photo by {} ({}), target: {}",
        prepared.candidate.photographer,
        prepared.candidate.attribution_url,
        app.config.target
    );
    println!("{}", prepared.path.display());
    Ok(())
}

fn cache_command(app: &App, action: CacheAction) -> Result<()> {
    let cache = app.service.cache();
    match action {
        CacheAction::Size => {
            let used = cache.size_bytes();
            let budget_mb = app.settings.cache_budget_mb();
            println!("Cache: {}", cache.dir().display());
            println!("  Files: {}", cache.entries().len());
            println!("  Used: {:.1} MB ({} bytes)", used as f64 / 1_048_576.0, used);
            println!("  Budget: {} MB", budget_mb);
        }
        CacheAction::Evict => {
            let summary = cache.evict_to_budget(budget_bytes(app.settings.cache_budget_mb()));
            println!(
                "Removed {} files ({} bytes), {} bytes remaining",
                summary.removed, summary.freed_bytes, summary.remaining_bytes
            );
            if summary.failures > 0 {
                println!("  {} files could not be deleted", summary.failures);
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {} cached files", removed);
        }
    }
    Ok(())
}

fn show_history(app: &App, limit: usize) -> Result<()> {
    let entries = app.history.recently_applied(limit)?;
    if entries.is_empty() {
        println!("No wallpapers applied yet");
        return Ok(());
    }

    for entry in entries {
        let applied = entry
            .applied_at
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {}",
            applied,
            entry.id,
            entry.local_path.as_deref().unwrap_or("(not cached)")
        );
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file found, checking defaults");
            let config = Config::default();
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Categories: {}", config.categories.join(", "));
    println!(
        "  Device: {}x{}",
        config.device.width, config.device.height
    );
    for source in wallshift_common::ImageSource::all() {
        let provider = config.providers.get(*source);
        let state = if !provider.enabled {
            "disabled"
        } else if provider.api_key.is_empty() && config::requires_api_key(*source) {
            "missing key"
        } else {
            "ready"
        };
        println!("  {}: {}", source, state);
    }
    println!("  Cache: {} ({} MB)", config.cache.resolved_dir().display(), config.cache.max_size_mb);
    println!("  History: {}", config.history.resolved_db_path().display());

    Ok(())
}
