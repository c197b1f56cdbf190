// schockpanel entry point.
// Parses the command line, sets up logging and config, then runs the chosen command.

mod cli;

use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use env_logger::{Env, Target};
use log::LevelFilter;
use reqwest::Url;

use schockpanel::api::GameClient;
use schockpanel::assets::{
    AssetRequest, AssetWorker, CacheStorage, FetchOutcome, HttpFetcher, TimestampStore,
    WorkerConfig, spawn_sweeper,
};
use schockpanel::config::Config;
use schockpanel::panel::AdminPanel;
use schockpanel::session::{GameId, IdentityStore};
use schockpanel::{PanelError, Result, app, paths};

use crate::cli::{AssetCmd, Cli, Cmd};

/// Log to stderr, or to the log file while the terminal UI owns the screen.
fn init_logging(to_file: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if to_file {
        let file = paths::log_path().and_then(|path| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).ok()?;
            }
            File::options().create(true).append(true).open(path).ok()
        });
        match file {
            Some(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.clone().or_else(paths::config_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    Ok(config)
}

fn required(path: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    path.ok_or_else(|| PanelError::Other(format!("Could not determine {} directory", what)))
}

async fn run_panel(config: &Config, game: Option<String>) -> Result<()> {
    let raw = game
        .or_else(|| config.game.id.clone())
        .ok_or(PanelError::MissingGameId)?;
    let game = GameId::new(&raw)?;
    let client = GameClient::new(&config.server.base_url)?;
    let identity_store = IdentityStore::new(required(paths::identity_path(), "data")?);

    log::info!("Opening admin panel for game {} on {}", game, client.base_url());
    let panel = AdminPanel::new(client, game, identity_store)?;
    app::run(panel).await?;
    Ok(())
}

fn asset_worker(config: &Config) -> Result<AssetWorker<HttpFetcher>> {
    let storage = CacheStorage::new(required(paths::asset_cache_root(), "cache")?);
    let timestamps = TimestampStore::open(&required(paths::meta_db_dir(), "cache")?);
    Ok(AssetWorker::new(
        WorkerConfig::from(&config.assets),
        storage,
        timestamps,
        HttpFetcher::new()?,
    ))
}

/// Resolve `raw` against the asset origin unless it is already absolute.
fn resolve_asset_url(origin: &str, raw: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(raw) {
        return Ok(url);
    }
    Url::parse(origin)
        .and_then(|base| base.join(raw))
        .map_err(|e| PanelError::InvalidUrl(format!("{}: {}", raw, e)))
}

async fn run_assets(config: &Config, cmd: AssetCmd) -> Result<()> {
    let mut worker = asset_worker(config)?;
    let started = worker.start(Utc::now())?;
    for name in &started.activation.deleted {
        println!("deleted cache {}", name);
    }
    for url in &started.sweep.removed {
        println!("expired {}", url);
    }

    match cmd {
        AssetCmd::Activate => {
            println!("cache {} active", worker.cache_name());
        }
        AssetCmd::List => {
            for entry in worker.entries()? {
                let last_access = entry
                    .last_access
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} {}", last_access, entry.url);
            }
        }
        AssetCmd::Fetch { urls } => {
            for raw in urls {
                let url = resolve_asset_url(config.asset_origin(), &raw)?;
                let outcome = worker.handle_fetch(&AssetRequest::get(url.clone())).await?;
                let source = match &outcome {
                    FetchOutcome::Passthrough => {
                        println!("{} not a static asset, skipped", url);
                        continue;
                    }
                    FetchOutcome::Cached { .. } => "cache",
                    FetchOutcome::Network { .. } => "network",
                };
                if let Some(response) = outcome.response() {
                    println!(
                        "{} {} {} bytes from {}",
                        url,
                        response.status,
                        response.body.len(),
                        source
                    );
                }
            }
        }
        AssetCmd::Sweep { watch: false } => {
            let report = &started.sweep;
            println!(
                "{} examined, {} expired (cutoff {})",
                report.examined,
                report.removed.len(),
                report.cutoff.to_rfc3339()
            );
            for failure in &report.failures {
                eprintln!("failed: {}", failure);
            }
        }
        AssetCmd::Sweep { watch: true } => {
            let every = config.assets.sweep_interval();
            let handle = spawn_sweeper(Arc::new(worker), every);
            log::info!("Sweeping every {} hours, Ctrl-C to stop", every.as_secs() / 3600);
            tokio::signal::ctrl_c().await?;
            handle.abort();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(matches!(cli.cmd, Cmd::Panel { .. }));

    let result = match load_config(&cli) {
        Ok(config) => match cli.cmd {
            Cmd::Panel { game } => run_panel(&config, game).await,
            Cmd::Assets { cmd } => run_assets(&config, cmd).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_asset_url() {
        let url = resolve_asset_url("http://localhost:5000", "/static/app.css").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/static/app.css");
    }

    #[test]
    fn test_resolve_absolute_asset_url() {
        let url = resolve_asset_url("http://localhost:5000", "https://cdn.example/a.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/a.js");
    }

    #[test]
    fn test_resolve_with_bad_origin() {
        assert!(resolve_asset_url("not a url", "/static/app.css").is_err());
    }
}
