use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use nba_analyzer::config::AppConfig;
use nba_analyzer::demo_feed::{self, DemoConfig};
use nba_analyzer::{logging, stats_feed, store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = AppConfig::from_env();
    if let Some(path) = arg_value(&args, "--csv") {
        cfg.csv_path = PathBuf::from(path);
    }
    if let Some(path) = arg_value(&args, "--db") {
        cfg.db_path = PathBuf::from(path);
    }
    if let Some(raw) = arg_value(&args, "--seasons") {
        cfg.seasons = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    let (table, source) = if args.iter().any(|a| a == "--demo") {
        (demo_feed::generate(&DemoConfig::default()), "demo".to_string())
    } else if let Some(path) = arg_value(&args, "--import") {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(anyhow!("import file {} not found", path.display()));
        }
        let table = store::load_csv(&path)?;
        (table, format!("import:{}", path.display()))
    } else {
        if cfg.seasons.is_empty() {
            return Err(anyhow!("no seasons resolved for ingest"));
        }
        info!(seasons = ?cfg.seasons, "downloading player game logs");
        let table = stats_feed::fetch_season_game_logs(&cfg).context("download game logs")?;
        (table, "stats.nba.com".to_string())
    };

    if table.is_empty() {
        return Err(anyhow!("nothing to ingest: the source produced no rows"));
    }
    let summary = store::replace_canonical(&cfg, &table, &source)?;

    println!("Game log ingest complete");
    println!("Source: {source}");
    println!("CSV: {}", summary.csv_path.display());
    println!("DB: {}", summary.db_path.display());
    println!("Rows: {}", summary.rows);
    println!("Players: {}", summary.players);
    if let Some(latest) = summary.latest_date {
        println!("Latest game: {latest}");
    }
    Ok(())
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
