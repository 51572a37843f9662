use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nba_analyzer::config::{AnalyzerConfig, AppConfig, DataSource};
use nba_analyzer::demo_feed::{self, DemoConfig};
use nba_analyzer::game_log::{GameLogTable, Stat};
use nba_analyzer::report::{MatchupReport, compute_matchup_report};
use nba_analyzer::{export, logging, store};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let teams = positional(&args);
    let [team_a, team_b] = teams.as_slice() else {
        return Err(anyhow!(
            "usage: matchup <TEAM_A> <TEAM_B> [--window N] [--demo] [--from-db] [--export PATH]"
        ));
    };

    let cfg = AppConfig::from_env();
    let mut analyzer = AnalyzerConfig::default();
    if let Some(raw) = arg_value(&args, "--window") {
        analyzer.window_size = raw
            .parse::<usize>()
            .with_context(|| format!("invalid --window {raw:?}"))?
            .max(1);
    }

    let table = load_table(&cfg, &args)?;
    let report = compute_matchup_report(&table, team_a, team_b, &analyzer);
    print_report(&report);

    if let Some(path) = arg_value(&args, "--export") {
        let path = PathBuf::from(path);
        let summary = export::export_report(&path, &report)?;
        println!();
        println!(
            "Exported {} ({} players, {} legs)",
            path.display(),
            summary.players,
            summary.legs
        );
    }
    Ok(())
}

fn load_table(cfg: &AppConfig, args: &[String]) -> Result<GameLogTable> {
    if args.iter().any(|a| a == "--demo") || cfg.data_source == DataSource::Demo {
        return Ok(demo_feed::generate(&DemoConfig::default()));
    }
    if args.iter().any(|a| a == "--from-db") {
        let conn = store::open_db(&cfg.db_path)?;
        if let Some(run) = store::last_refresh(&conn)? {
            println!(
                "Snapshot #{} from {} ({}, {} rows)",
                run.run_id, run.refreshed_at, run.source, run.rows
            );
        }
        return store::load_game_logs(&conn);
    }
    store::load_csv(&cfg.csv_path)
}

fn print_report(report: &MatchupReport) {
    println!("{} vs {}", report.team_a, report.team_b);
    if report.is_empty() {
        println!("No recorded meetings between these teams.");
        return;
    }
    let (wins, losses) = report.series_record();
    println!(
        "{} is {}-{} over the last {} meetings",
        report.team_a,
        wins,
        losses,
        report.dates.len()
    );
    for h in &report.headers {
        println!(
            "  {}  {:<14} {}  {}",
            h.label,
            h.matchup,
            h.result.map(|r| r.as_str()).unwrap_or("-"),
            h.link.as_deref().unwrap_or("")
        );
    }

    for team in [report.team_a.as_str(), report.team_b.as_str()] {
        println!();
        println!("{team}");
        println!(
            "  {:<24} {:>5} {:>5} {:>5} {:>5} {:>5}  {:<22} {}",
            "Player", "GP", "PTS", "REB", "AST", "MIN", "PTS trend", "Status"
        );
        for p in report.players_for(team) {
            let agg = &p.aggregate;
            let markers: String = agg.availability.iter().map(|a| a.marker()).collect();
            println!(
                "  {:<24} {:>5} {:>5.1} {:>5.1} {:>5.1} {:>5.1}  {:<22} {}",
                agg.player_name,
                format!("{}/{}", agg.games_played, agg.window_len),
                agg.mean(Stat::Points),
                agg.mean(Stat::Rebounds),
                agg.mean(Stat::Assists),
                agg.mean(Stat::Minutes),
                p.trend(Stat::Points).map(|t| t.render()).unwrap_or_default(),
                markers
            );
        }
    }

    println!();
    println!("Patterns");
    if report.alerts.is_empty() {
        println!("  No replacement patterns");
    }
    for alert in &report.alerts {
        println!(
            "  {} {} without {}: {}",
            alert.date.format("%d/%m/%y"),
            alert.team,
            alert.missing_names().join(", "),
            alert.descriptions().join(", ")
        );
    }

    println!();
    println!("Legs");
    for pool in &report.legs.pools {
        println!("  {}", pool.title());
        for line in pool.display_lines() {
            println!("    {line}");
        }
    }
}

fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(flag) = arg.strip_prefix("--") {
            skip_next = !flag.contains('=') && matches!(flag, "window" | "export");
            continue;
        }
        out.push(arg.to_ascii_uppercase());
    }
    out
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
