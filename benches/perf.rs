use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use nba_analyzer::aggregate::aggregate_window;
use nba_analyzer::config::AnalyzerConfig;
use nba_analyzer::demo_feed::{DemoConfig, generate};
use nba_analyzer::game_log::{GameLogTable, Stat};
use nba_analyzer::matchup::select_matchup_window;
use nba_analyzer::report::compute_matchup_report;
use nba_analyzer::stats_feed::parse_league_game_log_json;
use nba_analyzer::store;
use nba_analyzer::trend::build_trends;

/// Most of a league: 28 teams, nine-man rotations, four meetings per pair.
fn league_table() -> GameLogTable {
    generate(&DemoConfig {
        team_count: 28,
        players_per_team: 9,
        meetings_per_pair: 4,
        ..DemoConfig::default()
    })
}

fn bench_matchup_report(c: &mut Criterion) {
    let table = league_table();
    let cfg = AnalyzerConfig::default();
    c.bench_function("matchup_report", |b| {
        b.iter(|| {
            let report = compute_matchup_report(black_box(&table), "ATL", "BOS", &cfg);
            black_box(report.players.len());
        })
    });
}

fn bench_window_select(c: &mut Criterion) {
    let table = league_table();
    c.bench_function("window_select", |b| {
        b.iter(|| {
            let window = select_matchup_window(black_box(&table), "LAL", "BOS", 5);
            black_box(window.len());
        })
    });
}

fn bench_aggregate_and_trends(c: &mut Criterion) {
    let table = league_table();
    let window = select_matchup_window(&table, "ATL", "BOS", 5);
    let current = table.current_team_map();
    let history = table.player_history();
    c.bench_function("aggregate_and_trends", |b| {
        b.iter(|| {
            let aggs = aggregate_window(black_box(&window), &current, &history);
            let trends = build_trends(&window.dates, &window.rows, Stat::Points);
            black_box((aggs.len(), trends.series.len()));
        })
    });
}

fn bench_csv_load(c: &mut Criterion) {
    let table = league_table();
    let mut buf = Vec::new();
    store::write_csv(&mut buf, &table).unwrap();
    c.bench_function("csv_load", |b| {
        b.iter(|| {
            let loaded = store::read_csv(black_box(buf.as_slice())).unwrap();
            black_box(loaded.len());
        })
    });
}

fn bench_game_log_parse(c: &mut Criterion) {
    let json = game_log_json(2_000);
    c.bench_function("game_log_parse", |b| {
        b.iter(|| {
            let raw = parse_league_game_log_json(black_box(&json)).unwrap();
            black_box(raw.rows.len());
        })
    });
}

fn game_log_json(rows: usize) -> String {
    let body: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"["22024",{id},"Player {id}","LAL","00224{game:05}","2025-01-10","LAL vs. BOS","W",{min},{pts},7,5]"#,
                id = 1000 + i % 300,
                game = i / 20,
                min = 20 + i % 15,
                pts = i % 35,
            )
        })
        .collect();
    format!(
        r#"{{"resultSets":[{{"name":"LeagueGameLog","headers":["SEASON_ID","PLAYER_ID","PLAYER_NAME","TEAM_ABBREVIATION","GAME_ID","GAME_DATE","MATCHUP","WL","MIN","PTS","REB","AST"],"rowSet":[{}]}}]}}"#,
        body.join(",")
    )
}

criterion_group!(
    perf,
    bench_matchup_report,
    bench_window_select,
    bench_aggregate_and_trends,
    bench_csv_load,
    bench_game_log_parse
);
criterion_main!(perf);
