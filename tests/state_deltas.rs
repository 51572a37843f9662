use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use nba_analyzer::config::AnalyzerConfig;
use nba_analyzer::demo_feed::{DemoConfig, generate};
use nba_analyzer::report::compute_matchup_report;
use nba_analyzer::state::{AppState, DataStatus, Delta, Screen, apply_delta};

#[test]
fn report_for_open_matchup_is_kept() {
    let table = generate(&DemoConfig::default());
    let report = compute_matchup_report(&table, "ATL", "BOS", &AnalyzerConfig::default());

    let mut state = AppState::new();
    state.open_matchup("ATL", "BOS");
    assert!(state.report_loading);
    apply_delta(&mut state, Delta::SetReport(Box::new(report.clone())));

    assert!(!state.report_loading);
    assert_eq!(state.report.as_ref(), Some(&report));

    state.back_to_agenda();
    assert_eq!(state.screen, Screen::Agenda);
    // A late answer for the matchup just left does not reopen anything.
    apply_delta(&mut state, Delta::SetReport(Box::new(report)));
    assert_eq!(state.screen, Screen::Agenda);
}

#[test]
fn data_status_follows_load_lifecycle() {
    let mut state = AppState::new();
    assert_eq!(state.data, DataStatus::Unknown);

    apply_delta(&mut state, Delta::DataLoading);
    assert_eq!(state.data, DataStatus::Loading);

    let latest = NaiveDate::from_ymd_opt(2025, 4, 13);
    apply_delta(&mut state, Delta::DataLoaded { rows: 26_000, latest });
    assert_eq!(state.data, DataStatus::Ready { rows: 26_000, latest });

    apply_delta(&mut state, Delta::DataFailed("timeout".to_string()));
    assert_eq!(state.data, DataStatus::Failed("timeout".to_string()));
    assert!(state.logs.back().is_some_and(|l| l.contains("timeout")));
}

#[test]
fn roster_numbers_are_looked_up_per_team() {
    let mut state = AppState::new();
    let jerseys = HashMap::from([("LeBron James".to_string(), "23".to_string())]);
    apply_delta(
        &mut state,
        Delta::SetRoster {
            team: "LAL".to_string(),
            jerseys,
        },
    );
    assert_eq!(state.jersey("LAL", "LeBron James"), Some("23"));
    assert_eq!(state.jersey("BOS", "LeBron James"), None);
}

#[test]
fn rosters_are_refetched_after_the_ttl() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetRoster {
            team: "LAL".to_string(),
            jerseys: HashMap::new(),
        },
    );
    let teams = vec!["LAL".to_string(), "BOS".to_string()];
    let ttl = Duration::from_secs(3600);

    assert_eq!(state.rosters_due(&teams, Instant::now(), ttl), vec!["BOS".to_string()]);
    let later = Instant::now() + ttl + Duration::from_secs(1);
    assert_eq!(state.rosters_due(&teams, later, ttl), teams);
}

#[test]
fn failed_load_stops_the_matchup_spinner() {
    let mut state = AppState::new();
    state.open_matchup("ATL", "BOS");
    assert!(state.report_loading);
    apply_delta(&mut state, Delta::DataFailed("csv unreadable".to_string()));
    assert!(!state.report_loading);
    assert!(state.report.is_none());
}

#[test]
fn export_progress_is_tracked() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::ExportStarted {
            path: "matchup_atl_bos.xlsx".to_string(),
        },
    );
    assert!(state.export.active);

    apply_delta(
        &mut state,
        Delta::ExportFinished {
            path: "matchup_atl_bos.xlsx".to_string(),
            message: "5 dates".to_string(),
        },
    );
    assert!(!state.export.active);
    assert_eq!(state.export.message, "5 dates");
    assert_eq!(state.export.path.as_deref(), Some("matchup_atl_bos.xlsx"));
}
