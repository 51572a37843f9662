use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::game_log::Stat;
use crate::report::MatchupReport;
use crate::schedule::{AgendaDay, AgendaGame};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Agenda,
    Matchup { team_a: String, team_b: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStatus {
    Unknown,
    Loading,
    Ready { rows: usize, latest: Option<NaiveDate> },
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ExportState {
    pub active: bool,
    pub path: Option<String>,
    pub message: String,
}

/// Jersey numbers for one team and when they arrived. A failed fetch is an
/// empty map that still expires.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub jerseys: HashMap<String, String>,
    pub fetched_at: Instant,
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub agenda: Vec<AgendaDay>,
    pub agenda_loading: bool,
    pub selected: usize,
    pub report: Option<MatchupReport>,
    pub report_loading: bool,
    pub stat_tab: Stat,
    pub player_scroll: u16,
    pub rosters: HashMap<String, RosterEntry>,
    pub data: DataStatus,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Agenda,
            agenda: Vec::new(),
            agenda_loading: false,
            selected: 0,
            report: None,
            report_loading: false,
            stat_tab: Stat::Points,
            player_scroll: 0,
            rosters: HashMap::new(),
            data: DataStatus::Unknown,
            logs: VecDeque::new(),
            help_overlay: false,
            export: ExportState::default(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Agenda games in display order, paired with their day label.
    pub fn agenda_games(&self) -> Vec<(&str, &AgendaGame)> {
        self.agenda
            .iter()
            .flat_map(|day| day.games.iter().map(move |g| (day.label.as_str(), g)))
            .collect()
    }

    pub fn selected_game(&self) -> Option<&AgendaGame> {
        self.agenda_games().get(self.selected).map(|(_, g)| *g)
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Agenda => {
                let len = self.agenda_games().len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
            }
            Screen::Matchup { .. } => self.player_scroll = self.player_scroll.saturating_add(1),
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Agenda => self.selected = self.selected.saturating_sub(1),
            Screen::Matchup { .. } => self.player_scroll = self.player_scroll.saturating_sub(1),
        }
    }

    pub fn clamp_selection(&mut self) {
        let len = self.agenda_games().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn cycle_stat_tab(&mut self) {
        let idx = Stat::ALL
            .iter()
            .position(|s| *s == self.stat_tab)
            .unwrap_or(0);
        self.stat_tab = Stat::ALL[(idx + 1) % Stat::ALL.len()];
    }

    /// Open the matchup screen. The visitor is shown as the first team.
    pub fn open_matchup(&mut self, team_a: &str, team_b: &str) {
        self.screen = Screen::Matchup {
            team_a: team_a.to_string(),
            team_b: team_b.to_string(),
        };
        self.report = None;
        self.report_loading = true;
        self.player_scroll = 0;
    }

    pub fn back_to_agenda(&mut self) {
        self.screen = Screen::Agenda;
        self.report_loading = false;
    }

    pub fn jersey(&self, team: &str, player: &str) -> Option<&str> {
        self.rosters
            .get(team)
            .and_then(|entry| entry.jerseys.get(player))
            .map(String::as_str)
    }

    /// Teams whose roster was never fetched or is older than `ttl` at `now`.
    pub fn rosters_due(&self, teams: &[String], now: Instant, ttl: Duration) -> Vec<String> {
        teams
            .iter()
            .filter(|team| {
                self.rosters
                    .get(team.as_str())
                    .is_none_or(|entry| now.saturating_duration_since(entry.fetched_at) >= ttl)
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetAgenda(Vec<AgendaDay>),
    AgendaFailed(String),
    SetReport(Box<MatchupReport>),
    SetRoster {
        team: String,
        jerseys: HashMap<String, String>,
    },
    DataLoading,
    DataLoaded {
        rows: usize,
        latest: Option<NaiveDate>,
    },
    DataFailed(String),
    ExportStarted {
        path: String,
    },
    ExportFinished {
        path: String,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchAgenda,
    LoadMatchup { team_a: String, team_b: String },
    FetchRosters { teams: Vec<String> },
    RefreshData,
    ExportReport { path: String, team_a: String, team_b: String },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetAgenda(days) => {
            let games: usize = days.iter().map(|d| d.games.len()).sum();
            state.agenda = days;
            state.agenda_loading = false;
            state.clamp_selection();
            state.push_log(format!("[INFO] Agenda: {games} games"));
        }
        Delta::AgendaFailed(err) => {
            state.agenda_loading = false;
            state.push_log(format!("[WARN] Agenda unavailable: {err}"));
        }
        Delta::SetReport(report) => {
            // Drop answers for a matchup the user already left.
            let wanted = matches!(
                &state.screen,
                Screen::Matchup { team_a, team_b }
                    if *team_a == report.team_a && *team_b == report.team_b
            );
            if !wanted {
                return;
            }
            state.report_loading = false;
            if report.is_empty() {
                state.push_log(format!(
                    "[INFO] No meetings between {} and {}",
                    report.team_a, report.team_b
                ));
            }
            state.report = Some(*report);
        }
        Delta::SetRoster { team, jerseys } => {
            state.rosters.insert(
                team,
                RosterEntry {
                    jerseys,
                    fetched_at: Instant::now(),
                },
            );
        }
        Delta::DataLoading => state.data = DataStatus::Loading,
        Delta::DataLoaded { rows, latest } => {
            state.data = DataStatus::Ready { rows, latest };
            state.push_log(format!("[INFO] Game log: {rows} rows"));
        }
        Delta::DataFailed(err) => {
            // A failed load ends any pending matchup request.
            state.report_loading = false;
            state.push_log(format!("[WARN] Data load failed: {err}"));
            state.data = DataStatus::Failed(err);
        }
        Delta::ExportStarted { path } => {
            state.export = ExportState {
                active: true,
                path: Some(path),
                message: "Exporting".to_string(),
            };
        }
        Delta::ExportFinished { path, message } => {
            state.push_log(format!("[INFO] Export {path}: {message}"));
            state.export = ExportState {
                active: false,
                path: Some(path),
                message,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(label: &str, n: usize) -> AgendaDay {
        AgendaDay {
            date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            label: label.to_string(),
            games: (0..n)
                .map(|i| AgendaGame {
                    game_id: format!("g{i}"),
                    visitor: "LAL".to_string(),
                    home: "BOS".to_string(),
                    visitor_logo: String::new(),
                    home_logo: String::new(),
                    time: "01:30".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn log_is_bounded() {
        let mut state = AppState::new();
        for i in 0..250 {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.logs.len(), 200);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
    }

    #[test]
    fn agenda_selection_spans_days_and_clamps() {
        let mut state = AppState::new();
        apply_delta(&mut state, Delta::SetAgenda(vec![day("21/01", 2), day("22/01", 1)]));
        for _ in 0..10 {
            state.select_next();
        }
        assert_eq!(state.selected, 2);
        apply_delta(&mut state, Delta::SetAgenda(vec![day("21/01", 1)]));
        assert_eq!(state.selected, 0);
        assert_eq!(state.selected_game().map(|g| g.game_id.as_str()), Some("g0"));
    }

    #[test]
    fn stale_reports_are_ignored() {
        let mut state = AppState::new();
        state.open_matchup("LAL", "BOS");
        let table = crate::game_log::GameLogTable::default();
        let cfg = crate::config::AnalyzerConfig::default();
        let stale = crate::report::compute_matchup_report(&table, "NYK", "MIA", &cfg);
        apply_delta(&mut state, Delta::SetReport(Box::new(stale)));
        assert!(state.report.is_none());
        let fresh = crate::report::compute_matchup_report(&table, "LAL", "BOS", &cfg);
        apply_delta(&mut state, Delta::SetReport(Box::new(fresh)));
        assert!(state.report.as_ref().is_some_and(MatchupReport::is_empty));
        assert!(!state.report_loading);
    }

    #[test]
    fn stat_tab_cycles_through_all_stats() {
        let mut state = AppState::new();
        for _ in 0..Stat::ALL.len() {
            state.cycle_stat_tab();
        }
        assert_eq!(state.stat_tab, Stat::Points);
    }
}
