use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::{PlayerAggregate, aggregate_window};
use crate::config::AnalyzerConfig;
use crate::game_log::{GameLogTable, Stat, WinLoss};
use crate::legs::{LegBoard, classify_legs};
use crate::matchup::{MatchupWindow, select_matchup_window};
use crate::patterns::{ReplacementAlert, detect_replacements};
use crate::trend::{TrendSeries, build_trends};

const GAME_LINK_BASE: &str = "https://www.nba.com/game/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Ready,
    /// The two teams have no recorded meeting.
    NoData,
}

/// Column header for one meeting date.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowHeader {
    pub date: NaiveDate,
    pub label: String,
    pub matchup: String,
    /// From the first selected team's point of view.
    pub result: Option<WinLoss>,
    /// Absent when the feed carried no game id.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerReport {
    pub aggregate: PlayerAggregate,
    /// One series per `Stat::ALL` entry, already merged across both sides.
    pub trends: Vec<TrendSeries>,
}

impl PlayerReport {
    pub fn trend(&self, stat: Stat) -> Option<&TrendSeries> {
        self.trends.iter().find(|t| t.stat == stat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupReport {
    pub team_a: String,
    pub team_b: String,
    pub dates: Vec<NaiveDate>,
    pub headers: Vec<WindowHeader>,
    pub players: Vec<PlayerReport>,
    pub alerts: Vec<ReplacementAlert>,
    pub legs: LegBoard,
}

impl MatchupReport {
    pub fn status(&self) -> ReportStatus {
        if self.dates.is_empty() {
            ReportStatus::NoData
        } else {
            ReportStatus::Ready
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status() == ReportStatus::NoData
    }

    pub fn players_for<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a PlayerReport> + 'a {
        self.players.iter().filter(move |p| p.aggregate.team == team)
    }

    pub fn player(&self, name: &str) -> Option<&PlayerReport> {
        self.players.iter().find(|p| p.aggregate.player_name == name)
    }

    /// "3-2" record for the first selected team across the window.
    pub fn series_record(&self) -> (usize, usize) {
        let wins = self
            .headers
            .iter()
            .filter(|h| h.result == Some(WinLoss::Win))
            .count();
        let losses = self
            .headers
            .iter()
            .filter(|h| h.result == Some(WinLoss::Loss))
            .count();
        (wins, losses)
    }
}

/// Run every stage for one team pair. Pure: the table is only read.
pub fn compute_matchup_report(
    table: &GameLogTable,
    team_a: &str,
    team_b: &str,
    cfg: &AnalyzerConfig,
) -> MatchupReport {
    let window = select_matchup_window(table, team_a, team_b, cfg.window_size);
    if window.is_empty() {
        debug!(team_a, team_b, "no meetings in table");
        return empty_report(&window);
    }

    let current = table.current_team_map();
    let history = table.player_history();
    let season_means = table.season_means();

    let aggregates = aggregate_window(&window, &current, &history);
    let trend_tables: Vec<_> = Stat::ALL
        .into_iter()
        .map(|stat| build_trends(&window.dates, &window.rows, stat))
        .collect();
    let sides = [window.team_a.as_str(), window.team_b.as_str()];

    let players = aggregates
        .iter()
        .map(|agg| PlayerReport {
            aggregate: agg.clone(),
            trends: trend_tables
                .iter()
                .map(|t| t.for_player(&agg.player_name, &sides, &agg.team))
                .collect(),
        })
        .collect::<Vec<_>>();

    let alerts = detect_replacements(&window, &current, &history, &season_means, &cfg.patterns);
    let legs = classify_legs(&aggregates, window.len(), &cfg.legs);

    debug!(
        team_a = %window.team_a,
        team_b = %window.team_b,
        dates = window.len(),
        players = players.len(),
        alerts = alerts.len(),
        legs = legs.total(),
        "matchup report computed"
    );

    MatchupReport {
        team_a: window.team_a.clone(),
        team_b: window.team_b.clone(),
        dates: window.dates.clone(),
        headers: headers(&window),
        players,
        alerts,
        legs,
    }
}

pub fn game_link(game_id: Option<&str>) -> Option<String> {
    let id = game_id?.trim();
    if id.is_empty() {
        return None;
    }
    Some(format!("{GAME_LINK_BASE}{id}"))
}

fn headers(window: &MatchupWindow) -> Vec<WindowHeader> {
    window
        .games
        .iter()
        .map(|g| WindowHeader {
            date: g.date,
            label: g.date.format("%d/%m/%y").to_string(),
            matchup: g.matchup.clone(),
            result: g.result_for(&window.team_a),
            link: game_link(g.game_id.as_deref()),
        })
        .collect()
}

fn empty_report(window: &MatchupWindow) -> MatchupReport {
    MatchupReport {
        team_a: window.team_a.clone(),
        team_b: window.team_b.clone(),
        dates: Vec::new(),
        headers: Vec::new(),
        players: Vec::new(),
        alerts: Vec::new(),
        legs: LegBoard::empty(),
    }
}

/// Colour band of a displayed value against a reference mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueBand {
    Above,
    Near,
    Below,
}

impl ValueBand {
    pub fn classify(value: f64, reference: f64, stat: Stat) -> Self {
        if value > reference {
            ValueBand::Above
        } else if value >= reference - band_tolerance(stat) {
            ValueBand::Near
        } else {
            ValueBand::Below
        }
    }
}

pub fn band_tolerance(stat: Stat) -> f64 {
    match stat {
        Stat::Rebounds | Stat::Assists => 2.0,
        Stat::Points | Stat::Minutes => 4.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_use_per_stat_tolerance() {
        assert_eq!(ValueBand::classify(21.0, 20.0, Stat::Points), ValueBand::Above);
        assert_eq!(ValueBand::classify(16.0, 20.0, Stat::Points), ValueBand::Near);
        assert_eq!(ValueBand::classify(15.9, 20.0, Stat::Points), ValueBand::Below);
        assert_eq!(ValueBand::classify(5.0, 8.0, Stat::Rebounds), ValueBand::Below);
        assert_eq!(ValueBand::classify(8.0, 8.0, Stat::Assists), ValueBand::Near);
    }

    #[test]
    fn link_needs_a_game_id() {
        assert_eq!(
            game_link(Some("0022400512")).as_deref(),
            Some("https://www.nba.com/game/0022400512")
        );
        assert_eq!(game_link(Some("  ")), None);
        assert_eq!(game_link(None), None);
    }
}
