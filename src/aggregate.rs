use std::collections::HashMap;

use crate::game_log::{CurrentTeamMap, PlayerHistory, Stat, StatLine};
use crate::matchup::MatchupWindow;

/// Roster status of a player on one window date. Exactly one holds per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Has a box-score row in the meeting.
    Played,
    /// No row while on the team the player is on now.
    Missing,
    /// No row, but the player belonged to another team at the time.
    NotApplicable,
}

impl Availability {
    pub fn marker(self) -> &'static str {
        match self {
            Availability::Played => "✅",
            Availability::Missing => "❌",
            Availability::NotApplicable => "➖",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Availability::Played => "played",
            Availability::Missing => "missing",
            Availability::NotApplicable => "n/a",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAggregate {
    pub player_id: u64,
    pub player_name: String,
    /// Current team, one of the two selected sides.
    pub team: String,
    pub games_played: usize,
    pub window_len: usize,
    /// Means over games actually played, not over the full date axis.
    pub means: StatLine,
    /// Summed line per window date, `None` for a meeting the player sat out.
    pub games: Vec<Option<StatLine>>,
    pub availability: Vec<Availability>,
}

impl PlayerAggregate {
    pub fn mean(&self, stat: Stat) -> f64 {
        self.means.get(stat)
    }

    /// Share of the window's meetings the player appeared in.
    pub fn attendance(&self) -> f64 {
        if self.window_len == 0 {
            0.0
        } else {
            self.games_played as f64 / self.window_len as f64
        }
    }

    /// Values of the games actually played, most recent first.
    pub fn values(&self, stat: Stat) -> Vec<f64> {
        self.games.iter().flatten().map(|line| line.get(stat)).collect()
    }

    pub fn count(&self, availability: Availability) -> usize {
        self.availability.iter().filter(|a| **a == availability).count()
    }
}

/// Rows of one player on one date. Two teams on the same date should not
/// happen; when it does, the team of the last row seen wins.
#[derive(Debug, Clone, Default)]
struct DateLines<'a> {
    by_team: Vec<(&'a str, StatLine)>,
    last_team: Option<&'a str>,
}

impl<'a> DateLines<'a> {
    fn push(&mut self, team: &'a str, line: &StatLine) {
        match self.by_team.iter_mut().find(|(t, _)| *t == team) {
            Some((_, sum)) => sum.add(line),
            None => self.by_team.push((team, *line)),
        }
        self.last_team = Some(team);
    }

    fn resolve(&self) -> Option<StatLine> {
        let team = self.last_team?;
        self.by_team
            .iter()
            .find(|(t, _)| *t == team)
            .map(|(_, line)| *line)
    }
}

pub fn aggregate_window(
    window: &MatchupWindow,
    current: &CurrentTeamMap,
    history: &PlayerHistory,
) -> Vec<PlayerAggregate> {
    if window.is_empty() {
        return Vec::new();
    }

    // Per player and date: the lines summed by team, plus the team of the last row seen.
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, (u64, Vec<DateLines>)> = HashMap::new();
    for r in window.matchup_rows() {
        let Some(slot) = window.date_index(r.game_date) else {
            continue;
        };
        let entry = grouped.entry(r.player_name.as_str()).or_insert_with(|| {
            order.push(r.player_name.as_str());
            (r.player_id, vec![DateLines::default(); window.len()])
        });
        entry.1[slot].push(&r.team, &r.stat_line());
    }

    let mut out: Vec<PlayerAggregate> = Vec::new();
    for name in order {
        let Some(team) = current.team_of(name) else {
            continue;
        };
        if !window.involves(team) {
            continue;
        }
        let Some((player_id, per_date)) = grouped.remove(name) else {
            continue;
        };
        let games: Vec<Option<StatLine>> = per_date.iter().map(DateLines::resolve).collect();

        let games_played = games.iter().filter(|g| g.is_some()).count();
        let mut sum = StatLine::default();
        for line in games.iter().flatten() {
            sum.add(line);
        }
        let means = if games_played == 0 {
            StatLine::default()
        } else {
            sum.scaled(1.0 / games_played as f64)
        };

        let availability = window
            .dates
            .iter()
            .zip(games.iter())
            .map(|(date, game)| {
                if game.is_some() {
                    return Availability::Played;
                }
                match history.team_as_of(name, *date) {
                    Some(then) if then == team => Availability::Missing,
                    _ => Availability::NotApplicable,
                }
            })
            .collect();

        out.push(PlayerAggregate {
            player_id,
            player_name: name.to_string(),
            team: team.to_string(),
            games_played,
            window_len: window.len(),
            means,
            games,
            availability,
        });
    }

    // Side A first, then side B; within a side by scoring, ties keep feed order.
    out.sort_by(|a, b| {
        let side = |p: &PlayerAggregate| if p.team == window.team_a { 0 } else { 1 };
        side(a)
            .cmp(&side(b))
            .then(b.means.pts.total_cmp(&a.means.pts))
    });
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::game_log::{GameLogRecord, GameLogTable, WinLoss};
    use crate::matchup::select_matchup_window;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn row(name: &str, team: &str, date: NaiveDate, opp: &str, pts: f64) -> GameLogRecord {
        GameLogRecord {
            player_id: name.len() as u64,
            player_name: name.to_string(),
            team: team.to_string(),
            game_date: date,
            matchup: format!("{team} vs. {opp}"),
            pts,
            reb: 4.0,
            ast: 3.0,
            minutes: 28.0,
            wl: Some(WinLoss::Win),
            game_id: None,
        }
    }

    fn run(records: Vec<GameLogRecord>) -> Vec<PlayerAggregate> {
        let table = GameLogTable::from_records(records);
        let window = select_matchup_window(&table, "LAL", "BOS", 5);
        aggregate_window(&window, &table.current_team_map(), &table.player_history())
    }

    #[test]
    fn means_use_played_games_only() {
        let aggs = run(vec![
            row("P", "LAL", day(1, 1), "BOS", 10.0),
            row("Q", "LAL", day(1, 1), "BOS", 8.0),
            row("Q", "LAL", day(2, 1), "BOS", 20.0),
            row("P", "LAL", day(3, 1), "BOS", 30.0),
            row("Q", "LAL", day(3, 1), "BOS", 2.0),
        ]);
        let p = aggs.iter().find(|a| a.player_name == "P").unwrap();
        assert_eq!(p.games_played, 2);
        assert!((p.attendance() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(p.mean(Stat::Points), 20.0);
        assert_eq!(
            p.availability,
            vec![Availability::Played, Availability::Missing, Availability::Played]
        );
    }

    #[test]
    fn moved_away_player_is_not_applicable_before_the_move() {
        let aggs = run(vec![
            row("S", "LAL", day(1, 1), "BOS", 12.0),
            row("T", "NYK", day(1, 1), "MIA", 15.0),
            row("T", "LAL", day(2, 1), "BOS", 18.0),
            row("S", "LAL", day(2, 1), "BOS", 11.0),
        ]);
        let t = aggs.iter().find(|a| a.player_name == "T").unwrap();
        assert_eq!(t.team, "LAL");
        assert_eq!(t.availability, vec![Availability::Played, Availability::NotApplicable]);
        assert_eq!(t.games_played, 1);
    }

    #[test]
    fn traded_out_player_is_dropped() {
        let aggs = run(vec![
            row("X", "LAL", day(1, 1), "BOS", 12.0),
            row("X", "NYK", day(2, 1), "MIA", 15.0),
        ]);
        assert!(aggs.is_empty());
    }

    #[test]
    fn switched_sides_listed_once_under_current_team() {
        let aggs = run(vec![
            row("W", "LAL", day(1, 1), "BOS", 10.0),
            row("W", "BOS", day(2, 1), "LAL", 14.0),
        ]);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].team, "BOS");
        assert_eq!(aggs[0].games_played, 2);
        assert_eq!(aggs[0].mean(Stat::Points), 12.0);
    }

    #[test]
    fn same_date_under_two_teams_keeps_the_last_row() {
        let aggs = run(vec![
            row("W", "LAL", day(1, 1), "BOS", 20.0),
            row("W", "BOS", day(1, 1), "LAL", 10.0),
        ]);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].team, "BOS");
        assert_eq!(aggs[0].games_played, 1);
        assert_eq!(aggs[0].mean(Stat::Points), 10.0);
    }

    #[test]
    fn duplicate_rows_for_one_team_are_summed() {
        let aggs = run(vec![
            row("D", "LAL", day(1, 1), "BOS", 6.0),
            row("D", "LAL", day(1, 1), "BOS", 5.0),
        ]);
        assert_eq!(aggs[0].games_played, 1);
        assert_eq!(aggs[0].mean(Stat::Points), 11.0);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let records = vec![
            row("P", "LAL", day(1, 1), "BOS", 10.0),
            row("R", "BOS", day(1, 1), "LAL", 7.0),
            row("P", "LAL", day(2, 1), "BOS", 17.0),
        ];
        assert_eq!(run(records.clone()), run(records));
    }
}
