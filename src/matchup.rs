use std::collections::HashSet;

use chrono::NaiveDate;

use crate::game_log::{GameLogRecord, GameLogTable, WinLoss};

/// Representative box-score row for one meeting date.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowGame {
    pub date: NaiveDate,
    pub team: String,
    pub matchup: String,
    pub wl: Option<WinLoss>,
    pub game_id: Option<String>,
}

impl WindowGame {
    /// Result from `team`'s point of view; flips the representative row when needed.
    pub fn result_for(&self, team: &str) -> Option<WinLoss> {
        let wl = self.wl?;
        if self.team == team {
            Some(wl)
        } else {
            Some(match wl {
                WinLoss::Win => WinLoss::Loss,
                WinLoss::Loss => WinLoss::Win,
            })
        }
    }
}

/// The last N distinct meeting dates between two teams plus every row either
/// roster logged on those dates.
#[derive(Debug, Clone, Default)]
pub struct MatchupWindow {
    pub team_a: String,
    pub team_b: String,
    /// Most recent first.
    pub dates: Vec<NaiveDate>,
    /// One entry per date, same order as `dates`.
    pub games: Vec<WindowGame>,
    pub rows: Vec<GameLogRecord>,
}

impl MatchupWindow {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn involves(&self, team: &str) -> bool {
        self.team_a == team || self.team_b == team
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    /// Rows logged for one of the two selected teams (the head-to-head box scores).
    pub fn matchup_rows(&self) -> impl Iterator<Item = &GameLogRecord> {
        self.rows.iter().filter(|r| self.involves(&r.team))
    }
}

pub fn select_matchup_window(
    table: &GameLogTable,
    team_a: &str,
    team_b: &str,
    window_size: usize,
) -> MatchupWindow {
    let team_a = team_a.trim().to_ascii_uppercase();
    let team_b = team_b.trim().to_ascii_uppercase();

    // A team never meets itself.
    if team_a == team_b {
        return MatchupWindow {
            team_a,
            team_b,
            ..MatchupWindow::default()
        };
    }

    let meetings: Vec<&GameLogRecord> = table
        .records()
        .iter()
        .filter(|r| (r.team == team_a && r.faces(&team_b)) || (r.team == team_b && r.faces(&team_a)))
        .collect();

    let mut dates: Vec<NaiveDate> = meetings.iter().map(|r| r.game_date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();
    dates.truncate(window_size);

    if dates.is_empty() {
        return MatchupWindow {
            team_a,
            team_b,
            ..MatchupWindow::default()
        };
    }

    let games = dates
        .iter()
        .filter_map(|date| meetings.iter().find(|r| r.game_date == *date))
        .map(|r| WindowGame {
            date: r.game_date,
            team: r.team.clone(),
            matchup: r.matchup.clone(),
            wl: r.wl,
            game_id: r.game_id.clone(),
        })
        .collect();

    let on_dates: HashSet<NaiveDate> = dates.iter().copied().collect();
    let current = table.current_team_map();
    let rows = table
        .records()
        .iter()
        .filter(|r| on_dates.contains(&r.game_date))
        .filter(|r| {
            let now = current.team_of(&r.player_name);
            r.team == team_a || r.team == team_b || now == Some(team_a.as_str()) || now == Some(team_b.as_str())
        })
        .cloned()
        .collect();

    MatchupWindow {
        team_a,
        team_b,
        dates,
        games,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, team: &str, date: (i32, u32, u32), matchup: &str) -> GameLogRecord {
        GameLogRecord {
            player_id: 1,
            player_name: name.to_string(),
            team: team.to_string(),
            game_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            matchup: matchup.to_string(),
            pts: 10.0,
            reb: 5.0,
            ast: 2.0,
            minutes: 30.0,
            wl: Some(WinLoss::Win),
            game_id: None,
        }
    }

    #[test]
    fn same_team_twice_has_no_meetings() {
        let records = vec![
            row("A", "LAL", (2025, 1, 10), "LAL vs. NYK"),
            row("A", "LAL", (2025, 1, 12), "LAL @ MIA"),
        ];
        let window = select_matchup_window(&GameLogTable::from_records(records), "LAL", "lal", 5);
        assert!(window.is_empty());
        assert!(window.rows.is_empty());
        assert_eq!(window.team_a, "LAL");
    }

    #[test]
    fn keeps_five_most_recent_distinct_dates() {
        let mut records = Vec::new();
        for day in 1..=7 {
            records.push(row("A", "LAL", (2025, 1, day), "LAL vs. BOS"));
            records.push(row("B", "BOS", (2025, 1, day), "BOS @ LAL"));
        }
        records.push(row("C", "NYK", (2025, 1, 8), "NYK vs. MIA"));
        let window = select_matchup_window(&GameLogTable::from_records(records), "lal", "bos", 5);
        assert_eq!(window.len(), 5);
        assert_eq!(window.dates[0], NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
        assert_eq!(window.dates[4], NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(window.rows.len(), 10);
        assert_eq!(window.games[0].result_for("BOS"), Some(WinLoss::Loss));
    }

    #[test]
    fn unrelated_rows_on_window_dates_stay_out() {
        let records = vec![
            row("A", "LAL", (2025, 1, 1), "LAL vs. BOS"),
            row("Z", "NYK", (2025, 1, 1), "NYK vs. MIA"),
        ];
        let window = select_matchup_window(&GameLogTable::from_records(records), "LAL", "BOS", 5);
        assert_eq!(window.rows.len(), 1);
    }

    #[test]
    fn traded_in_player_rows_follow_the_window() {
        let records = vec![
            row("A", "LAL", (2025, 1, 1), "LAL vs. BOS"),
            row("T", "NYK", (2025, 1, 1), "NYK vs. MIA"),
            row("T", "BOS", (2025, 2, 1), "BOS vs. MIA"),
        ];
        let window = select_matchup_window(&GameLogTable::from_records(records), "LAL", "BOS", 5);
        assert_eq!(window.rows.len(), 2);
        assert_eq!(window.matchup_rows().count(), 1);
    }

    #[test]
    fn no_meetings_gives_empty_window() {
        let records = vec![row("A", "LAL", (2025, 1, 1), "LAL vs. BOS")];
        let window = select_matchup_window(&GameLogTable::from_records(records), "LAL", "NYK", 5);
        assert!(window.is_empty());
        assert!(window.rows.is_empty());
        assert!(window.games.is_empty());
    }
}
