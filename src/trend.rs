use std::collections::HashMap;

use chrono::NaiveDate;

use crate::game_log::{GameLogRecord, Stat};

/// Rendered in place of a number when the player has no row for that date.
pub const ABSENT_MARKER: &str = "❌";
pub const SLOT_SEPARATOR: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendSlot {
    Value(f64),
    Absent,
}

impl TrendSlot {
    pub fn value(&self) -> Option<f64> {
        match self {
            TrendSlot::Value(v) => Some(*v),
            TrendSlot::Absent => None,
        }
    }

    /// Integer display, truncating toward zero.
    pub fn display(&self) -> String {
        match self {
            TrendSlot::Value(v) => format!("{}", v.trunc() as i64),
            TrendSlot::Absent => ABSENT_MARKER.to_string(),
        }
    }
}

/// One slot per window date, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub player_name: String,
    pub team: String,
    pub stat: Stat,
    pub slots: Vec<TrendSlot>,
}

impl TrendSeries {
    pub fn render(&self) -> String {
        self.slots
            .iter()
            .map(TrendSlot::display)
            .collect::<Vec<_>>()
            .join(SLOT_SEPARATOR)
    }
}

/// Every (player, team) series for one stat, pivoted on a fixed date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendTable {
    pub stat: Stat,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<TrendSeries>,
    /// Position in the input of the last row behind each slot, parallel to `series`.
    last_seen: Vec<Vec<Option<usize>>>,
}

impl TrendTable {
    /// Merge a player's series across `teams`, labelled with `display_team`.
    /// Each slot comes from the team of the last row seen on that date.
    /// Always returns a full-length series, all absent if nothing matched.
    pub fn for_player(&self, player: &str, teams: &[&str], display_team: &str) -> TrendSeries {
        let mut slots = vec![TrendSlot::Absent; self.dates.len()];
        let mut seen: Vec<Option<usize>> = vec![None; self.dates.len()];
        for (series, last) in self.series.iter().zip(&self.last_seen) {
            if series.player_name != player || !teams.contains(&series.team.as_str()) {
                continue;
            }
            for (i, slot) in series.slots.iter().enumerate() {
                if last[i] > seen[i] {
                    seen[i] = last[i];
                    slots[i] = *slot;
                }
            }
        }
        TrendSeries {
            player_name: player.to_string(),
            team: display_team.to_string(),
            stat: self.stat,
            slots,
        }
    }
}

/// Pivot `rows` onto `dates` for `stat`. Duplicate rows for the same
/// (player, team, date) are summed; pairs keep first-seen order.
pub fn build_trends(dates: &[NaiveDate], rows: &[GameLogRecord], stat: Stat) -> TrendTable {
    let axis: HashMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut grid: HashMap<(&str, &str), Vec<Option<(f64, usize)>>> = HashMap::new();

    for (pos, r) in rows.iter().enumerate() {
        let Some(&slot) = axis.get(&r.game_date) else {
            continue;
        };
        let key = (r.player_name.as_str(), r.team.as_str());
        let cells = grid.entry(key).or_insert_with(|| {
            order.push(key);
            vec![None; dates.len()]
        });
        let sum = cells[slot].map_or(0.0, |(v, _)| v) + r.stat(stat);
        cells[slot] = Some((sum, pos));
    }

    let mut series = Vec::with_capacity(order.len());
    let mut last_seen = Vec::with_capacity(order.len());
    for key in order {
        let cells = grid.remove(&key).unwrap_or_default();
        last_seen.push(cells.iter().map(|c| c.map(|(_, pos)| pos)).collect());
        series.push(TrendSeries {
            player_name: key.0.to_string(),
            team: key.1.to_string(),
            stat,
            slots: cells
                .into_iter()
                .map(|c| c.map_or(TrendSlot::Absent, |(v, _)| TrendSlot::Value(v)))
                .collect(),
        });
    }

    TrendTable {
        stat,
        dates: dates.to_vec(),
        series,
        last_seen,
    }
}
