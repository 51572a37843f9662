use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

pub const COL_PLAYER_ID: &str = "player_id";
pub const COL_PLAYER_NAME: &str = "player_name";
pub const COL_TEAM: &str = "team_abbreviation";
pub const COL_GAME_DATE: &str = "game_date";
pub const COL_MATCHUP: &str = "matchup";
pub const COL_PTS: &str = "pts";
pub const COL_REB: &str = "reb";
pub const COL_AST: &str = "ast";
pub const COL_MIN: &str = "min";
pub const COL_WL: &str = "wl";
pub const COL_GAME_ID: &str = "game_id";

/// Column order used when the canonical table is written back out.
pub const CANONICAL_COLUMNS: [&str; 11] = [
    COL_PLAYER_ID,
    COL_PLAYER_NAME,
    COL_TEAM,
    COL_GAME_DATE,
    COL_MATCHUP,
    COL_PTS,
    COL_REB,
    COL_AST,
    COL_MIN,
    COL_WL,
    COL_GAME_ID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Points,
    Rebounds,
    Assists,
    Minutes,
}

impl Stat {
    /// Categories that can be turned into betting legs.
    pub const BETTING: [Stat; 3] = [Stat::Points, Stat::Rebounds, Stat::Assists];
    pub const ALL: [Stat; 4] = [Stat::Points, Stat::Rebounds, Stat::Assists, Stat::Minutes];

    pub fn label(self) -> &'static str {
        match self {
            Stat::Points => "PTS",
            Stat::Rebounds => "REB",
            Stat::Assists => "AST",
            Stat::Minutes => "MIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinLoss {
    Win,
    Loss,
}

impl WinLoss {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "W" => Some(WinLoss::Win),
            "L" => Some(WinLoss::Loss),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WinLoss::Win => "W",
            WinLoss::Loss => "L",
        }
    }
}

/// One player's box-score line for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogRecord {
    pub player_id: u64,
    pub player_name: String,
    pub team: String,
    pub game_date: NaiveDate,
    pub matchup: String,
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
    pub minutes: f64,
    pub wl: Option<WinLoss>,
    pub game_id: Option<String>,
}

impl GameLogRecord {
    pub fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Points => self.pts,
            Stat::Rebounds => self.reb,
            Stat::Assists => self.ast,
            Stat::Minutes => self.minutes,
        }
    }

    pub fn stat_line(&self) -> StatLine {
        StatLine {
            pts: self.pts,
            reb: self.reb,
            ast: self.ast,
            minutes: self.minutes,
        }
    }

    /// True when the matchup string ("LAL vs. BOS", "LAL @ BOS") names `opponent`.
    pub fn faces(&self, opponent: &str) -> bool {
        self.matchup.split_whitespace().any(|tok| {
            tok.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .eq_ignore_ascii_case(opponent)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatLine {
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
    pub minutes: f64,
}

impl StatLine {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Points => self.pts,
            Stat::Rebounds => self.reb,
            Stat::Assists => self.ast,
            Stat::Minutes => self.minutes,
        }
    }

    pub fn add(&mut self, other: &StatLine) {
        self.pts += other.pts;
        self.reb += other.reb;
        self.ast += other.ast;
        self.minutes += other.minutes;
    }

    pub fn scaled(&self, factor: f64) -> StatLine {
        StatLine {
            pts: self.pts * factor,
            reb: self.reb * factor,
            ast: self.ast * factor,
            minutes: self.minutes * factor,
        }
    }
}

/// Untyped feed table: lower-cased headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers
            .into_iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize, IngestError> {
        self.column_index(name)
            .ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
            })
    }
}

/// Canonical, validated game-log table. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct GameLogTable {
    records: Vec<GameLogRecord>,
}

impl GameLogTable {
    pub fn from_records(records: Vec<GameLogRecord>) -> Self {
        Self { records }
    }

    pub fn from_raw(raw: &RawTable) -> Result<Self, IngestError> {
        let cols = ColumnMap {
            player_id: raw.require(COL_PLAYER_ID)?,
            player_name: raw.require(COL_PLAYER_NAME)?,
            team: raw.require(COL_TEAM)?,
            game_date: raw.require(COL_GAME_DATE)?,
            matchup: raw.require(COL_MATCHUP)?,
            pts: raw.require(COL_PTS)?,
            reb: raw.require(COL_REB)?,
            ast: raw.require(COL_AST)?,
            min: raw.require(COL_MIN)?,
            wl: raw.require(COL_WL)?,
            game_id: raw.column_index(COL_GAME_ID),
        };
        let needed = cols.max_index() + 1;

        let mut records = Vec::with_capacity(raw.rows.len());
        for (idx, row) in raw.rows.iter().enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            if row.len() < needed {
                return Err(IngestError::ShortRow {
                    row: idx,
                    expected: needed,
                    found: row.len(),
                });
            }
            records.push(parse_record(idx, row, &cols)?);
        }
        Ok(Self { records })
    }

    pub fn to_raw(&self) -> RawTable {
        let headers = CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let rows = self
            .records
            .iter()
            .map(|r| {
                vec![
                    r.player_id.to_string(),
                    r.player_name.clone(),
                    r.team.clone(),
                    r.game_date.format("%Y-%m-%d").to_string(),
                    r.matchup.clone(),
                    format_number(r.pts),
                    format_number(r.reb),
                    format_number(r.ast),
                    format_number(r.minutes),
                    r.wl.map(|w| w.as_str().to_string()).unwrap_or_default(),
                    r.game_id.clone().unwrap_or_default(),
                ]
            })
            .collect();
        RawTable::new(headers, rows)
    }

    pub fn records(&self) -> &[GameLogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.game_date).max()
    }

    pub fn current_team_map(&self) -> CurrentTeamMap {
        CurrentTeamMap::build(&self.records)
    }

    pub fn player_history(&self) -> PlayerHistory {
        PlayerHistory::build(&self.records)
    }

    /// Full-table mean stat line per player name.
    pub fn season_means(&self) -> HashMap<String, StatLine> {
        let mut sums: HashMap<&str, (StatLine, usize)> = HashMap::new();
        for r in &self.records {
            let entry = sums.entry(r.player_name.as_str()).or_default();
            entry.0.add(&r.stat_line());
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(name, (sum, n))| (name.to_string(), sum.scaled(1.0 / n as f64)))
            .collect()
    }
}

/// Player name -> team of that player's most recent row across the whole table.
#[derive(Debug, Clone, Default)]
pub struct CurrentTeamMap {
    teams: HashMap<String, (NaiveDate, String)>,
}

impl CurrentTeamMap {
    pub fn build(records: &[GameLogRecord]) -> Self {
        let mut teams: HashMap<String, (NaiveDate, String)> = HashMap::new();
        for r in records {
            match teams.get_mut(&r.player_name) {
                // Same-date rows under two teams: the last one seen wins.
                Some(slot) if r.game_date >= slot.0 => {
                    *slot = (r.game_date, r.team.clone());
                }
                Some(_) => {}
                None => {
                    teams.insert(r.player_name.clone(), (r.game_date, r.team.clone()));
                }
            }
        }
        Self { teams }
    }

    pub fn team_of(&self, player: &str) -> Option<&str> {
        self.teams.get(player).map(|(_, team)| team.as_str())
    }

    pub fn is_on(&self, player: &str, team: &str) -> bool {
        self.team_of(player) == Some(team)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// Per-player chronological (date, team) list used to answer "which team was this player on then".
#[derive(Debug, Clone, Default)]
pub struct PlayerHistory {
    stints: HashMap<String, Vec<(NaiveDate, String)>>,
}

impl PlayerHistory {
    pub fn build(records: &[GameLogRecord]) -> Self {
        let mut stints: HashMap<String, Vec<(NaiveDate, String)>> = HashMap::new();
        for r in records {
            stints
                .entry(r.player_name.clone())
                .or_default()
                .push((r.game_date, r.team.clone()));
        }
        for list in stints.values_mut() {
            list.sort_by_key(|(date, _)| *date);
        }
        Self { stints }
    }

    /// Team of the latest row on or before `date`; falls back to the earliest later row.
    pub fn team_as_of(&self, player: &str, date: NaiveDate) -> Option<&str> {
        let list = self.stints.get(player)?;
        let upto = list.partition_point(|(d, _)| *d <= date);
        if upto > 0 {
            Some(list[upto - 1].1.as_str())
        } else {
            list.first().map(|(_, team)| team.as_str())
        }
    }
}

struct ColumnMap {
    player_id: usize,
    player_name: usize,
    team: usize,
    game_date: usize,
    matchup: usize,
    pts: usize,
    reb: usize,
    ast: usize,
    min: usize,
    wl: usize,
    game_id: Option<usize>,
}

impl ColumnMap {
    fn max_index(&self) -> usize {
        [
            self.player_id,
            self.player_name,
            self.team,
            self.game_date,
            self.matchup,
            self.pts,
            self.reb,
            self.ast,
            self.min,
            self.wl,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

fn parse_record(idx: usize, row: &[String], cols: &ColumnMap) -> Result<GameLogRecord, IngestError> {
    let invalid = |column: &str, value: &str| IngestError::InvalidValue {
        row: idx,
        column: column.to_string(),
        value: value.to_string(),
    };

    let raw_id = row[cols.player_id].trim();
    let player_id = parse_id(raw_id).ok_or_else(|| invalid(COL_PLAYER_ID, raw_id))?;

    let player_name = row[cols.player_name].trim().to_string();
    if player_name.is_empty() {
        return Err(invalid(COL_PLAYER_NAME, ""));
    }
    let team = row[cols.team].trim().to_ascii_uppercase();
    if team.is_empty() {
        return Err(invalid(COL_TEAM, ""));
    }

    let raw_date = row[cols.game_date].trim();
    let game_date = parse_game_date(raw_date).ok_or_else(|| invalid(COL_GAME_DATE, raw_date))?;

    let number = |col: usize, name: &str| -> Result<f64, IngestError> {
        let cell = row[col].trim();
        parse_number(cell).ok_or_else(|| invalid(name, cell))
    };
    let pts = number(cols.pts, COL_PTS)?;
    let reb = number(cols.reb, COL_REB)?;
    let ast = number(cols.ast, COL_AST)?;

    let raw_min = row[cols.min].trim();
    let minutes = parse_minutes(raw_min).ok_or_else(|| invalid(COL_MIN, raw_min))?;

    let game_id = cols
        .game_id
        .and_then(|col| row.get(col))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(normalize_game_id);

    Ok(GameLogRecord {
        player_id,
        player_name,
        team,
        game_date,
        matchup: row[cols.matchup].trim().to_string(),
        pts,
        reb,
        ast,
        minutes,
        wl: WinLoss::parse(&row[cols.wl]),
        game_id,
    })
}

fn parse_id(raw: &str) -> Option<u64> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }
    // CSVs round-tripped through float columns write "2544.0".
    let f = raw.parse::<f64>().ok()?;
    if f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Some(prefix) = s.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return Some(date);
    }
    NaiveDate::parse_from_str(s, "%b %d, %Y").ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    let v = raw.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_minutes(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }
    if let Some((mins, secs)) = raw.split_once(':') {
        let mins = mins.trim().parse::<f64>().ok()?;
        let secs = secs.trim().parse::<f64>().ok()?;
        return Some(mins + secs / 60.0);
    }
    parse_number(raw)
}

/// Game ids are 10-digit zero-padded strings; numeric CSV columns drop the padding.
fn normalize_game_id(raw: &str) -> String {
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    if digits.chars().all(|c| c.is_ascii_digit()) && digits.len() < 10 {
        format!("{digits:0>10}")
    } else {
        digits.to_string()
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
