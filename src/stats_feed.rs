use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::game_log::{GameLogTable, RawTable};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

const STATS_BASE_URL: &str = "https://stats.nba.com/stats";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardGame {
    pub game_id: String,
    pub home_team_id: u32,
    pub visitor_team_id: u32,
    /// "7:00 pm ET", "Final", "Q3 5:12", ...
    pub status_text: String,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", default)]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    name: String,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(rename = "rowSet", default)]
    row_set: Vec<Vec<Value>>,
}

impl ResultSet {
    fn into_raw(self) -> RawTable {
        let rows = self
            .row_set
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        RawTable::new(self.headers, rows)
    }
}

pub fn league_game_log_url(season: &str) -> String {
    format!(
        "{STATS_BASE_URL}/leaguegamelog?Counter=0&Direction=ASC&LeagueID=00&PlayerOrTeam=P\
         &Season={season}&SeasonType=Regular%20Season&Sorter=DATE"
    )
}

pub fn team_roster_url(team_id: u32, season: &str) -> String {
    format!("{STATS_BASE_URL}/commonteamroster?LeagueID=00&Season={season}&TeamID={team_id}")
}

pub fn scoreboard_url(date: &str) -> String {
    format!("{STATS_BASE_URL}/scoreboardv2?DayOffset=0&GameDate={date}&LeagueID=00")
}

/// Player game log for one season as an untyped table (headers lower-cased).
pub fn parse_league_game_log_json(raw: &str) -> Result<RawTable> {
    let Some(resp) = parse_stats_json(raw)? else {
        return Ok(RawTable::default());
    };
    Ok(take_result_set(resp, "LeagueGameLog")
        .map(ResultSet::into_raw)
        .unwrap_or_default())
}

/// Player name to jersey number. Float-typed numbers lose their ".0".
pub fn parse_team_roster_json(raw: &str) -> Result<HashMap<String, String>> {
    let Some(resp) = parse_stats_json(raw)? else {
        return Ok(HashMap::new());
    };
    let Some(set) = take_result_set(resp, "CommonTeamRoster") else {
        return Ok(HashMap::new());
    };
    let table = set.into_raw();
    let (Some(player_idx), Some(num_idx)) = (table.column_index("player"), table.column_index("num"))
    else {
        return Err(anyhow!("roster result set lacks PLAYER/NUM columns"));
    };

    let mut map = HashMap::new();
    for row in &table.rows {
        let (Some(player), Some(num)) = (row.get(player_idx), row.get(num_idx)) else {
            continue;
        };
        if player.trim().is_empty() {
            continue;
        }
        let num = num.trim();
        let num = num.strip_suffix(".0").unwrap_or(num);
        map.insert(player.trim().to_string(), num.to_string());
    }
    Ok(map)
}

pub fn parse_scoreboard_json(raw: &str) -> Result<Vec<ScoreboardGame>> {
    let Some(resp) = parse_stats_json(raw)? else {
        return Ok(Vec::new());
    };
    let Some(set) = take_result_set(resp, "GameHeader") else {
        return Ok(Vec::new());
    };
    let table = set.into_raw();
    let col = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| anyhow!("scoreboard lacks column {name}"))
    };
    let game_idx = col("game_id")?;
    let home_idx = col("home_team_id")?;
    let visitor_idx = col("visitor_team_id")?;
    let status_idx = col("game_status_text")?;

    let mut games = Vec::new();
    for row in &table.rows {
        let field = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or_default();
        let (Ok(home_team_id), Ok(visitor_team_id)) =
            (field(home_idx).parse::<u32>(), field(visitor_idx).parse::<u32>())
        else {
            continue;
        };
        // One game header row per game, but the feed repeats them on broadcast splits.
        let game_id = field(game_idx).to_string();
        if games.iter().any(|g: &ScoreboardGame| g.game_id == game_id) {
            continue;
        }
        games.push(ScoreboardGame {
            game_id,
            home_team_id,
            visitor_team_id,
            status_text: field(status_idx).to_string(),
        });
    }
    Ok(games)
}

/// Download every configured season in parallel and validate the union.
pub fn fetch_season_game_logs(cfg: &AppConfig) -> Result<GameLogTable> {
    let pool = build_fetch_pool(cfg.fetch_parallelism);
    let ttl = cfg.cache_ttl;
    let seasons = cfg.seasons.clone();
    let fetched: Vec<Result<RawTable>> = with_fetch_pool(&pool, || {
        seasons
            .par_iter()
            .map(|season| fetch_season_raw(season, ttl))
            .collect()
    });

    let mut parts = Vec::with_capacity(fetched.len());
    for (season, part) in cfg.seasons.iter().zip(fetched) {
        let part = part.with_context(|| format!("season {season}"))?;
        info!(season = %season, rows = part.rows.len(), "season game log fetched");
        parts.push(part);
    }
    let raw = concat_raw(parts);
    let table = GameLogTable::from_raw(&raw).context("validate downloaded game logs")?;
    Ok(table)
}

pub fn fetch_season_raw(season: &str, ttl: Duration) -> Result<RawTable> {
    let client = http_client()?;
    let body = fetch_json_cached(client, &league_game_log_url(season), ttl)?;
    parse_league_game_log_json(&body)
}

/// Roster jersey map; a failed fetch is logged and yields an empty map.
pub fn fetch_team_roster(team_id: u32, season: &str, ttl: Duration) -> HashMap<String, String> {
    let fetched = http_client()
        .and_then(|client| fetch_json_cached(client, &team_roster_url(team_id, season), ttl))
        .and_then(|body| parse_team_roster_json(&body));
    match fetched {
        Ok(map) => map,
        Err(err) => {
            warn!(team_id, error = %err, "roster fetch failed");
            HashMap::new()
        }
    }
}

pub fn fetch_scoreboard(date: &str, ttl: Duration) -> Result<Vec<ScoreboardGame>> {
    let client = http_client()?;
    let body = fetch_json_cached(client, &scoreboard_url(date), ttl)?;
    parse_scoreboard_json(&body)
}

/// Stack tables, aligning later tables to the first one's columns by name.
pub fn concat_raw(parts: Vec<RawTable>) -> RawTable {
    let mut parts = parts.into_iter().filter(|p| !p.headers.is_empty());
    let Some(mut out) = parts.next() else {
        return RawTable::default();
    };
    for part in parts {
        if part.headers == out.headers {
            out.rows.extend(part.rows);
            continue;
        }
        let mapping: Vec<Option<usize>> = out
            .headers
            .iter()
            .map(|h| part.column_index(h))
            .collect();
        for row in part.rows {
            out.rows.push(
                mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect(),
            );
        }
    }
    out
}

fn parse_stats_json(raw: &str) -> Result<Option<StatsResponse>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let resp = serde_json::from_str(trimmed).context("invalid stats json")?;
    Ok(Some(resp))
}

fn take_result_set(resp: StatsResponse, name: &str) -> Option<ResultSet> {
    let mut sets = resp.result_sets;
    let idx = sets
        .iter()
        .position(|s| s.name.eq_ignore_ascii_case(name))
        .or_else(|| (!sets.is_empty()).then_some(0))?;
    Some(sets.swap_remove(idx))
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_become_plain_strings() {
        assert_eq!(cell_to_string(&Value::Null), "");
        assert_eq!(cell_to_string(&serde_json::json!("LAL")), "LAL");
        assert_eq!(cell_to_string(&serde_json::json!(2544)), "2544");
        assert_eq!(cell_to_string(&serde_json::json!(12.5)), "12.5");
    }

    #[test]
    fn concat_aligns_reordered_columns() {
        let a = RawTable::new(
            vec!["A".into(), "B".into()],
            vec![vec!["1".into(), "2".into()]],
        );
        let b = RawTable::new(
            vec!["B".into(), "A".into(), "C".into()],
            vec![vec!["4".into(), "3".into(), "x".into()]],
        );
        let out = concat_raw(vec![RawTable::default(), a, b]);
        assert_eq!(out.headers, vec!["a", "b"]);
        assert_eq!(out.rows[1], vec!["3".to_string(), "4".to_string()]);
    }
}
