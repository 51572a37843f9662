use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::game_log::{GameLogRecord, GameLogTable, RawTable, WinLoss, parse_game_date};

#[derive(Debug, Clone)]
pub struct RefreshRun {
    pub run_id: i64,
    pub refreshed_at: String,
    pub source: String,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct ReplaceSummary {
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub rows: usize,
    pub players: usize,
    pub latest_date: Option<String>,
}

/// Load the canonical CSV. A missing file is an empty table, not an error.
pub fn load_csv(path: &Path) -> Result<GameLogTable> {
    if !path.exists() {
        warn!(path = %path.display(), "game log csv not found, starting empty");
        return Ok(GameLogTable::default());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let table = read_csv(file).with_context(|| format!("load {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), "game log csv loaded");
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R) -> Result<GameLogTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .headers()
        .context("read csv header")?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.context("read csv row")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    let table = GameLogTable::from_raw(&RawTable::new(headers, rows))?;
    Ok(table)
}

pub fn write_csv<W: Write>(writer: W, table: &GameLogTable) -> Result<()> {
    let raw = table.to_raw();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&raw.headers).context("write csv header")?;
    for row in &raw.rows {
        wtr.write_record(row).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

/// Whole-file replacement through a temp file so readers never see a partial table.
pub fn save_csv(path: &Path, table: &GameLogTable) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        write_csv(file, table)?;
    }
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS game_logs (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            team TEXT NOT NULL,
            game_date TEXT NOT NULL,
            matchup TEXT NOT NULL,
            pts REAL NOT NULL,
            reb REAL NOT NULL,
            ast REAL NOT NULL,
            min REAL NOT NULL,
            wl TEXT NULL,
            game_id TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_game_logs_date ON game_logs(game_date);
        CREATE INDEX IF NOT EXISTS idx_game_logs_team ON game_logs(team);

        CREATE TABLE IF NOT EXISTS refresh_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            refreshed_at TEXT NOT NULL,
            source TEXT NOT NULL,
            rows INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Delete-all plus insert-all in one transaction: last write wins, never a mix.
pub fn replace_game_logs(conn: &mut Connection, table: &GameLogTable, source: &str) -> Result<i64> {
    let tx = conn.transaction().context("begin replace transaction")?;
    tx.execute("DELETE FROM game_logs", [])
        .context("clear game logs")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO game_logs (
                    player_id, player_name, team, game_date, matchup,
                    pts, reb, ast, min, wl, game_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .context("prepare game log insert")?;
        for r in table.records() {
            stmt.execute(params![
                r.player_id as i64,
                r.player_name,
                r.team,
                r.game_date.format("%Y-%m-%d").to_string(),
                r.matchup,
                r.pts,
                r.reb,
                r.ast,
                r.minutes,
                r.wl.map(|w| w.as_str()),
                r.game_id,
            ])
            .context("insert game log")?;
        }
    }
    tx.execute(
        "INSERT INTO refresh_runs(refreshed_at, source, rows) VALUES (?1, ?2, ?3)",
        params![Utc::now().to_rfc3339(), source, table.len() as i64],
    )
    .context("insert refresh run")?;
    let run_id = tx.last_insert_rowid();
    tx.commit().context("commit replace transaction")?;
    Ok(run_id)
}

pub fn load_game_logs(conn: &Connection) -> Result<GameLogTable> {
    let mut stmt = conn
        .prepare(
            "SELECT player_id, player_name, team, game_date, matchup,
                    pts, reb, ast, min, wl, game_id
             FROM game_logs
             ORDER BY row_id ASC",
        )
        .context("prepare load game logs query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, f64>(7)?,
                row.get::<_, f64>(8)?,
                row.get::<_, Option<String>>(9)?,
                row.get::<_, Option<String>>(10)?,
            ))
        })
        .context("query game logs")?;

    let mut records = Vec::new();
    for row in rows {
        let (player_id, player_name, team, date, matchup, pts, reb, ast, minutes, wl, game_id) =
            row.context("decode game log row")?;
        let game_date =
            parse_game_date(&date).ok_or_else(|| anyhow!("stored game_date {date:?} is invalid"))?;
        records.push(GameLogRecord {
            player_id: u64::try_from(player_id).context("negative player id")?,
            player_name,
            team,
            game_date,
            matchup,
            pts,
            reb,
            ast,
            minutes,
            wl: wl.as_deref().and_then(WinLoss::parse),
            game_id,
        });
    }
    Ok(GameLogTable::from_records(records))
}

pub fn last_refresh(conn: &Connection) -> Result<Option<RefreshRun>> {
    let mut stmt = conn
        .prepare(
            "SELECT run_id, refreshed_at, source, rows FROM refresh_runs
             ORDER BY run_id DESC LIMIT 1",
        )
        .context("prepare last refresh query")?;
    let mut rows = stmt
        .query_map([], |row| {
            Ok(RefreshRun {
                run_id: row.get(0)?,
                refreshed_at: row.get(1)?,
                source: row.get(2)?,
                rows: row.get::<_, i64>(3)?.max(0) as usize,
            })
        })
        .context("query last refresh")?;
    match rows.next() {
        Some(run) => Ok(Some(run.context("decode refresh run")?)),
        None => Ok(None),
    }
}

/// Replace both the CSV and the SQLite mirror with `table`.
pub fn replace_canonical(cfg: &AppConfig, table: &GameLogTable, source: &str) -> Result<ReplaceSummary> {
    save_csv(&cfg.csv_path, table)?;
    let mut conn = open_db(&cfg.db_path)?;
    let run_id = replace_game_logs(&mut conn, table, source)?;
    let players = table.current_team_map().len();
    info!(
        run_id,
        rows = table.len(),
        players,
        csv = %cfg.csv_path.display(),
        "canonical game log replaced"
    );
    Ok(ReplaceSummary {
        csv_path: cfg.csv_path.clone(),
        db_path: cfg.db_path.clone(),
        rows: table.len(),
        players,
        latest_date: table.latest_date().map(|d| d.format("%Y-%m-%d").to_string()),
    })
}
