use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::game_log::Stat;

pub const DEFAULT_WINDOW_SIZE: usize = 5;
pub const DEFAULT_SEASONS: [&str; 2] = ["2024-25", "2025-26"];
pub const DATA_DIR_NAME: &str = "nba_analyzer";

/// Per-category thresholds for the three betting stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryValues {
    pub pts: f64,
    pub reb: f64,
    pub ast: f64,
}

impl CategoryValues {
    pub const fn new(pts: f64, reb: f64, ast: f64) -> Self {
        Self { pts, reb, ast }
    }

    /// Minutes never carry a threshold; callers only pass betting categories.
    pub fn get(&self, stat: Stat) -> Option<f64> {
        match stat {
            Stat::Points => Some(self.pts),
            Stat::Rebounds => Some(self.reb),
            Stat::Assists => Some(self.ast),
            Stat::Minutes => None,
        }
    }
}

pub const STAR_MEAN: CategoryValues = CategoryValues::new(18.0, 7.0, 5.0);
pub const REPLACEMENT_FLOOR: CategoryValues = CategoryValues::new(15.0, 7.0, 5.0);
pub const REPLACEMENT_MARGIN: CategoryValues = CategoryValues::new(8.0, 4.0, 4.0);
pub const SAFE_FLOOR_MIN: CategoryValues = CategoryValues::new(12.0, 6.0, 4.0);
pub const RISKY_MEAN_MIN: CategoryValues = CategoryValues::new(15.0, 8.0, 6.0);
pub const RISKY_MARGIN: f64 = 1.0;
pub const MIN_GAMES_FLOOR: usize = 3;
pub const MIN_GAMES_FRACTION: f64 = 0.6;
pub const SMART_FLOOR_MIN_SAMPLES: usize = 4;
pub const POOL_CAP: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct PatternConfig {
    /// Strictly exceeded by a season mean to count as a star.
    pub star_mean: CategoryValues,
    pub replacement_floor: CategoryValues,
    pub replacement_margin: CategoryValues,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            star_mean: STAR_MEAN,
            replacement_floor: REPLACEMENT_FLOOR,
            replacement_margin: REPLACEMENT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegConfig {
    pub min_games_floor: usize,
    pub min_games_fraction: f64,
    pub smart_floor_min_samples: usize,
    pub safe_floor_min: CategoryValues,
    pub risky_mean_min: CategoryValues,
    pub risky_margin: f64,
    pub pool_cap: usize,
}

impl LegConfig {
    /// max(floor, fraction * window), fractional part dropped.
    pub fn min_games(&self, window_len: usize) -> usize {
        let by_fraction = (self.min_games_fraction * window_len as f64).floor() as usize;
        self.min_games_floor.max(by_fraction)
    }
}

impl Default for LegConfig {
    fn default() -> Self {
        Self {
            min_games_floor: MIN_GAMES_FLOOR,
            min_games_fraction: MIN_GAMES_FRACTION,
            smart_floor_min_samples: SMART_FLOOR_MIN_SAMPLES,
            safe_floor_min: SAFE_FLOOR_MIN,
            risky_mean_min: RISKY_MEAN_MIN,
            risky_margin: RISKY_MARGIN,
            pool_cap: POOL_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub window_size: usize,
    pub patterns: PatternConfig,
    pub legs: LegConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            patterns: PatternConfig::default(),
            legs: LegConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Demo,
}

/// Settings for the I/O layer and binaries. The analytical core never reads these.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub seasons: Vec<String>,
    pub cache_ttl: Duration,
    pub fetch_parallelism: usize,
    pub local_offset_hours: i64,
    pub data_source: DataSource,
    pub log_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = opt_env("NBA_DATA_DIR")
            .map(PathBuf::from)
            .or_else(default_data_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let csv_path = opt_env("NBA_CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("player_stats.csv"));
        let db_path = opt_env("NBA_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("nba.sqlite"));
        let log_file = opt_env("NBA_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("nba_analyzer.log"));

        let seasons = opt_env("NBA_SEASONS")
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect());

        let cache_ttl = Duration::from_secs(
            env::var("NBA_CACHE_TTL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(3600)
                .max(60),
        );
        let fetch_parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 8);
        let local_offset_hours = env::var("NBA_LOCAL_OFFSET_HOURS")
            .ok()
            .and_then(|val| val.trim().parse::<i64>().ok())
            .unwrap_or(6)
            .clamp(-12, 14);
        let data_source = match opt_env("NBA_DATA_SOURCE").as_deref().map(str::to_lowercase) {
            Some(s) if s == "demo" => DataSource::Demo,
            _ => DataSource::Csv,
        };

        Self {
            data_dir,
            csv_path,
            db_path,
            seasons,
            cache_ttl,
            fetch_parallelism,
            local_offset_hours,
            data_source,
            log_file,
        }
    }
}

pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR_NAME));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(DATA_DIR_NAME))
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_games_rounds_down_and_respects_floor() {
        let cfg = LegConfig::default();
        assert_eq!(cfg.min_games(5), 3);
        assert_eq!(cfg.min_games(2), 3);
        assert_eq!(cfg.min_games(9), 5);
    }

    #[test]
    fn season_list_accepts_mixed_separators() {
        assert_eq!(parse_list("2023-24, 2024-25;2025-26"), vec!["2023-24", "2024-25", "2025-26"]);
    }
}
