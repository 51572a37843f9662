use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::warn;

use crate::config::AppConfig;
use crate::stats_feed::{ScoreboardGame, fetch_scoreboard};
use crate::teams;

/// US Eastern offset used to decide which scoreboard day "today" is.
const EASTERN_OFFSET_HOURS: i64 = -5;
const FINAL_LABEL: &str = "FINAL";

#[derive(Debug, Clone, PartialEq)]
pub struct AgendaGame {
    pub game_id: String,
    pub visitor: String,
    pub home: String,
    pub visitor_logo: String,
    pub home_logo: String,
    /// Local "HH:MM", "FINAL", or the provider's status text verbatim.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgendaDay {
    pub date: NaiveDate,
    /// "DD/MM" of the local date.
    pub label: String,
    pub games: Vec<AgendaGame>,
}

pub fn basketball_date(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(EASTERN_OFFSET_HOURS)).date_naive()
}

/// Local date and display time for a game listed on `board_date`.
///
/// "7:30 pm ET" is shifted by `offset_hours` and may roll over to the next
/// day; finished games stay on the scoreboard date.
pub fn convert_status(board_date: NaiveDate, status: &str, offset_hours: i64) -> (NaiveDate, String) {
    let status = status.trim();
    if status.contains("ET") {
        let clean = status.replace("ET", "");
        if let Ok(time) = NaiveTime::parse_from_str(clean.trim(), "%I:%M %p") {
            let local = board_date.and_time(time) + Duration::hours(offset_hours);
            return (local.date(), local.format("%H:%M").to_string());
        }
    } else if status.contains("Final") {
        return (board_date, FINAL_LABEL.to_string());
    }
    (board_date, status.to_string())
}

/// Group scoreboard days into local days, ordered chronologically.
pub fn build_agenda(boards: &[(NaiveDate, Vec<ScoreboardGame>)], offset_hours: i64) -> Vec<AgendaDay> {
    let mut days: BTreeMap<NaiveDate, Vec<AgendaGame>> = BTreeMap::new();
    for (board_date, games) in boards {
        for game in games {
            let (Some(home), Some(visitor)) = (
                teams::by_id(game.home_team_id),
                teams::by_id(game.visitor_team_id),
            ) else {
                continue;
            };
            let (date, time) = convert_status(*board_date, &game.status_text, offset_hours);
            days.entry(date).or_default().push(AgendaGame {
                game_id: game.game_id.clone(),
                visitor: visitor.abbreviation.to_string(),
                home: home.abbreviation.to_string(),
                visitor_logo: visitor.logo_url(),
                home_logo: home.logo_url(),
                time,
            });
        }
    }
    days.into_iter()
        .map(|(date, games)| AgendaDay {
            date,
            label: date.format("%d/%m").to_string(),
            games,
        })
        .collect()
}

/// Today's and tomorrow's scoreboards. A day that fails to load is skipped.
pub fn fetch_agenda(cfg: &AppConfig, now: DateTime<Utc>) -> Vec<AgendaDay> {
    let today = basketball_date(now);
    let mut boards = Vec::new();
    for date in [today, today + Duration::days(1)] {
        let key = date.format("%Y-%m-%d").to_string();
        match fetch_scoreboard(&key, cfg.cache_ttl) {
            Ok(games) => boards.push((date, games)),
            Err(err) => warn!(date = %key, error = %err, "scoreboard fetch failed"),
        }
    }
    build_agenda(&boards, cfg.local_offset_hours)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn basketball_day_lags_utc_by_five_hours() {
        let early = Utc.with_ymd_and_hms(2025, 1, 21, 3, 0, 0).unwrap();
        assert_eq!(basketball_date(early), d(2025, 1, 20));
        let late = Utc.with_ymd_and_hms(2025, 1, 21, 6, 0, 0).unwrap();
        assert_eq!(basketball_date(late), d(2025, 1, 21));
    }

    #[test]
    fn evening_tipoff_rolls_to_next_local_day() {
        assert_eq!(
            convert_status(d(2025, 1, 20), "7:30 pm ET", 6),
            (d(2025, 1, 21), "01:30".to_string())
        );
        assert_eq!(
            convert_status(d(2025, 1, 20), "12:00 pm ET", 6),
            (d(2025, 1, 20), "18:00".to_string())
        );
    }

    #[test]
    fn final_and_live_statuses() {
        assert_eq!(
            convert_status(d(2025, 1, 20), "Final/OT", 6),
            (d(2025, 1, 20), "FINAL".to_string())
        );
        assert_eq!(
            convert_status(d(2025, 1, 20), "Q3 5:12", 6),
            (d(2025, 1, 20), "Q3 5:12".to_string())
        );
    }
}
