use chrono::NaiveDate;

use nba_analyzer::error::IngestError;
use nba_analyzer::game_log::{GameLogTable, RawTable, WinLoss};
use nba_analyzer::schedule::build_agenda;
use nba_analyzer::stats_feed::{
    concat_raw, parse_league_game_log_json, parse_scoreboard_json, parse_team_roster_json,
};

const GAME_LOG_JSON: &str = r#"{
  "resource": "leaguegamelog",
  "resultSets": [{
    "name": "LeagueGameLog",
    "headers": ["SEASON_ID","PLAYER_ID","PLAYER_NAME","TEAM_ABBREVIATION","GAME_ID","GAME_DATE","MATCHUP","WL","MIN","PTS","REB","AST"],
    "rowSet": [
      ["22024", 2544, "LeBron James", "LAL", "0022400512", "2025-01-10", "LAL vs. BOS", "W", 35, 28, 9, 11],
      ["22024", 1628369, "Jayson Tatum", "BOS", "0022400512", "2025-01-10", "BOS @ LAL", "L", 38.5, 31, 8, 4],
      ["22024", 1629216, "Gabe Vincent", "LAL", "0022400512", "2025-01-10", "LAL vs. BOS", "W", null, 0, 0, 0]
    ]
  }]
}"#;

#[test]
fn league_game_log_becomes_typed_table() {
    let raw = parse_league_game_log_json(GAME_LOG_JSON).unwrap();
    assert!(raw.headers.iter().all(|h| h == &h.to_ascii_lowercase()));
    assert_eq!(raw.rows.len(), 3);

    let table = GameLogTable::from_raw(&raw).unwrap();
    let lebron = &table.records()[0];
    assert_eq!(lebron.player_id, 2544);
    assert_eq!(lebron.game_date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    assert_eq!(lebron.pts, 28.0);
    assert_eq!(lebron.wl, Some(WinLoss::Win));
    assert_eq!(lebron.game_id.as_deref(), Some("0022400512"));
    assert_eq!(table.records()[1].minutes, 38.5);
    // Null minutes are a DNP-style blank, not an error.
    assert_eq!(table.records()[2].minutes, 0.0);
}

#[test]
fn null_or_empty_payloads_are_empty_tables() {
    assert!(parse_league_game_log_json("null").unwrap().rows.is_empty());
    assert!(parse_league_game_log_json("  ").unwrap().rows.is_empty());
    assert!(parse_league_game_log_json("{}").unwrap().rows.is_empty());
    assert!(parse_league_game_log_json("{not json").is_err());
}

#[test]
fn missing_required_column_names_the_field() {
    let raw = RawTable::new(
        vec!["PLAYER_ID".into(), "PLAYER_NAME".into()],
        vec![vec!["1".into(), "A".into()]],
    );
    match GameLogTable::from_raw(&raw) {
        Err(IngestError::MissingColumn { column }) => assert_eq!(column, "team_abbreviation"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn missing_game_id_column_is_tolerated() {
    let raw = RawTable::new(
        [
            "player_id", "player_name", "team_abbreviation", "game_date", "matchup", "pts", "reb",
            "ast", "min", "wl",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        vec![
            ["7", "Old Timer", "NYK", "JAN 05, 2024", "NYK @ MIA", "12", "3", "4", "24:30", "L"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ],
    );
    let table = GameLogTable::from_raw(&raw).unwrap();
    let r = &table.records()[0];
    assert_eq!(r.game_id, None);
    assert_eq!(r.game_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(r.minutes, 24.5);
}

#[test]
fn seasons_concatenate_by_column_name() {
    let first = parse_league_game_log_json(GAME_LOG_JSON).unwrap();
    let second = RawTable::new(
        vec!["PTS".into(), "PLAYER_NAME".into()],
        vec![vec!["40".into(), "Someone".into()]],
    );
    let joined = concat_raw(vec![first.clone(), second]);
    assert_eq!(joined.headers, first.headers);
    assert_eq!(joined.rows.len(), 4);
    let name_idx = joined.column_index("player_name").unwrap();
    let pts_idx = joined.column_index("pts").unwrap();
    assert_eq!(joined.rows[3][name_idx], "Someone");
    assert_eq!(joined.rows[3][pts_idx], "40");
    assert_eq!(joined.rows[3][joined.column_index("team_abbreviation").unwrap()], "");
}

#[test]
fn roster_numbers_drop_float_suffix() {
    let raw = r#"{"resultSets":[{"name":"CommonTeamRoster",
        "headers":["TeamID","SEASON","PLAYER","NUM","POSITION"],
        "rowSet":[[1610612747,"2025","LeBron James","23","F"],
                  [1610612747,"2025","Austin Reaves",15.0,"G"],
                  [1610612747,"2025","Two Way",null,"G"]]}]}"#;
    let map = parse_team_roster_json(raw).unwrap();
    assert_eq!(map.get("LeBron James").map(String::as_str), Some("23"));
    assert_eq!(map.get("Austin Reaves").map(String::as_str), Some("15"));
    assert_eq!(map.get("Two Way").map(String::as_str), Some(""));
    assert!(parse_team_roster_json("null").unwrap().is_empty());
}

const SCOREBOARD_JSON: &str = r#"{"resultSets":[
  {"name":"GameHeader",
   "headers":["GAME_DATE_EST","GAME_SEQUENCE","GAME_ID","GAME_STATUS_ID","GAME_STATUS_TEXT","HOME_TEAM_ID","VISITOR_TEAM_ID"],
   "rowSet":[
     ["2025-01-20T00:00:00",1,"0022400600",3,"Final",1610612738,1610612747],
     ["2025-01-20T00:00:00",2,"0022400601",1,"7:30 pm ET",1610612752,1610612748],
     ["2025-01-20T00:00:00",3,"0022400602",1,"10:00 pm ET",1610612744,1610612743],
     ["2025-01-20T00:00:00",4,"0022400603",1,"7:00 pm ET",99,1610612743]
   ]},
  {"name":"LineScore","headers":["GAME_ID"],"rowSet":[["0022400600"]]}
]}"#;

#[test]
fn scoreboard_header_rows_parse() {
    let games = parse_scoreboard_json(SCOREBOARD_JSON).unwrap();
    assert_eq!(games.len(), 4);
    assert_eq!(games[0].game_id, "0022400600");
    assert_eq!(games[0].home_team_id, 1610612738);
    assert_eq!(games[0].visitor_team_id, 1610612747);
    assert_eq!(games[1].status_text, "7:30 pm ET");
}

#[test]
fn agenda_groups_by_local_day() {
    let board_date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let games = parse_scoreboard_json(SCOREBOARD_JSON).unwrap();
    let agenda = build_agenda(&[(board_date, games)], 6);

    let labels: Vec<&str> = agenda.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["20/01", "21/01"]);

    let today = &agenda[0].games;
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].time, "FINAL");
    assert_eq!(today[0].visitor, "LAL");
    assert_eq!(today[0].home, "BOS");
    assert_eq!(
        today[0].home_logo,
        "https://cdn.nba.com/logos/nba/1610612738/global/L/logo.svg"
    );

    // Unknown team id 99 is dropped.
    let tomorrow = &agenda[1].games;
    let times: Vec<&str> = tomorrow.iter().map(|g| g.time.as_str()).collect();
    assert_eq!(times, vec!["01:30", "04:00"]);
    assert_eq!(tomorrow[0].visitor, "MIA");
    assert_eq!(tomorrow[0].home, "NYK");
}
