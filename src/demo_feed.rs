use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game_log::{GameLogRecord, GameLogTable, WinLoss};
use crate::schedule::{AgendaDay, build_agenda};
use crate::stats_feed::ScoreboardGame;
use crate::teams::TEAMS;

const FIRST_NAMES: [&str; 16] = [
    "Marcus", "Jalen", "Tyrese", "Devin", "Andre", "Miles", "Caleb", "Darius", "Isaiah", "Jordan",
    "Keegan", "Luka", "Noah", "Owen", "Quentin", "Trey",
];
const LAST_NAMES: [&str; 16] = [
    "Bridges", "Carter", "Dawson", "Ellis", "Fowler", "Grant", "Hayes", "Irving", "Jennings",
    "Knox", "Lowry", "Mercer", "Nance", "Parker", "Reed", "Sutton",
];

/// Per-slot base line (pts, reb, ast, min). Slot 0 is the franchise player.
const ROLE_LINES: [(f64, f64, f64, f64); 9] = [
    (26.0, 8.0, 7.0, 36.0),
    (20.0, 5.0, 6.0, 34.0),
    (14.0, 9.0, 2.0, 30.0),
    (11.0, 4.0, 3.0, 28.0),
    (9.0, 6.0, 2.0, 24.0),
    (7.0, 3.0, 3.0, 20.0),
    (6.0, 4.0, 1.0, 16.0),
    (4.0, 2.0, 1.0, 12.0),
    (3.0, 2.0, 1.0, 8.0),
];

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub seed: u64,
    pub team_count: usize,
    pub players_per_team: usize,
    pub meetings_per_pair: usize,
    pub start: NaiveDate,
    /// Chance that a player sits out a given game.
    pub absence_rate: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            team_count: 8,
            players_per_team: ROLE_LINES.len(),
            meetings_per_pair: 6,
            start: NaiveDate::from_ymd_opt(2024, 10, 22).unwrap_or_default(),
            absence_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
struct DemoPlayer {
    id: u64,
    name: String,
    team: usize,
    role: usize,
}

/// Deterministic synthetic league: same config, same table.
pub fn generate(cfg: &DemoConfig) -> GameLogTable {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let team_count = cfg.team_count.clamp(2, TEAMS.len());
    let per_team = cfg.players_per_team.clamp(1, ROLE_LINES.len());
    let codes: Vec<&str> = TEAMS[..team_count].iter().map(|t| t.abbreviation).collect();

    let mut players = Vec::with_capacity(team_count * per_team);
    for team in 0..team_count {
        for role in 0..per_team {
            let k = team * per_team + role;
            players.push(DemoPlayer {
                id: 1_000 + k as u64,
                name: format!(
                    "{} {}",
                    FIRST_NAMES[k % FIRST_NAMES.len()],
                    LAST_NAMES[(k / FIRST_NAMES.len() + k) % LAST_NAMES.len()]
                ),
                team,
                role,
            });
        }
    }

    let mut records = Vec::new();
    let mut day = 0i64;
    let mut game_no = 0u32;
    for meeting in 0..cfg.meetings_per_pair {
        // Mid-season trade: the fourth man of the first team changes sides.
        if meeting == cfg.meetings_per_pair / 2
            && per_team > 3
            && let Some(p) = players.iter_mut().find(|p| p.team == 0 && p.role == 3)
        {
            p.team = 1;
        }
        for a in 0..team_count {
            for b in (a + 1)..team_count {
                let date = cfg.start + Duration::days(day);
                day += 1;
                game_no += 1;
                let (home, away) = if (meeting + a + b) % 2 == 0 { (a, b) } else { (b, a) };
                let game_id = format!("00224{game_no:05}");
                let mut lines = Vec::new();
                for side in [home, away] {
                    let roster: Vec<&DemoPlayer> = players.iter().filter(|p| p.team == side).collect();
                    let star_out = roster
                        .iter()
                        .any(|p| p.role == 0 && rng.gen_bool(cfg.absence_rate));
                    for p in roster {
                        if p.role == 0 && star_out {
                            continue;
                        }
                        if p.role != 0 && rng.gen_bool(cfg.absence_rate) {
                            continue;
                        }
                        let (pts, reb, ast, min) = ROLE_LINES[p.role];
                        let boost = if star_out && p.role == 2 { 10.0 } else { 0.0 };
                        let noise = |rng: &mut StdRng, base: f64| (base * rng.gen_range(0.6..1.4)).round();
                        let matchup = if side == home {
                            format!("{} vs. {}", codes[home], codes[away])
                        } else {
                            format!("{} @ {}", codes[away], codes[home])
                        };
                        lines.push(GameLogRecord {
                            player_id: p.id,
                            player_name: p.name.clone(),
                            team: codes[side].to_string(),
                            game_date: date,
                            matchup,
                            pts: noise(&mut rng, pts) + boost,
                            reb: noise(&mut rng, reb),
                            ast: noise(&mut rng, ast),
                            minutes: (min * rng.gen_range(0.8..1.2) * 10.0).round() / 10.0,
                            wl: None,
                            game_id: Some(game_id.clone()),
                        });
                    }
                }
                let score = |team: &str| {
                    lines
                        .iter()
                        .filter(|r: &&GameLogRecord| r.team == team)
                        .map(|r| r.pts)
                        .sum::<f64>()
                };
                let home_wins = score(codes[home]) >= score(codes[away]);
                for line in &mut lines {
                    let won = (line.team == codes[home]) == home_wins;
                    line.wl = Some(if won { WinLoss::Win } else { WinLoss::Loss });
                }
                records.extend(lines);
            }
        }
    }
    GameLogTable::from_records(records)
}

/// Offline agenda: a slate of evening games today and tomorrow.
pub fn demo_agenda(today: NaiveDate, cfg: &DemoConfig, offset_hours: i64) -> Vec<AgendaDay> {
    let team_count = cfg.team_count.clamp(2, TEAMS.len());
    let ids: Vec<u32> = TEAMS[..team_count].iter().map(|t| t.id).collect();
    let tipoffs = ["7:00 pm ET", "7:30 pm ET", "10:00 pm ET"];
    let boards = (0..2)
        .map(|offset| {
            let date = today + Duration::days(offset);
            let games = ids
                .chunks(2)
                .filter(|pair| pair.len() == 2)
                .enumerate()
                .map(|(i, pair)| {
                    let (home, visitor) = if offset == 0 { (pair[0], pair[1]) } else { (pair[1], pair[0]) };
                    ScoreboardGame {
                        game_id: format!("00225{:03}{:02}", offset, i),
                        home_team_id: home,
                        visitor_team_id: visitor,
                        status_text: tipoffs[i % tipoffs.len()].to_string(),
                    }
                })
                .collect();
            (date, games)
        })
        .collect::<Vec<_>>();
    build_agenda(&boards, offset_hours)
}
