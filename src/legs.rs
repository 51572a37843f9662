use crate::aggregate::PlayerAggregate;
use crate::config::LegConfig;
use crate::game_log::Stat;

pub const EMPTY_POOL_TEXT: &str = "No qualifying candidates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegTier {
    /// Line at the player's smart floor.
    Safe,
    /// Line at the player's window mean, above the floor.
    Risky,
}

impl LegTier {
    pub const ALL: [LegTier; 2] = [LegTier::Safe, LegTier::Risky];

    pub fn tag(self) -> &'static str {
        match self {
            LegTier::Safe => "floor",
            LegTier::Risky => "high-value",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LegTier::Safe => "SAFE",
            LegTier::Risky => "RISKY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegCandidate {
    pub player_name: String,
    pub team: String,
    pub stat: Stat,
    pub tier: LegTier,
    /// Proposed line: the smart floor for safe legs, the mean for risky ones.
    pub threshold: f64,
    pub smart_floor: f64,
    /// Window mean; also the sort key.
    pub mean: f64,
    pub games: usize,
}

impl LegCandidate {
    pub fn rationale(&self) -> &'static str {
        self.tier.tag()
    }

    pub fn describe(&self) -> String {
        format!(
            "{} ({}) {} {:.1}+ [{}]",
            self.player_name,
            self.team,
            self.stat.label(),
            self.threshold,
            self.rationale()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegPool {
    pub stat: Stat,
    pub tier: LegTier,
    pub candidates: Vec<LegCandidate>,
}

impl LegPool {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.tier.label(), self.stat.label())
    }

    /// One line per candidate, or the explicit empty-state line.
    pub fn display_lines(&self) -> Vec<String> {
        if self.is_empty() {
            return vec![EMPTY_POOL_TEXT.to_string()];
        }
        self.candidates.iter().map(LegCandidate::describe).collect()
    }
}

/// Six pools: every betting stat crossed with both tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct LegBoard {
    pub pools: Vec<LegPool>,
}

impl LegBoard {
    pub fn empty() -> Self {
        let pools = Stat::BETTING
            .into_iter()
            .flat_map(|stat| {
                LegTier::ALL.into_iter().map(move |tier| LegPool {
                    stat,
                    tier,
                    candidates: Vec::new(),
                })
            })
            .collect();
        Self { pools }
    }

    pub fn pool(&self, stat: Stat, tier: LegTier) -> Option<&LegPool> {
        self.pools.iter().find(|p| p.stat == stat && p.tier == tier)
    }

    pub fn is_empty(&self) -> bool {
        self.pools.iter().all(LegPool::is_empty)
    }

    pub fn total(&self) -> usize {
        self.pools.iter().map(|p| p.candidates.len()).sum()
    }
}

/// Second-lowest value once there are `min_samples` games, else the lowest.
pub fn smart_floor(values: &[f64], min_samples: usize) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() >= min_samples.max(2) {
        sorted.get(1).copied()
    } else {
        sorted.first().copied()
    }
}

pub fn classify_legs(aggregates: &[PlayerAggregate], window_len: usize, cfg: &LegConfig) -> LegBoard {
    let mut board = LegBoard::empty();
    if window_len == 0 {
        return board;
    }
    let min_games = cfg.min_games(window_len);

    for agg in aggregates.iter().filter(|a| a.games_played >= min_games) {
        for stat in Stat::BETTING {
            let (Some(safe_min), Some(risky_min)) =
                (cfg.safe_floor_min.get(stat), cfg.risky_mean_min.get(stat))
            else {
                continue;
            };
            let Some(floor) = smart_floor(&agg.values(stat), cfg.smart_floor_min_samples) else {
                continue;
            };
            let mean = agg.mean(stat);
            let candidate = |tier: LegTier, threshold: f64| LegCandidate {
                player_name: agg.player_name.clone(),
                team: agg.team.clone(),
                stat,
                tier,
                threshold,
                smart_floor: floor,
                mean,
                games: agg.games_played,
            };

            if floor >= safe_min {
                push(&mut board, candidate(LegTier::Safe, floor));
            }
            if mean >= risky_min && mean - floor >= cfg.risky_margin {
                push(&mut board, candidate(LegTier::Risky, mean));
            }
        }
    }

    for pool in &mut board.pools {
        // Stable: equal means keep aggregate order.
        pool.candidates.sort_by(|a, b| b.mean.total_cmp(&a.mean));
        pool.candidates.truncate(cfg.pool_cap);
    }
    board
}

fn push(board: &mut LegBoard, candidate: LegCandidate) {
    if let Some(pool) = board
        .pools
        .iter_mut()
        .find(|p| p.stat == candidate.stat && p.tier == candidate.tier)
    {
        pool.candidates.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Availability;
    use crate::game_log::StatLine;

    fn agg(name: &str, pts: &[f64]) -> PlayerAggregate {
        let games: Vec<Option<StatLine>> = pts
            .iter()
            .map(|p| {
                Some(StatLine {
                    pts: *p,
                    reb: 1.0,
                    ast: 1.0,
                    minutes: 30.0,
                })
            })
            .collect();
        let n = games.len();
        let mean = pts.iter().sum::<f64>() / n as f64;
        PlayerAggregate {
            player_id: 1,
            player_name: name.to_string(),
            team: "LAL".to_string(),
            games_played: n,
            window_len: 5,
            means: StatLine {
                pts: mean,
                reb: 1.0,
                ast: 1.0,
                minutes: 30.0,
            },
            games,
            availability: vec![Availability::Played; n],
        }
    }

    #[test]
    fn smart_floor_skips_worst_game_from_four_samples() {
        assert_eq!(smart_floor(&[14.0, 8.0, 11.0, 9.0], 4), Some(9.0));
        assert_eq!(smart_floor(&[14.0, 8.0, 11.0], 4), Some(8.0));
        assert_eq!(smart_floor(&[], 4), None);
    }

    #[test]
    fn modest_scorer_gets_no_points_leg() {
        let board = classify_legs(&[agg("R", &[8.0, 9.0, 11.0, 14.0])], 5, &LegConfig::default());
        assert!(board.pool(Stat::Points, LegTier::Safe).unwrap().is_empty());
        assert!(board.pool(Stat::Points, LegTier::Risky).unwrap().is_empty());
    }

    #[test]
    fn risky_line_clears_the_floor_by_the_margin() {
        let board = classify_legs(&[agg("S", &[14.0, 22.0, 25.0, 19.0])], 5, &LegConfig::default());
        let safe = &board.pool(Stat::Points, LegTier::Safe).unwrap().candidates;
        let risky = &board.pool(Stat::Points, LegTier::Risky).unwrap().candidates;
        assert_eq!(safe[0].threshold, 19.0);
        assert_eq!(risky[0].threshold, 20.0);
        assert!(risky[0].threshold - safe[0].threshold >= 1.0);
    }

    #[test]
    fn consistent_scorer_has_no_risky_leg() {
        let board = classify_legs(&[agg("C", &[20.0, 20.0, 20.0])], 5, &LegConfig::default());
        assert_eq!(board.pool(Stat::Points, LegTier::Safe).unwrap().candidates.len(), 1);
        assert!(board.pool(Stat::Points, LegTier::Risky).unwrap().is_empty());
    }

    #[test]
    fn too_few_games_disqualifies() {
        let board = classify_legs(&[agg("F", &[30.0, 30.0])], 5, &LegConfig::default());
        assert!(board.is_empty());
    }

    #[test]
    fn pools_sort_by_mean_with_stable_ties_and_cap() {
        let players: Vec<PlayerAggregate> = (0..8)
            .map(|i| agg(&format!("P{i}"), &[20.0 + (i % 2) as f64, 20.0, 20.0]))
            .collect();
        let board = classify_legs(&players, 5, &LegConfig::default());
        let names: Vec<&str> = board
            .pool(Stat::Points, LegTier::Safe)
            .unwrap()
            .candidates
            .iter()
            .map(|c| c.player_name.as_str())
            .collect();
        assert_eq!(names, vec!["P1", "P3", "P5", "P7", "P0"]);
    }

    #[test]
    fn empty_pool_renders_explicit_state() {
        let board = LegBoard::empty();
        assert_eq!(board.pools.len(), 6);
        assert_eq!(board.pools[0].display_lines(), vec![EMPTY_POOL_TEXT.to_string()]);
    }
}
