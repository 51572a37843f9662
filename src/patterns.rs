use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::config::PatternConfig;
use crate::game_log::{CurrentTeamMap, PlayerHistory, Stat, StatLine};
use crate::matchup::MatchupWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub player_name: String,
    pub categories: Vec<Stat>,
    pub season_mean: StatLine,
}

impl Star {
    pub fn is_star_in(&self, stat: Stat) -> bool {
        self.categories.contains(&stat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Beneficiary {
    pub player_name: String,
    pub stat: Stat,
    pub value: f64,
    /// The player's own full-table mean for `stat`.
    pub baseline: f64,
}

impl Beneficiary {
    pub fn delta(&self) -> f64 {
        self.value - self.baseline
    }

    /// "Payton Pritchard (+9 PTS)"
    pub fn describe(&self) -> String {
        format!(
            "{} (+{} {})",
            self.player_name,
            self.delta().trunc() as i64,
            self.stat.label()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementAlert {
    pub date: NaiveDate,
    pub team: String,
    pub missing: Vec<Star>,
    pub beneficiaries: Vec<Beneficiary>,
}

impl ReplacementAlert {
    pub fn missing_names(&self) -> Vec<&str> {
        self.missing.iter().map(|s| s.player_name.as_str()).collect()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.beneficiaries.iter().map(Beneficiary::describe).collect()
    }
}

/// Players whose full-table mean strictly exceeds the star threshold in at
/// least one betting category, sorted by name.
pub fn find_stars(season_means: &HashMap<String, StatLine>, cfg: &PatternConfig) -> Vec<Star> {
    let mut stars: Vec<Star> = season_means
        .iter()
        .filter_map(|(name, mean)| {
            let categories: Vec<Stat> = Stat::BETTING
                .into_iter()
                .filter(|stat| {
                    cfg.star_mean
                        .get(*stat)
                        .is_some_and(|threshold| mean.get(*stat) > threshold)
                })
                .collect();
            (!categories.is_empty()).then(|| Star {
                player_name: name.clone(),
                categories,
                season_mean: *mean,
            })
        })
        .collect();
    stars.sort_by(|a, b| a.player_name.cmp(&b.player_name));
    stars
}

/// For each window date and each selected team that played, list the team's
/// stars who sat out and the teammates whose production spiked in the
/// categories those stars carry. Most recent date first.
pub fn detect_replacements(
    window: &MatchupWindow,
    current: &CurrentTeamMap,
    history: &PlayerHistory,
    season_means: &HashMap<String, StatLine>,
    cfg: &PatternConfig,
) -> Vec<ReplacementAlert> {
    if window.is_empty() {
        return Vec::new();
    }
    let stars = find_stars(season_means, cfg);
    let mut alerts = Vec::new();

    for date in &window.dates {
        for team in [window.team_a.as_str(), window.team_b.as_str()] {
            let participants = participants_on(window, *date, team);
            if participants.is_empty() {
                continue;
            }
            let present: HashSet<&str> = participants.iter().map(|(name, _)| *name).collect();

            let missing: Vec<Star> = stars
                .iter()
                .filter(|s| current.is_on(&s.player_name, team))
                .filter(|s| history.team_as_of(&s.player_name, *date) == Some(team))
                .filter(|s| !present.contains(s.player_name.as_str()))
                .cloned()
                .collect();
            if missing.is_empty() {
                continue;
            }

            let categories: Vec<Stat> = Stat::BETTING
                .into_iter()
                .filter(|stat| missing.iter().any(|s| s.is_star_in(*stat)))
                .collect();

            let mut beneficiaries = Vec::new();
            for (name, line) in &participants {
                let baseline = season_means.get(*name).copied().unwrap_or_default();
                for stat in &categories {
                    let (Some(floor), Some(margin)) = (
                        cfg.replacement_floor.get(*stat),
                        cfg.replacement_margin.get(*stat),
                    ) else {
                        continue;
                    };
                    let value = line.get(*stat);
                    if value >= floor && value - baseline.get(*stat) >= margin {
                        beneficiaries.push(Beneficiary {
                            player_name: name.to_string(),
                            stat: *stat,
                            value,
                            baseline: baseline.get(*stat),
                        });
                    }
                }
            }

            if !beneficiaries.is_empty() {
                alerts.push(ReplacementAlert {
                    date: *date,
                    team: team.to_string(),
                    missing,
                    beneficiaries,
                });
            }
        }
    }
    alerts
}

/// Summed line per player who logged a row for `team` on `date`, in feed order.
fn participants_on<'a>(
    window: &'a MatchupWindow,
    date: NaiveDate,
    team: &str,
) -> Vec<(&'a str, StatLine)> {
    let mut out: Vec<(&'a str, StatLine)> = Vec::new();
    for r in window
        .rows
        .iter()
        .filter(|r| r.game_date == date && r.team == team)
    {
        match out.iter_mut().find(|(name, _)| *name == r.player_name) {
            Some((_, line)) => line.add(&r.stat_line()),
            None => out.push((r.player_name.as_str(), r.stat_line())),
        }
    }
    out
}
