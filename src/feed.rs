use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::{AnalyzerConfig, AppConfig, DataSource};
use crate::demo_feed::{self, DemoConfig};
use crate::export;
use crate::game_log::GameLogTable;
use crate::report::compute_matchup_report;
use crate::schedule::{self, basketball_date};
use crate::snapshot::SnapshotCache;
use crate::state::{Delta, ProviderCommand};
use crate::stats_feed;
use crate::store;
use crate::teams;

const REFRESH_SOURCE: &str = "stats.nba.com";

/// Background worker: turns dashboard commands into deltas.
pub fn spawn_provider(cfg: AppConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let analyzer = AnalyzerConfig::default();
        let demo = DemoConfig::default();
        let snapshots = Arc::new(SnapshotCache::new(cfg.cache_ttl));

        let _ = tx.send(Delta::DataLoading);
        match load_snapshot(&cfg, &demo, &snapshots) {
            Ok(table) => {
                let _ = tx.send(Delta::DataLoaded {
                    rows: table.len(),
                    latest: table.latest_date(),
                });
            }
            Err(err) => {
                let _ = tx.send(Delta::DataFailed(err.to_string()));
            }
        }

        for cmd in cmd_rx {
            match cmd {
                ProviderCommand::FetchAgenda => {
                    let now = Utc::now();
                    let days = match cfg.data_source {
                        DataSource::Demo => {
                            demo_feed::demo_agenda(basketball_date(now), &demo, cfg.local_offset_hours)
                        }
                        DataSource::Csv => schedule::fetch_agenda(&cfg, now),
                    };
                    if days.is_empty() && cfg.data_source == DataSource::Csv {
                        let _ = tx.send(Delta::AgendaFailed(
                            "no games scheduled or scoreboard unreachable".to_string(),
                        ));
                    }
                    let _ = tx.send(Delta::SetAgenda(days));
                }
                ProviderCommand::LoadMatchup { team_a, team_b } => {
                    match load_snapshot(&cfg, &demo, &snapshots) {
                        Ok(table) => {
                            let report = compute_matchup_report(&table, &team_a, &team_b, &analyzer);
                            let _ = tx.send(Delta::SetReport(Box::new(report)));
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::DataFailed(err.to_string()));
                        }
                    }
                }
                ProviderCommand::FetchRosters { teams: codes } => {
                    if cfg.data_source == DataSource::Demo {
                        continue;
                    }
                    let tx = tx.clone();
                    let cfg = cfg.clone();
                    thread::spawn(move || {
                        let season = cfg.seasons.last().cloned().unwrap_or_default();
                        for code in codes {
                            let Some(team) = teams::by_abbreviation(&code) else {
                                continue;
                            };
                            let jerseys = stats_feed::fetch_team_roster(team.id, &season, cfg.cache_ttl);
                            let _ = tx.send(Delta::SetRoster {
                                team: team.abbreviation.to_string(),
                                jerseys,
                            });
                        }
                    });
                }
                ProviderCommand::RefreshData => {
                    let tx = tx.clone();
                    let cfg = cfg.clone();
                    let demo = demo.clone();
                    let snapshots = Arc::clone(&snapshots);
                    thread::spawn(move || {
                        let _ = tx.send(Delta::DataLoading);
                        match refresh(&cfg, &demo) {
                            Ok(table) => {
                                let table = snapshots.replace(table, SystemTime::now());
                                let _ = tx.send(Delta::DataLoaded {
                                    rows: table.len(),
                                    latest: table.latest_date(),
                                });
                            }
                            Err(err) => {
                                warn!(error = %err, "refresh failed");
                                let _ = tx.send(Delta::DataFailed(format!("refresh: {err:#}")));
                            }
                        }
                    });
                }
                ProviderCommand::ExportReport {
                    path,
                    team_a,
                    team_b,
                } => {
                    let _ = tx.send(Delta::ExportStarted { path: path.clone() });
                    let message = load_snapshot(&cfg, &demo, &snapshots)
                        .and_then(|table| {
                            let report = compute_matchup_report(&table, &team_a, &team_b, &analyzer);
                            export::export_report(path.as_ref(), &report)
                        })
                        .map(|summary| {
                            format!(
                                "{} dates, {} players, {} alerts, {} legs",
                                summary.window_dates, summary.players, summary.alerts, summary.legs
                            )
                        })
                        .unwrap_or_else(|err| format!("failed: {err:#}"));
                    let _ = tx.send(Delta::ExportFinished { path, message });
                }
            }
        }
    });
}

fn load_snapshot(
    cfg: &AppConfig,
    demo: &DemoConfig,
    snapshots: &SnapshotCache,
) -> Result<Arc<GameLogTable>> {
    snapshots.get_or_load(SystemTime::now(), || match cfg.data_source {
        DataSource::Csv => store::load_csv(&cfg.csv_path),
        DataSource::Demo => Ok(demo_feed::generate(demo)),
    })
}

/// Pull fresh data and replace the canonical copies. Demo mode regenerates in memory.
fn refresh(cfg: &AppConfig, demo: &DemoConfig) -> Result<GameLogTable> {
    match cfg.data_source {
        DataSource::Demo => Ok(demo_feed::generate(demo)),
        DataSource::Csv => {
            let table = stats_feed::fetch_season_game_logs(cfg)?;
            if table.is_empty() {
                return Err(anyhow!("provider returned no rows"));
            }
            let summary = store::replace_canonical(cfg, &table, REFRESH_SOURCE)?;
            info!(rows = summary.rows, players = summary.players, "refresh complete");
            Ok(table)
        }
    }
}
