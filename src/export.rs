use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::game_log::Stat;
use crate::report::MatchupReport;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub window_dates: usize,
    pub players: usize,
    pub trend_rows: usize,
    pub alerts: usize,
    pub legs: usize,
}

/// One named sheet: header row first.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRows {
    pub name: &'static str,
    pub rows: Vec<Vec<String>>,
}

impl SheetRows {
    fn data_rows(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

pub fn default_export_name(report: &MatchupReport) -> String {
    format!("matchup_{}_{}.xlsx", report.team_a, report.team_b).to_ascii_lowercase()
}

pub fn export_report(path: &Path, report: &MatchupReport) -> Result<ExportSummary> {
    let sheets = report_sheets(report);
    let mut workbook = Workbook::new();
    for sheet_rows in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_rows.name)?;
        write_rows(sheet, &sheet_rows.rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    let count = |name: &str| {
        sheets
            .iter()
            .find(|s| s.name == name)
            .map(SheetRows::data_rows)
            .unwrap_or(0)
    };
    Ok(ExportSummary {
        window_dates: count("Window"),
        players: count("Players"),
        trend_rows: count("Trends"),
        alerts: count("Alerts"),
        legs: count("Legs"),
    })
}

/// Sheet contents for a report, in workbook order.
pub fn report_sheets(report: &MatchupReport) -> Vec<SheetRows> {
    vec![
        SheetRows {
            name: "Window",
            rows: window_rows(report),
        },
        SheetRows {
            name: "Players",
            rows: player_rows(report),
        },
        SheetRows {
            name: "Trends",
            rows: trend_rows(report),
        },
        SheetRows {
            name: "Alerts",
            rows: alert_rows(report),
        },
        SheetRows {
            name: "Legs",
            rows: leg_rows(report),
        },
    ]
}

fn window_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![strings(&["Date", "Matchup", "Result", "Link"])];
    for h in &report.headers {
        rows.push(vec![
            h.date.format("%Y-%m-%d").to_string(),
            h.matchup.clone(),
            h.result.map(|r| r.as_str().to_string()).unwrap_or_default(),
            h.link.clone().unwrap_or_default(),
        ]);
    }
    rows
}

fn player_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut header = strings(&["Team", "Player", "GP", "Attendance", "PTS", "REB", "AST", "MIN"]);
    header.extend(report.headers.iter().map(|h| h.label.clone()));
    let mut rows = vec![header];
    for p in &report.players {
        let agg = &p.aggregate;
        let mut row = vec![
            agg.team.clone(),
            agg.player_name.clone(),
            format!("{}/{}", agg.games_played, agg.window_len),
            format!("{:.0}%", agg.attendance() * 100.0),
        ];
        row.extend(Stat::ALL.iter().map(|s| format!("{:.1}", agg.mean(*s))));
        row.extend(agg.availability.iter().map(|a| a.label().to_string()));
        rows.push(row);
    }
    rows
}

fn trend_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![strings(&["Team", "Player", "Stat", "Trend"])];
    for p in &report.players {
        for series in &p.trends {
            rows.push(vec![
                p.aggregate.team.clone(),
                p.aggregate.player_name.clone(),
                series.stat.label().to_string(),
                series.render(),
            ]);
        }
    }
    rows
}

fn alert_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![strings(&["Date", "Team", "Missing", "Beneficiaries"])];
    for alert in &report.alerts {
        rows.push(vec![
            alert.date.format("%Y-%m-%d").to_string(),
            alert.team.clone(),
            alert.missing_names().join(", "),
            alert.descriptions().join(", "),
        ]);
    }
    rows
}

fn leg_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![strings(&[
        "Tier", "Stat", "Player", "Team", "Line", "Floor", "Mean", "GP",
    ])];
    for pool in &report.legs.pools {
        for c in &pool.candidates {
            rows.push(vec![
                c.tier.label().to_string(),
                c.stat.label().to_string(),
                c.player_name.clone(),
                c.team.clone(),
                format!("{:.1}", c.threshold),
                format!("{:.1}", c.smart_floor),
                format!("{:.1}", c.mean),
                c.games.to_string(),
            ]);
        }
    }
    rows
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::demo_feed::{DemoConfig, generate};
    use crate::report::compute_matchup_report;

    #[test]
    fn sheets_follow_report_contents() {
        let table = generate(&DemoConfig::default());
        let report = compute_matchup_report(&table, "ATL", "BOS", &AnalyzerConfig::default());
        let sheets = report_sheets(&report);
        let names: Vec<&str> = sheets.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Window", "Players", "Trends", "Alerts", "Legs"]);
        assert_eq!(sheets[0].data_rows(), report.dates.len());
        assert_eq!(sheets[1].data_rows(), report.players.len());
        assert_eq!(sheets[2].data_rows(), report.players.len() * Stat::ALL.len());
        assert_eq!(sheets[4].data_rows(), report.legs.total());

        let players = &sheets[1].rows;
        assert_eq!(players[0][3], "Attendance");
        let first = &report.players[0].aggregate;
        assert_eq!(players[1][3], format!("{:.0}%", first.attendance() * 100.0));
        assert_eq!(players[0].len(), 8 + report.dates.len());
    }

    #[test]
    fn export_name_is_lowercase() {
        let table = generate(&DemoConfig::default());
        let report = compute_matchup_report(&table, "atl", "bos", &AnalyzerConfig::default());
        assert_eq!(default_export_name(&report), "matchup_atl_bos.xlsx");
    }
}
