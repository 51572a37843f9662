use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use nba_analyzer::aggregate::Availability;
use nba_analyzer::config::{AppConfig, DataSource};
use nba_analyzer::export::default_export_name;
use nba_analyzer::feed::spawn_provider;
use nba_analyzer::legs::LegTier;
use nba_analyzer::report::{MatchupReport, PlayerReport, ValueBand};
use nba_analyzer::state::{
    AppState, DataStatus, Delta, ProviderCommand, Screen, apply_delta,
};
use nba_analyzer::trend::TrendSlot;
use nba_analyzer::{game_log::Stat, logging};

const AGENDA_REFRESH_SECS: u64 = 300;

struct App {
    state: AppState,
    cfg: AppConfig,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    agenda_refresh: Duration,
    last_agenda_refresh: Option<Instant>,
}

impl App {
    fn new(cfg: AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            cfg,
            should_quit: false,
            cmd_tx,
            agenda_refresh: Duration::from_secs(AGENDA_REFRESH_SECS),
            last_agenda_refresh: None,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter | KeyCode::Char('d') => self.open_selected(),
            KeyCode::Char('b') | KeyCode::Esc => self.state.back_to_agenda(),
            KeyCode::Tab => self.state.cycle_stat_tab(),
            KeyCode::Char('a') => self.request_agenda(true),
            KeyCode::Char('r') => {
                self.send(ProviderCommand::RefreshData, "Refresh");
            }
            KeyCode::Char('e') => self.request_export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_delta(&mut self, delta: Delta) {
        let reload = matches!(delta, Delta::DataLoaded { .. });
        apply_delta(&mut self.state, delta);
        // New data: recompute whatever matchup is on screen.
        if reload && let Screen::Matchup { team_a, team_b } = self.state.screen.clone() {
            self.state.report_loading = true;
            self.send(ProviderCommand::LoadMatchup { team_a, team_b }, "Matchup");
        }
    }

    fn open_selected(&mut self) {
        if !matches!(self.state.screen, Screen::Agenda) {
            return;
        }
        let Some(game) = self.state.selected_game() else {
            self.state.push_log("[INFO] No game selected");
            return;
        };
        let (team_a, team_b) = (game.visitor.clone(), game.home.clone());
        self.state.open_matchup(&team_a, &team_b);
        self.send(
            ProviderCommand::LoadMatchup {
                team_a: team_a.clone(),
                team_b: team_b.clone(),
            },
            "Matchup",
        );
        let due = self
            .state
            .rosters_due(&[team_a, team_b], Instant::now(), self.cfg.cache_ttl);
        if !due.is_empty() {
            self.send(ProviderCommand::FetchRosters { teams: due }, "Roster");
        }
    }

    fn request_export(&mut self) {
        let Some(report) = self.state.report.as_ref() else {
            self.state.push_log("[INFO] Open a matchup before exporting");
            return;
        };
        let path = self.cfg.data_dir.join(default_export_name(report));
        let cmd = ProviderCommand::ExportReport {
            path: path.display().to_string(),
            team_a: report.team_a.clone(),
            team_b: report.team_b.clone(),
        };
        self.send(cmd, "Export");
    }

    fn request_agenda(&mut self, announce: bool) {
        self.state.agenda_loading = true;
        if self.send(ProviderCommand::FetchAgenda, "Agenda") && announce {
            self.state.push_log("[INFO] Agenda request sent");
        }
        self.last_agenda_refresh = Some(Instant::now());
    }

    fn maybe_refresh_agenda(&mut self) {
        if !matches!(self.state.screen, Screen::Agenda) {
            return;
        }
        let due = self
            .last_agenda_refresh
            .is_none_or(|t| t.elapsed() >= self.agenda_refresh);
        if due {
            self.request_agenda(false);
        }
    }

    fn send(&mut self, cmd: ProviderCommand, what: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
            return false;
        }
        true
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    let log_ready = logging::init_file(&cfg.log_file);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(cfg.clone(), tx, cmd_rx);

    let mut app = App::new(cfg, Some(cmd_tx));
    if let Err(err) = log_ready {
        app.state.push_log(format!("[WARN] File logging disabled: {err}"));
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            app.on_delta(delta);
        }

        app.maybe_refresh_agenda();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &app.state.screen {
        Screen::Agenda => render_agenda(frame, chunks[1], &app.state),
        Screen::Matchup { .. } => render_matchup(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    frame.render_widget(Paragraph::new(footer_text(&app.state)), chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let source = match app.cfg.data_source {
        DataSource::Csv => "csv",
        DataSource::Demo => "demo",
    };
    let data = match &app.state.data {
        DataStatus::Unknown => "data: -".to_string(),
        DataStatus::Loading => "data: loading".to_string(),
        DataStatus::Ready { rows, latest } => format!(
            "data: {rows} rows, last game {}",
            latest
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        DataStatus::Failed(_) => "data: error".to_string(),
    };
    let title = match &app.state.screen {
        Screen::Agenda => "NBA H2H | Agenda".to_string(),
        Screen::Matchup { team_a, team_b } => format!("NBA H2H | {team_a} vs {team_b}"),
    };
    let export = if app.state.export.active {
        " | exporting".to_string()
    } else {
        String::new()
    };
    format!("{title} | {source} | {data}{export}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Agenda => {
            "j/k Move | Enter Matchup | a Agenda | r Refresh data | ? Help | q Quit".to_string()
        }
        Screen::Matchup { .. } => {
            "b Back | Tab Stat | j/k Scroll | e Export | r Refresh data | ? Help | q Quit".to_string()
        }
    }
}

fn render_agenda(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.agenda.is_empty() {
        let msg = if state.agenda_loading {
            "Loading agenda..."
        } else {
            "No games scheduled"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let mut lines = Vec::new();
    let mut idx = 0usize;
    for day in &state.agenda {
        lines.push(Line::from(Span::styled(
            format!("{} ({} games)", day.label, day.games.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for game in &day.games {
            let selected = idx == state.selected;
            let style = if selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "{} {:>5}  {} @ {}",
                    if selected { ">" } else { " " },
                    game.time,
                    game.visitor,
                    game.home
                ),
                style,
            )));
            idx += 1;
        }
        lines.push(Line::from(""));
    }

    // Keep the cursor on screen: each day adds a header and a spacer row.
    let cursor_row = state.selected as u16 + 2 * day_index(state) as u16 + 1;
    let scroll = cursor_row.saturating_sub(area.height.saturating_sub(1));
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn day_index(state: &AppState) -> usize {
    let mut seen = 0usize;
    for (i, day) in state.agenda.iter().enumerate() {
        seen += day.games.len();
        if state.selected < seen {
            return i;
        }
    }
    state.agenda.len().saturating_sub(1)
}

fn render_matchup(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(report) = state.report.as_ref() else {
        let msg = if state.report_loading {
            "Computing matchup..."
        } else {
            "No report"
        };
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    };
    if report.is_empty() {
        let msg = format!(
            "No recorded meetings between {} and {}",
            report.team_a, report.team_b
        );
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(columns[1]);

    let players = Paragraph::new(player_lines(report, state))
        .scroll((state.player_scroll, 0))
        .block(
            Block::default()
                .title(format!(" Players | {} ", state.stat_tab.label()))
                .borders(Borders::ALL),
        );
    frame.render_widget(players, columns[0]);

    let alerts = Paragraph::new(alert_lines(report))
        .wrap(Wrap { trim: true })
        .block(Block::default().title(" Patterns ").borders(Borders::ALL));
    frame.render_widget(alerts, right[0]);

    let legs = Paragraph::new(leg_lines(report))
        .block(Block::default().title(" Legs ").borders(Borders::ALL));
    frame.render_widget(legs, right[1]);
}

fn player_lines<'a>(report: &'a MatchupReport, state: &AppState) -> Vec<Line<'a>> {
    let stat = state.stat_tab;
    let (wins, losses) = report.series_record();
    let mut lines = vec![Line::from(format!(
        "{} {}-{} in the last {} meetings",
        report.team_a,
        wins,
        losses,
        report.dates.len()
    ))];
    let dates = report
        .headers
        .iter()
        .map(|h| {
            let result = h.result.map(|r| r.as_str()).unwrap_or("-");
            format!("{} {}", h.label, result)
        })
        .collect::<Vec<_>>()
        .join(" | ");
    lines.push(Line::from(Span::styled(
        dates,
        Style::default().fg(Color::DarkGray),
    )));

    for team in [report.team_a.as_str(), report.team_b.as_str()] {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            team.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for player in report.players_for(team) {
            lines.push(player_line(player, stat, state));
        }
    }
    lines
}

fn player_line<'a>(player: &'a PlayerReport, stat: Stat, state: &AppState) -> Line<'a> {
    let agg = &player.aggregate;
    let mean = agg.mean(stat);
    let jersey = state
        .jersey(&agg.team, &agg.player_name)
        .map(|n| format!("#{n}"))
        .unwrap_or_default();
    let mut spans = vec![Span::raw(format!(
        "{:<4}{:<24} {}/{} {:>5.1}  ",
        jersey, agg.player_name, agg.games_played, agg.window_len, mean
    ))];

    if let Some(series) = player.trend(stat) {
        for (i, slot) in series.slots.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("/"));
            }
            let style = match slot {
                TrendSlot::Value(v) => band_style(ValueBand::classify(*v, mean, stat)),
                TrendSlot::Absent => Style::default().fg(Color::DarkGray),
            };
            spans.push(Span::styled(slot.display(), style));
        }
    }
    spans.push(Span::raw("  "));
    spans.extend(agg.availability.iter().map(|a| {
        let color = match a {
            Availability::Played => Color::Green,
            Availability::Missing => Color::Red,
            Availability::NotApplicable => Color::DarkGray,
        };
        Span::styled(a.marker(), Style::default().fg(color))
    }));
    Line::from(spans)
}

fn band_style(band: ValueBand) -> Style {
    match band {
        ValueBand::Above => Style::default().fg(Color::Green),
        ValueBand::Near => Style::default().fg(Color::Yellow),
        ValueBand::Below => Style::default().fg(Color::Red),
    }
}

fn alert_lines(report: &MatchupReport) -> Vec<Line<'static>> {
    if report.alerts.is_empty() {
        return vec![Line::from(Span::styled(
            "No replacement patterns",
            Style::default().fg(Color::DarkGray),
        ))];
    }
    report
        .alerts
        .iter()
        .map(|alert| {
            Line::from(vec![
                Span::styled(
                    format!("{} {} ", alert.date.format("%d/%m/%y"), alert.team),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("without {}: ", alert.missing_names().join(", ")),
                    Style::default().fg(Color::Red),
                ),
                Span::styled(
                    alert.descriptions().join(", "),
                    Style::default().fg(Color::Green),
                ),
            ])
        })
        .collect()
}

fn leg_lines(report: &MatchupReport) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for pool in &report.legs.pools {
        let color = match pool.tier {
            LegTier::Safe => Color::Green,
            LegTier::Risky => Color::Magenta,
        };
        lines.push(Line::from(Span::styled(
            pool.title(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        let body_style = if pool.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.extend(
            pool.display_lines()
                .into_iter()
                .map(|l| Line::from(Span::styled(format!("  {l}"), body_style))),
        );
    }
    lines
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "NBA H2H - Help",
        "",
        "Agenda:",
        "  j/k or ↑/↓   Move",
        "  Enter / d    Open matchup (visitor first)",
        "  a            Reload agenda",
        "",
        "Matchup:",
        "  Tab          Cycle PTS / REB / AST / MIN",
        "  j/k          Scroll players",
        "  e            Export to XLSX",
        "  b / Esc      Back",
        "",
        "Global:",
        "  r            Refresh game logs",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Cells: green above mean, yellow near, red below.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
