//! Ratatui-based terminal UI.
//!
//! Four tabs mirror the dashboard sections: time series, summary statistics,
//! curve-fit analysis and exports. Toggles only change presentation; a reseed
//! replaces the whole `Analysis`.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Terminal,
};

use crate::app::pipeline::{self, Analysis, DataSource};
use crate::chart::{self, ChartSpec};
use crate::domain::{ExportKind, RunConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::EpiPlottersChart;

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    // Load before touching the terminal so load errors and warnings print normally.
    let analysis = pipeline::run_analysis(&config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, analysis);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Timeseries,
    Statistics,
    Analysis,
    Export,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Timeseries, Tab::Statistics, Tab::Analysis, Tab::Export];

    fn title(self) -> &'static str {
        match self {
            Tab::Timeseries => "1 Timeseries",
            Tab::Statistics => "2 Statistics",
            Tab::Analysis => "3 Analysis",
            Tab::Export => "4 Export",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
}

struct App {
    config: RunConfig,
    analysis: Analysis,
    tab: Tab,
    status: String,
}

impl App {
    fn new(config: RunConfig, analysis: Analysis) -> Self {
        let status = match &analysis.source {
            DataSource::Fallback { reason, .. } => format!("Input failed to load ({reason}); showing demo data."),
            other => format!("Loaded {}.", other.describe()),
        };
        Self {
            config,
            analysis,
            tab: Tab::Timeseries,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.tab = Tab::ALL[idx];
            }
            KeyCode::Char('l') => {
                self.config.dash.log_scale = !self.config.dash.log_scale;
                self.status = format!("log scale: {}", on_off(self.config.dash.log_scale));
            }
            KeyCode::Char('v') => {
                self.config.dash.show_vaccination = !self.config.dash.show_vaccination;
                self.status = format!("vaccination: {}", on_off(self.config.dash.show_vaccination));
            }
            KeyCode::Char('r') => self.reseed()?,
            KeyCode::Char('c') => self.export(ExportKind::Csv),
            KeyCode::Char('j') => self.export(ExportKind::Json),
            KeyCode::Char('s') => self.export(ExportKind::Summary),
            _ => {}
        }

        Ok(false)
    }

    fn reseed(&mut self) -> Result<(), AppError> {
        if !self.analysis.source.is_demo() {
            self.status = "Reseed only applies to demo data.".to_string();
            return Ok(());
        }

        self.config.demo.seed = self.config.demo.seed.wrapping_add(1);
        let table = crate::data::generate_demo(&self.config.demo)?;
        let seed = self.config.demo.seed;
        self.analysis = pipeline::analyze(table, DataSource::Demo { seed });
        self.status = format!("Regenerated demo data (seed {seed}).");
        Ok(())
    }

    fn export(&mut self, kind: ExportKind) {
        let result = crate::io::export::write_exports(
            &self.config.export_dir,
            kind,
            &self.analysis.table,
            &self.analysis.summary,
            self.analysis.fit_ok(),
        );
        self.status = match result {
            Ok(paths) => {
                let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                format!("Wrote {}", names.join(", "))
            }
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        match self.tab {
            Tab::Timeseries => self.draw_timeseries(frame, chunks[2]),
            Tab::Statistics => self.draw_statistics(frame, chunks[2]),
            Tab::Analysis => self.draw_analysis(frame, chunks[2]),
            Tab::Export => self.draw_export(frame, chunks[2]),
        }
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("epi", Style::default().fg(Color::Cyan)),
                Span::raw(" | Disease Spread Analysis"),
            ]),
            Line::from(Span::styled(
                format!(
                    "source: {} | rows: {} | log scale: {} | vaccination: {}",
                    self.analysis.source.describe(),
                    self.analysis.table.len(),
                    on_off(self.config.dash.log_scale),
                    on_off(self.config.dash.show_vaccination),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .select(self.tab.index())
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(tabs, area);
    }

    fn draw_timeseries(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let spec = chart::timeseries_chart(&self.analysis.table, &self.config.dash);
        draw_chart(frame, area, &spec);
    }

    fn draw_statistics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        let rows = crate::io::export::summary_rows(&self.analysis.summary, None);
        let lines: Vec<Line> = rows
            .into_iter()
            .map(|(metric, value)| {
                Line::from(vec![
                    Span::styled(format!("{metric:<22}"), Style::default().fg(Color::Gray)),
                    Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
                ])
            })
            .collect();
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Key Metrics").borders(Borders::ALL));
        frame.render_widget(p, chunks[0]);

        let spec = chart::stacked_area_chart(&self.analysis.table);
        draw_chart(frame, chunks[1], &spec);
    }

    fn draw_analysis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0)])
            .split(area);

        let fit_text = crate::report::format_fit_section(&self.analysis.fit);
        let p = Paragraph::new(fit_text)
            .block(Block::default().title("Curve Fitting").borders(Borders::ALL));
        frame.render_widget(p, chunks[0]);

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        match self.analysis.fit_ok() {
            Some(fit) => {
                let spec = chart::fit_overlay_chart(&self.analysis.table, fit);
                draw_chart(frame, charts[0], &spec);
            }
            None => {
                let msg = Paragraph::new("Could not fit curve.")
                    .style(Style::default().fg(Color::Yellow))
                    .block(Block::default().title("Logistic Curve Fit").borders(Borders::ALL));
                frame.render_widget(msg, charts[0]);
            }
        }

        let spec = chart::delta_chart(&self.analysis.deltas);
        draw_chart(frame, charts[1], &spec);
    }

    fn draw_export(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let dir = self.config.export_dir.display();
        let lines = vec![
            Line::from(format!("Export directory: {dir}")),
            Line::from(""),
            Line::from(format!("c  table as CSV   -> {}", crate::io::export::TABLE_CSV_FILE)),
            Line::from(format!("j  table as JSON  -> {}", crate::io::export::TABLE_JSON_FILE)),
            Line::from(format!("s  summary CSV    -> {}", crate::io::export::SUMMARY_CSV_FILE)),
        ];
        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Export Data").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "1-4/Tab tabs  l log  v vaccination  r reseed  c/j/s export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Bordered Plotters chart with a one-line colored legend underneath.
fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, spec: &ChartSpec) {
    let block = Block::default().title(spec.title.as_str()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(EpiPlottersChart { spec }, chunks[0]);
    frame.render_widget(Paragraph::new(legend_line(spec)), chunks[1]);
}

fn legend_line(spec: &ChartSpec) -> Line<'static> {
    let mut spans = Vec::new();
    for s in &spec.series {
        let c = s.color;
        spans.push(Span::styled("■ ", Style::default().fg(Color::Rgb(c.0, c.1, c.2))));
        spans.push(Span::raw(format!("{}  ", s.name)));
    }
    Line::from(spans)
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{DashConfig, DemoOptions, Record, TimeSeriesTable};

    fn config(export_dir: PathBuf) -> RunConfig {
        RunConfig {
            input: None,
            strict: false,
            demo: DemoOptions { points: 30, seed: 5 },
            dash: DashConfig::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_dir,
        }
    }

    fn demo_app(export_dir: PathBuf) -> App {
        let cfg = config(export_dir);
        let analysis = pipeline::run_analysis(&cfg).unwrap();
        App::new(cfg, analysis)
    }

    #[test]
    fn tab_keys_switch_sections() {
        let mut app = demo_app(PathBuf::from("."));
        assert_eq!(app.tab, Tab::Timeseries);
        app.handle_key(KeyCode::Char('3')).unwrap();
        assert_eq!(app.tab, Tab::Analysis);
        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.tab, Tab::Export);
        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.tab, Tab::Timeseries);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn toggles_only_change_presentation() {
        let mut app = demo_app(PathBuf::from("."));
        let before = app.analysis.table.clone();
        app.handle_key(KeyCode::Char('l')).unwrap();
        app.handle_key(KeyCode::Char('v')).unwrap();
        assert!(app.config.dash.log_scale);
        assert!(!app.config.dash.show_vaccination);
        assert_eq!(app.analysis.table, before);
    }

    #[test]
    fn reseed_regenerates_demo_data() {
        let mut app = demo_app(PathBuf::from("."));
        let before = app.analysis.table.clone();
        app.handle_key(KeyCode::Char('r')).unwrap();
        assert_eq!(app.config.demo.seed, 6);
        assert_eq!(app.analysis.source, DataSource::Demo { seed: 6 });
        assert_ne!(app.analysis.table, before);
    }

    #[test]
    fn reseed_is_ignored_for_file_data() {
        let records = (0..3)
            .map(|i| Record {
                t: i as f64,
                healthy: 10.0,
                infected: 1.0,
                recovered: 0.0,
                vaccinated: None,
            })
            .collect();
        let table = TimeSeriesTable::new(records).unwrap();
        let analysis = pipeline::analyze(table.clone(), DataSource::File(PathBuf::from("d.csv")));
        let mut app = App::new(config(PathBuf::from(".")), analysis);

        app.handle_key(KeyCode::Char('r')).unwrap();
        assert_eq!(app.analysis.table, table);
        assert!(app.status.contains("demo"));
    }

    #[test]
    fn export_keys_write_files() {
        let scratch = tempfile::tempdir().unwrap();
        let dir = scratch.path().join("out");
        let mut app = demo_app(dir.clone());

        app.handle_key(KeyCode::Char('c')).unwrap();
        app.handle_key(KeyCode::Char('j')).unwrap();
        app.handle_key(KeyCode::Char('s')).unwrap();
        assert!(app.status.starts_with("Wrote"));

        assert!(dir.join("disease_data.csv").is_file());
        assert!(dir.join("disease_data.json").is_file());
        assert!(dir.join("summary.csv").is_file());
    }
}
