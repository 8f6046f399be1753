//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing the input directories, then
//! runs the same pipeline as `demand run` and renders the dashboard across a
//! set of views: time series, distribution, correlation heatmap, residuals,
//! seasonal decomposition, and the report tables.
//!
//! A degraded stage shows its placeholder message in place of the chart; the
//! UI itself never aborts on bad data.

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
    widgets::{BarChart, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table as TableWidget, Tabs},
    Terminal,
};

use crate::app::pipeline::{DashboardBundle, RunOutput, build_dashboard, run_pipeline};
use crate::domain::PipelineConfig;
use crate::error::AppError;
use crate::plot::{CorrelationFigure, DecompositionFigure, Figure, ResidualFigure, TimeSeriesFigure, UnivariateFigure};

mod plotters_chart;

use plotters_chart::DemandChart;

const VIEWS: [&str; 6] = [
    "Series",
    "Distribution",
    "Correlation",
    "Residuals",
    "Decomposition",
    "Tables",
];

/// Start the TUI.
pub fn run(config: PipelineConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config);
    app.refresh();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
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

struct App {
    config: PipelineConfig,
    selected_field: usize,
    editing: bool,
    edit_buffer: String,
    view: usize,
    status: String,
    run: Option<RunOutput>,
    bundle: Option<DashboardBundle>,
}

impl App {
    fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            selected_field: 0,
            editing: false,
            edit_buffer: String::new(),
            view: 0,
            status: "Running pipeline...".to_string(),
            run: None,
            bundle: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            self.handle_path_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Enter => {
                self.edit_buffer = self.selected_path().display().to_string();
                self.editing = true;
                self.status =
                    "Editing path. Enter to apply and rerun, Esc to cancel.".to_string();
            }
            KeyCode::Tab | KeyCode::Right => {
                self.view = (self.view + 1) % VIEWS.len();
            }
            KeyCode::Left => {
                self.view = (self.view + VIEWS.len() - 1) % VIEWS.len();
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        false
    }

    fn handle_path_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Path edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                let path = std::path::PathBuf::from(self.edit_buffer.trim());
                match self.selected_field {
                    0 => self.config.usage_dir = path,
                    _ => self.config.weather_dir = path,
                }
                self.refresh();
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.edit_buffer.push(c);
            }
            _ => {}
        }
    }

    fn selected_path(&self) -> &std::path::Path {
        match self.selected_field {
            0 => &self.config.usage_dir,
            _ => &self.config.weather_dir,
        }
    }

    fn refresh(&mut self) {
        match run_pipeline(&self.config) {
            Ok(run) => {
                self.status = format!(
                    "Run complete: clean={} | eda={} | model={}",
                    run.prep.status_label(),
                    run.eda.status_label(),
                    run.model.status_label()
                );
                self.bundle = Some(build_dashboard(&run));
                self.run = Some(run);
            }
            Err(err) => {
                self.status = format!("Run failed: {err}");
                self.run = None;
                self.bundle = None;
            }
        }
    }

    fn export(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        let Some(prep) = run.prep.ready() else {
            self.status = "No cleaned data to export.".to_string();
            return;
        };
        let Some(path) = self.config.export_path.clone() else {
            self.status = "Export disabled by configuration.".to_string();
            return;
        };
        match crate::io::export::write_clean_csv(&path, &prep.dataset) {
            Ok(()) => self.status = format!("Exported {} rows to '{}'.", prep.dataset.len(), path.display()),
            Err(err) => self.status = format!("Export failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(6),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_view(frame, chunks[2]);
        self.draw_settings(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("demand", Style::default().fg(Color::Cyan)),
            Span::raw(" — electricity demand analysis"),
        ]));

        let stages = self
            .run
            .as_ref()
            .map(|r| {
                format!(
                    "clean: {} | eda: {} | model: {}",
                    r.prep.status_label(),
                    r.eda.status_label(),
                    r.model.status_label()
                )
            })
            .unwrap_or_else(|| "no run yet".to_string());
        lines.push(Line::from(Span::styled(
            stages,
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            if let Some(model) = run.model.ready() {
                lines.push(Line::from(Span::styled(
                    format!(
                        "rmse={:.3} | r2={:.4} | train={} test={}",
                        model.metrics.rmse,
                        model.metrics.r2,
                        model.train_rows,
                        model.test_rows
                    ),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(VIEWS.iter().map(|v| Line::from(*v)))
            .select(self.view)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_view(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(VIEWS[self.view])
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(bundle) = &self.bundle else {
            self.draw_message(frame, inner, "Waiting for a run (press r).");
            return;
        };

        match self.view {
            0 => self.draw_figure(frame, inner, &bundle.time_series),
            1 => self.draw_figure(frame, inner, &bundle.univariate),
            2 => self.draw_figure(frame, inner, &bundle.correlation),
            3 => self.draw_figure(frame, inner, &bundle.residual),
            4 => match &bundle.decomposition {
                Some(figure) => self.draw_figure(frame, inner, figure),
                None => self.draw_message(
                    frame,
                    inner,
                    "Seasonal decomposition needs at least a week of hourly data.",
                ),
            },
            _ => self.draw_tables(frame, inner, bundle),
        }
    }

    fn draw_figure(&self, frame: &mut ratatui::Frame<'_>, area: Rect, figure: &Figure) {
        match figure {
            Figure::TimeSeries(f) => self.draw_time_series(frame, area, f),
            Figure::Univariate(f) => self.draw_univariate(frame, area, f),
            Figure::Correlation(f) => self.draw_correlation(frame, area, f),
            Figure::Residual(f) => self.draw_residuals(frame, area, f),
            Figure::Decomposition(f) => self.draw_decomposition(frame, area, f),
            Figure::Placeholder { message, .. } => self.draw_message(frame, area, message),
        }
    }

    fn draw_message(&self, frame: &mut ratatui::Frame<'_>, area: Rect, message: &str) {
        let msg = Paragraph::new(message.to_string())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default());
        frame.render_widget(msg, area);
    }

    fn draw_time_series(&self, frame: &mut ratatui::Frame<'_>, area: Rect, f: &TimeSeriesFigure) {
        let Some((x_bounds, y_bounds)) = series_bounds(&[&f.points, &f.trend]) else {
            self.draw_message(frame, area, "No data to plot.");
            return;
        };

        let widget = DemandChart {
            line: &f.points,
            overlay: &f.trend,
            points: &[],
            highlights: &f.peaks,
            x_bounds,
            y_bounds,
            x_label: "row",
            y_label: "usage",
            fmt_x: fmt_axis_int,
            fmt_y: fmt_axis_f1,
        };
        frame.render_widget(widget, area);
    }

    fn draw_univariate(&self, frame: &mut ratatui::Frame<'_>, area: Rect, f: &UnivariateFigure) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        // Histogram as a bar chart; bars labeled by bin center.
        let labels: Vec<String> = f
            .histogram
            .bins
            .iter()
            .map(|(center, _)| format!("{center:.0}"))
            .collect();
        let data: Vec<(&str, u64)> = labels
            .iter()
            .map(String::as_str)
            .zip(f.histogram.bins.iter().map(|&(_, c)| c as u64))
            .collect();
        let bars = BarChart::default()
            .block(Block::default().title("histogram").borders(Borders::ALL))
            .bar_width(3)
            .bar_gap(1)
            .data(&data);
        frame.render_widget(bars, chunks[0]);

        // Hourly profile with the box-plot numbers underneath.
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(chunks[1]);

        if let Some((x_bounds, y_bounds)) = series_bounds(&[&f.hourly_mean]) {
            let widget = DemandChart {
                line: &f.hourly_mean,
                overlay: &[],
                points: &f.hourly_mean,
                highlights: &[],
                x_bounds,
                y_bounds,
                x_label: "hour",
                y_label: "mean usage",
                fmt_x: fmt_axis_int,
                fmt_y: fmt_axis_f1,
            };
            let block = Block::default().title("hourly profile").borders(Borders::ALL);
            let inner = block.inner(right[0]);
            frame.render_widget(block, right[0]);
            frame.render_widget(widget, inner);
        }

        let b = &f.box_stats;
        let box_line = format!(
            "box: q1={:.1} med={:.1} q3={:.1} whiskers=[{:.1}, {:.1}] outliers={}",
            b.q1,
            b.median,
            b.q3,
            b.whisker_low,
            b.whisker_high,
            b.outliers.len()
        );
        frame.render_widget(
            Paragraph::new(box_line).block(Block::default().borders(Borders::ALL)),
            right[1],
        );
    }

    fn draw_correlation(&self, frame: &mut ratatui::Frame<'_>, area: Rect, f: &CorrelationFigure) {
        let mut rows = Vec::with_capacity(f.labels.len());
        for (i, label) in f.labels.iter().enumerate() {
            let mut cells = vec![Cell::from(label.clone())];
            for j in 0..f.labels.len() {
                let r = f.values[i][j];
                cells.push(
                    Cell::from(format!("{r:+.2}")).style(Style::default().bg(heat_color(r))),
                );
            }
            rows.push(Row::new(cells));
        }

        let mut header = vec![Cell::from("")];
        header.extend(f.labels.iter().map(|l| Cell::from(truncate(l, 8))));

        let mut widths = vec![Constraint::Length(18)];
        widths.extend(std::iter::repeat_n(Constraint::Length(9), f.labels.len()));

        let table = TableWidget::new(rows, widths)
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)));
        frame.render_widget(table, area);
    }

    fn draw_residuals(&self, frame: &mut ratatui::Frame<'_>, area: Rect, f: &ResidualFigure) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(38),
                Constraint::Percentage(38),
                Constraint::Percentage(24),
            ])
            .split(area);

        if let Some((x_bounds, y_bounds)) = series_bounds(&[&f.actual_vs_predicted]) {
            // Identity line for reference.
            let lo = x_bounds[0].min(y_bounds[0]);
            let hi = x_bounds[1].max(y_bounds[1]);
            let identity = [(lo, lo), (hi, hi)];
            let widget = DemandChart {
                line: &identity,
                overlay: &[],
                points: &f.actual_vs_predicted,
                highlights: &[],
                x_bounds: [lo, hi],
                y_bounds: [lo, hi],
                x_label: "actual",
                y_label: "predicted",
                fmt_x: fmt_axis_f1,
                fmt_y: fmt_axis_f1,
            };
            let block = Block::default()
                .title("actual vs predicted")
                .borders(Borders::ALL);
            let inner = block.inner(chunks[0]);
            frame.render_widget(block, chunks[0]);
            frame.render_widget(widget, inner);
        }

        if let Some((x_bounds, y_bounds)) = series_bounds(&[&f.residual_vs_predicted]) {
            let zero = [(x_bounds[0], 0.0), (x_bounds[1], 0.0)];
            let y_bounds = [y_bounds[0].min(0.0), y_bounds[1].max(0.0)];
            let widget = DemandChart {
                line: &zero,
                overlay: &[],
                points: &f.residual_vs_predicted,
                highlights: &[],
                x_bounds,
                y_bounds,
                x_label: "predicted",
                y_label: "residual",
                fmt_x: fmt_axis_f1,
                fmt_y: fmt_axis_f1,
            };
            let block = Block::default()
                .title("residual vs predicted")
                .borders(Borders::ALL);
            let inner = block.inner(chunks[1]);
            frame.render_widget(block, chunks[1]);
            frame.render_widget(widget, inner);
        }

        let labels: Vec<String> = f
            .residual_histogram
            .bins
            .iter()
            .map(|(center, _)| format!("{center:.0}"))
            .collect();
        let data: Vec<(&str, u64)> = labels
            .iter()
            .map(String::as_str)
            .zip(f.residual_histogram.bins.iter().map(|&(_, c)| c as u64))
            .collect();
        let bars = BarChart::default()
            .block(
                Block::default()
                    .title("residual histogram")
                    .borders(Borders::ALL),
            )
            .bar_width(2)
            .bar_gap(1)
            .data(&data);
        frame.render_widget(bars, chunks[2]);
    }

    fn draw_decomposition(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        f: &DecompositionFigure,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ])
            .split(area);

        let panels: [(&str, &[(f64, f64)]); 4] = [
            ("observed", &f.observed),
            ("trend", &f.trend),
            ("seasonal", &f.seasonal),
            ("residual", &f.residual),
        ];

        for ((title, series), chunk) in panels.into_iter().zip(chunks.iter()) {
            let block = Block::default().title(title).borders(Borders::ALL);
            let inner = block.inner(*chunk);
            frame.render_widget(block, *chunk);

            let Some((x_bounds, y_bounds)) = series_bounds(&[series]) else {
                continue;
            };
            let widget = DemandChart {
                line: series,
                overlay: &[],
                points: &[],
                highlights: &[],
                x_bounds,
                y_bounds,
                x_label: "",
                y_label: "",
                fmt_x: fmt_axis_int,
                fmt_y: fmt_axis_f1,
            };
            frame.render_widget(widget, inner);
        }
    }

    fn draw_tables(&self, frame: &mut ratatui::Frame<'_>, area: Rect, bundle: &DashboardBundle) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let mut left = format!(
            "{}\n{}",
            crate::report::format::format_table(&bundle.summary_table),
            crate::report::format::format_table(&bundle.errors)
        );
        if let Some(prep) = self.run.as_ref().and_then(|r| r.prep.ready()) {
            left.push('\n');
            left.push_str(&crate::report::format::format_table(
                &crate::report::cleaning_table(prep),
            ));
        }
        let right = format!(
            "{}\n{}",
            crate::report::format::format_table(&bundle.metrics_table),
            crate::report::format::format_table(&bundle.coefficients_table)
        );

        frame.render_widget(Paragraph::new(left), chunks[0]);
        frame.render_widget(Paragraph::new(right), chunks[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Usage dir:   {}", self.config.usage_dir.display())),
            ListItem::new(format!(
                "Weather dir: {}",
                self.config.weather_dir.display()
            )),
            ListItem::new(format!(
                "Export:      {}",
                self.config
                    .export_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(disabled)".to_string())
            )),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);

        if self.editing {
            let hint = Paragraph::new(format!("> {}", self.edit_buffer)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Enter edit path  Tab/←/→ view  r run  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Padded bounds covering every listed series. `None` when nothing to plot.
fn series_bounds(series: &[&[(f64, f64)]]) -> Option<([f64; 2], [f64; 2])> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for &(x, y) in *s {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
        return None;
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    Some(([x_min, x_max], [y_min - pad, y_max + pad]))
}

/// Map r in [-1, 1] to a blue..black..red background.
fn heat_color(r: f64) -> Color {
    let r = r.clamp(-1.0, 1.0);
    if r >= 0.0 {
        Color::Rgb((r * 200.0) as u8, 30, 30)
    } else {
        Color::Rgb(30, 30, (-r * 200.0) as u8)
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn fmt_axis_int(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_f1(v: f64) -> String {
    format!("{v:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_series_with_padding() {
        let a = [(0.0, 1.0), (10.0, 5.0)];
        let b = [(2.0, -3.0)];
        let (x, y) = series_bounds(&[&a, &b]).unwrap();
        assert_eq!(x, [0.0, 10.0]);
        assert!(y[0] < -3.0 && y[1] > 5.0);
    }

    #[test]
    fn empty_series_have_no_bounds() {
        assert!(series_bounds(&[&[]]).is_none());
    }

    #[test]
    fn heat_color_is_red_for_positive_blue_for_negative() {
        assert!(matches!(heat_color(1.0), Color::Rgb(200, 30, 30)));
        assert!(matches!(heat_color(-1.0), Color::Rgb(30, 30, 200)));
    }
}
