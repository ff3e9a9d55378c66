//! Interactive terminal dashboard: five analytics charts, a summary
//! strip, tail tables, and a keyboard-driven 24h window slider.

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
};
use std::io;
use std::time::Duration;

use crate::analysis::ANOMALY_THRESHOLD;
use crate::model::{PriceSample, PriceSeries, Signal};
use crate::storage::CachedLoader;
use crate::view::{DashboardView, build_view, format_usd, hhmm, x_extent, y_extent};

// --- App State ---

/// Sidebar entries, in selection order.
const CHARTS: [&str; 5] = [
    "Price",
    "Price + SMA",
    "Volatility",
    "Anomalies",
    "Signals",
];

/// Which end of the time window the arrow keys move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle {
    Start,
    End,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
    Reload,
}

struct App {
    series: PriceSeries,
    /// First and last sample timestamps; the window cannot leave it.
    span: (DateTime<Utc>, DateTime<Utc>),
    /// Currently selected window, inclusive on both ends.
    range: (DateTime<Utc>, DateTime<Utc>),
    focused: Handle,
    selected_chart: usize,
    view: DashboardView,
    status: Option<String>,
}

impl App {
    fn new(series: PriceSeries) -> Self {
        let span = full_span(&series);
        let mut app = Self {
            series,
            span,
            range: span,
            focused: Handle::Start,
            selected_chart: 0,
            view: DashboardView::default(),
            status: None,
        };
        app.rebuild();
        app
    }

    fn rebuild(&mut self) {
        self.view = build_view(&self.series, self.range);
    }

    fn toggle_handle(&mut self) {
        self.focused = match self.focused {
            Handle::Start => Handle::End,
            Handle::End => Handle::Start,
        };
    }

    /// Moves the focused handle by whole minutes, clamped to the data span.
    /// The handles may meet but never cross.
    fn step_focused(&mut self, minutes: i64) {
        let delta = chrono::Duration::minutes(minutes);
        match self.focused {
            Handle::Start => {
                let moved = clamp_time(self.range.0 + delta, self.span);
                self.range.0 = moved.min(self.range.1);
            }
            Handle::End => {
                let moved = clamp_time(self.range.1 + delta, self.span);
                self.range.1 = moved.max(self.range.0);
            }
        }
        self.rebuild();
    }

    fn reset_range(&mut self) {
        self.range = self.span;
        self.rebuild();
    }

    fn previous_chart(&mut self) {
        self.selected_chart = self
            .selected_chart
            .checked_sub(1)
            .unwrap_or(CHARTS.len() - 1);
    }

    fn next_chart(&mut self) {
        self.selected_chart = (self.selected_chart + 1) % CHARTS.len();
    }

    /// Re-reads the data file, bypassing the loader cache. The window
    /// resets to the new full span; on failure the old data stays up and
    /// the error lands in the sidebar.
    async fn reload(&mut self, loader: &mut CachedLoader) {
        loader.invalidate();
        match loader.load().await {
            Ok(series) => {
                self.series = series.clone();
                self.span = full_span(&self.series);
                self.range = self.span;
                self.status = None;
                self.rebuild();
            }
            Err(e) => self.status = Some(format!("Reload failed: {e}")),
        }
    }
}

fn full_span(series: &[PriceSample]) -> (DateTime<Utc>, DateTime<Utc>) {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => {
            let now = Utc::now();
            (now, now)
        }
    }
}

fn clamp_time(t: DateTime<Utc>, span: (DateTime<Utc>, DateTime<Utc>)) -> DateTime<Utc> {
    t.max(span.0).min(span.1)
}

// --- TUI ---

pub async fn run_tui() -> Result<()> {
    // Load before touching the terminal so a missing data file prints a
    // plain error instead of garbling an alternate screen.
    let mut loader = CachedLoader::default();
    let series = loader.load().await?.clone();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut loader, series).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    loader: &mut CachedLoader,
    series: PriceSeries,
) -> Result<()> {
    let mut app = App::new(series);

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => match handle_key_event(key, &mut app) {
                    Action::Quit => return Ok(()),
                    Action::Reload => app.reload(loader).await,
                    Action::Continue => {}
                },
                Event::Resize(_, _) => {
                    // The next terminal.draw() picks up the new size.
                }
                _ => {}
            }
        }
    }
}

fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
        30
    } else {
        1
    };
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::F(5) => return Action::Reload,
        KeyCode::Char('r') => app.reset_range(),
        KeyCode::Tab => app.toggle_handle(),
        KeyCode::Left => app.step_focused(-step),
        KeyCode::Right => app.step_focused(step),
        KeyCode::Up => app.previous_chart(),
        KeyCode::Down => app.next_chart(),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let digit = c.to_digit(10).unwrap_or(0);
            if digit > 0 && digit <= CHARTS.len() as u32 {
                app.selected_chart = (digit - 1) as usize;
            }
        }
        _ => {}
    }
    Action::Continue
}

// --- Drawing ---

fn ui(f: &mut Frame, app: &App) {
    let main_layout =
        Layout::horizontal([Constraint::Percentage(18), Constraint::Percentage(82)]).split(f.size());
    let content = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(3),
        Constraint::Length(12),
    ])
    .split(main_layout[1]);

    draw_sidebar(f, app, main_layout[0]);
    draw_summary(f, app, content[0]);
    draw_chart(f, app, content[1]);
    draw_slider(f, app, content[2]);
    draw_tables(f, app, content[3]);
}

fn draw_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Charts");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(8)]).split(inner);

    let chart_lines: Vec<Line> = CHARTS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut line = Line::from(format!("{}. {}", i + 1, name));
            if i == app.selected_chart {
                line = line.style(Style::default().fg(Color::Yellow).bg(Color::DarkGray));
            }
            line
        })
        .collect();
    f.render_widget(Paragraph::new(chart_lines), chunks[0]);

    let mut hints = vec![
        Line::from("1-5 / Up / Down: chart"),
        Line::from("Tab: switch handle"),
        Line::from("Left/Right: step 1m"),
        Line::from("Shift+arrow: step 30m"),
        Line::from("r: reset window"),
        Line::from("F5: reload file"),
        Line::from("q: quit"),
    ];
    if let Some(status) = &app.status {
        hints.push(Line::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        ));
    }
    f.render_widget(Paragraph::new(hints), chunks[1]);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let cells = Layout::horizontal([
        Constraint::Percentage(34),
        Constraint::Percentage(33),
        Constraint::Percentage(33),
    ])
    .split(area);

    let (min, max, mean) = match &app.view.summary {
        Some(s) => (format_usd(s.min), format_usd(s.max), format_usd(s.mean)),
        None => ("n/a".to_string(), "n/a".to_string(), "n/a".to_string()),
    };
    for (i, (title, value)) in [
        ("Minimum Price", min),
        ("Maximum Price", max),
        ("Average Price", mean),
    ]
    .into_iter()
    .enumerate()
    {
        f.render_widget(
            Paragraph::new(value)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title)),
            cells[i],
        );
    }
}

fn line_dataset<'a>(name: &'a str, points: &'a [(f64, f64)], color: Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points)
}

fn scatter_dataset<'a>(name: &'a str, points: &'a [(f64, f64)], color: Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Dot)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(color))
        .data(points)
}

fn draw_chart(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.view;
    if view.price_points.is_empty() {
        f.render_widget(
            Paragraph::new("No samples in the data file. Run the `fetch` binary, then press F5.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Chart")),
            area,
        );
        return;
    }

    let x_bounds = x_extent(&view.price_points).unwrap_or([0.0, 1.0]);

    let (title, datasets, y_bounds) = match app.selected_chart {
        1 => (
            "BTC Price & SMA (30-min)",
            vec![
                line_dataset("Price", &view.price_points, Color::Cyan),
                line_dataset("SMA", &view.sma_points, Color::Yellow),
            ],
            y_extent(&[&view.price_points, &view.sma_points]),
        ),
        2 => (
            "BTC Price Volatility",
            vec![line_dataset(
                "Volatility",
                &view.volatility_points,
                Color::Magenta,
            )],
            y_extent(&[&view.volatility_points]),
        ),
        3 => (
            "BTC Price with Anomalies",
            vec![
                line_dataset("Price", &view.price_points, Color::Cyan),
                scatter_dataset("Anomalies", &view.anomaly_points, Color::Red),
            ],
            y_extent(&[&view.price_points]),
        ),
        4 => (
            "Buy/Sell Signals on Price",
            vec![
                line_dataset("Price", &view.price_points, Color::Cyan),
                scatter_dataset("BUY", &view.buy_points, Color::Green),
                scatter_dataset("SELL", &view.sell_points, Color::Red),
            ],
            y_extent(&[&view.price_points]),
        ),
        _ => (
            "BTC Price (USD)",
            vec![line_dataset("Price", &view.price_points, Color::Cyan)],
            y_extent(&[&view.price_points]),
        ),
    };
    let y_bounds = y_bounds.unwrap_or([0.0, 1.0]);

    let mid = app.range.0 + (app.range.1 - app.range.0) / 2;
    let x_labels = vec![
        Span::raw(hhmm(app.range.0)),
        Span::raw(hhmm(mid)),
        Span::raw(hhmm(app.range.1)),
    ];
    let y_labels = vec![
        Span::raw(format!("{:.2}", y_bounds[0])),
        Span::raw(format!("{:.2}", (y_bounds[0] + y_bounds[1]) / 2.0)),
        Span::raw(format!("{:.2}", y_bounds[1])),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(y_bounds)
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

fn draw_slider(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Time Window ({} samples)", app.view.rows.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    // "HH:MM <bar> HH:MM" with the focused label highlighted.
    let label_width = 5usize;
    let bar_width = (inner.width as usize).saturating_sub(2 * label_width + 2);
    let (lo, hi) = slider_columns(
        bar_width,
        (app.span.0.timestamp(), app.span.1.timestamp()),
        (app.range.0.timestamp(), app.range.1.timestamp()),
    );
    let mut bar = String::with_capacity(bar_width);
    for i in 0..bar_width {
        bar.push(if i >= lo && i <= hi { '█' } else { '░' });
    }

    let focused = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let start_style = if app.focused == Handle::Start {
        focused
    } else {
        Style::default()
    };
    let end_style = if app.focused == Handle::End {
        focused
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(hhmm(app.range.0), start_style),
        Span::raw(" "),
        Span::raw(bar),
        Span::raw(" "),
        Span::styled(hhmm(app.range.1), end_style),
    ]);
    f.render_widget(Paragraph::new(line), inner);
}

/// Maps the selected window onto `[0, width)` bar columns.
fn slider_columns(width: usize, span: (i64, i64), range: (i64, i64)) -> (usize, usize) {
    if width == 0 {
        return (0, 0);
    }
    if span.1 <= span.0 {
        return (0, width - 1);
    }
    let total = (span.1 - span.0) as f64;
    let pos = |t: i64| {
        let ratio = (t - span.0) as f64 / total;
        ((ratio * (width - 1) as f64).round() as usize).min(width - 1)
    };
    (pos(range.0), pos(range.1))
}

fn draw_tables(f: &mut Frame, app: &App, area: Rect) {
    let halves =
        Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).split(area);

    let header_style = Style::default().bg(Color::DarkGray);
    let rows_header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Price"),
        Cell::from("SMA"),
        Cell::from("Vol"),
        Cell::from("Z"),
        Cell::from("Signal"),
    ])
    .style(header_style);

    let rows = app.view.last_rows.iter().map(|r| {
        Row::new(vec![
            Cell::from(hhmm(r.timestamp)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(format!("{:.2}", r.price)),
            opt_cell(r.sma30),
            opt_cell(r.volatility30),
            zscore_cell(r.zscore),
            signal_cell(r.signal),
        ])
    });
    f.render_widget(
        Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(11),
                Constraint::Length(11),
                Constraint::Length(9),
                Constraint::Length(7),
                Constraint::Length(6),
            ],
        )
        .header(rows_header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Raw Data (Last 10)"),
        ),
        halves[0],
    );

    let signals_header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Price"),
        Cell::from("Signal"),
    ])
    .style(header_style);
    let signals = app.view.last_signals.iter().map(|r| {
        Row::new(vec![
            Cell::from(hhmm(r.timestamp)).style(Style::default().fg(Color::DarkGray)),
            Cell::from(format!("{:.2}", r.price)),
            signal_cell(r.signal),
        ])
    });
    f.render_widget(
        Table::new(
            signals,
            [
                Constraint::Length(6),
                Constraint::Length(11),
                Constraint::Length(6),
            ],
        )
        .header(signals_header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Last 10 Buy/Sell Signals"),
        ),
        halves[1],
    );
}

fn opt_cell(value: Option<f64>) -> Cell<'static> {
    match value {
        Some(v) => Cell::from(format!("{v:.2}")),
        None => Cell::from(""),
    }
}

fn zscore_cell(z: f64) -> Cell<'static> {
    if z.is_finite() {
        let style = if z.abs() > ANOMALY_THRESHOLD {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        Cell::from(format!("{z:.2}")).style(style)
    } else {
        Cell::from("")
    }
}

fn signal_cell(signal: Signal) -> Cell<'static> {
    let style = match signal {
        Signal::Buy => Style::default().fg(Color::Green),
        Signal::Sell => Style::default().fg(Color::Red),
        Signal::Hold => Style::default().fg(Color::DarkGray),
    };
    Cell::from(signal.to_string()).style(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn minute_series(n: usize) -> PriceSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| PriceSample {
                timestamp: t0 + chrono::Duration::minutes(i as i64),
                price: 100.0 + (i % 10) as f64,
            })
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shifted(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::SHIFT)
    }

    #[test]
    fn q_quits_and_f5_reloads() {
        let mut app = App::new(minute_series(60));
        assert_eq!(handle_key_event(key(KeyCode::Char('q')), &mut app), Action::Quit);
        assert_eq!(handle_key_event(key(KeyCode::F(5)), &mut app), Action::Reload);
    }

    #[test]
    fn arrows_step_the_focused_handle() {
        let mut app = App::new(minute_series(120));
        let start0 = app.range.0;

        handle_key_event(key(KeyCode::Right), &mut app);
        assert_eq!(app.range.0, start0 + chrono::Duration::minutes(1));

        handle_key_event(shifted(KeyCode::Right), &mut app);
        assert_eq!(app.range.0, start0 + chrono::Duration::minutes(31));

        // End handle steps independently after Tab.
        let end0 = app.range.1;
        handle_key_event(key(KeyCode::Tab), &mut app);
        handle_key_event(shifted(KeyCode::Left), &mut app);
        assert_eq!(app.range.1, end0 - chrono::Duration::minutes(30));
    }

    #[test]
    fn handles_clamp_to_the_span_and_never_cross() {
        let mut app = App::new(minute_series(45));

        // Start cannot move before the first sample.
        handle_key_event(shifted(KeyCode::Left), &mut app);
        assert_eq!(app.range.0, app.span.0);

        // Pushing the start far right stops at the end handle.
        for _ in 0..10 {
            handle_key_event(shifted(KeyCode::Right), &mut app);
        }
        assert_eq!(app.range.0, app.range.1);
        assert_eq!(app.range.1, app.span.1);

        // Same for the end handle moving left.
        handle_key_event(key(KeyCode::Tab), &mut app);
        for _ in 0..10 {
            handle_key_event(shifted(KeyCode::Left), &mut app);
        }
        assert_eq!(app.range.1, app.range.0);
    }

    #[test]
    fn reset_restores_the_full_span() {
        let mut app = App::new(minute_series(90));
        handle_key_event(shifted(KeyCode::Right), &mut app);
        handle_key_event(key(KeyCode::Tab), &mut app);
        handle_key_event(shifted(KeyCode::Left), &mut app);
        assert_ne!(app.range, app.span);

        handle_key_event(key(KeyCode::Char('r')), &mut app);
        assert_eq!(app.range, app.span);
    }

    #[test]
    fn narrowing_the_window_shrinks_the_view() {
        let mut app = App::new(minute_series(120));
        assert_eq!(app.view.rows.len(), 120);

        handle_key_event(shifted(KeyCode::Right), &mut app);
        handle_key_event(shifted(KeyCode::Right), &mut app);
        // Both window ends stay inclusive.
        assert_eq!(app.view.rows.len(), 60);
    }

    #[test]
    fn chart_selection_wraps_and_takes_digits() {
        let mut app = App::new(minute_series(40));
        assert_eq!(app.selected_chart, 0);

        handle_key_event(key(KeyCode::Up), &mut app);
        assert_eq!(app.selected_chart, CHARTS.len() - 1);
        handle_key_event(key(KeyCode::Down), &mut app);
        assert_eq!(app.selected_chart, 0);

        handle_key_event(key(KeyCode::Char('3')), &mut app);
        assert_eq!(app.selected_chart, 2);
        // Out-of-range digits leave the selection alone.
        handle_key_event(key(KeyCode::Char('9')), &mut app);
        assert_eq!(app.selected_chart, 2);
        handle_key_event(key(KeyCode::Char('0')), &mut app);
        assert_eq!(app.selected_chart, 2);
    }

    #[test]
    fn empty_series_app_stays_inert() {
        let mut app = App::new(Vec::new());
        assert!(app.view.rows.is_empty());

        handle_key_event(shifted(KeyCode::Right), &mut app);
        handle_key_event(key(KeyCode::Char('r')), &mut app);
        assert_eq!(app.range.0, app.range.1);
        assert!(app.view.rows.is_empty());
    }

    #[test]
    fn slider_columns_map_the_window() {
        assert_eq!(slider_columns(11, (0, 100), (0, 100)), (0, 10));
        assert_eq!(slider_columns(11, (0, 100), (50, 100)), (5, 10));
        assert_eq!(slider_columns(11, (0, 100), (0, 0)), (0, 0));
        assert_eq!(slider_columns(0, (0, 100), (0, 100)), (0, 0));
        // Degenerate span fills the whole bar.
        assert_eq!(slider_columns(8, (5, 5), (5, 5)), (0, 7));
    }
}
