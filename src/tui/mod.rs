//! Ratatui-based map dashboard.
//!
//! Left: a map of the region with landmarks; the pointer (or arrow keys)
//! hovers, a click (or Enter) selects. Right: the current view (location,
//! metrics, projections or policies). Network work runs on the tokio runtime;
//! the event loop stays synchronous and reads the orchestrator's snapshot on
//! every redraw.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::domain::{Coordinate, PolicyList};
use crate::error::{AppError, FetchError};
use crate::fetch::{FetchOrchestrator, FetchOutcome, FetchSnapshot};
use crate::policy::PolicyAdvisor;
use crate::tracker::CoordinateTracker;

mod map;
mod plotters_chart;

use map::{LANDMARKS, MapMarkers, Viewport, map_canvas};
use plotters_chart::{ProjectionChart, series_bounds};

/// What the dashboard needs from the rest of the application.
pub struct Dashboard {
    pub orchestrator: Arc<FetchOrchestrator>,
    /// `None` when no generative-text key is configured.
    pub advisor: Option<Arc<PolicyAdvisor>>,
    /// Reason policies are unavailable, shown when `advisor` is `None`.
    pub advisor_unavailable: Option<String>,
    pub runtime: Handle,
}

/// Start the dashboard.
pub fn run(dashboard: Dashboard) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(dashboard);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, mouse capture, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Location,
    Metrics,
    Projections,
    Policies,
}

#[derive(Debug, Clone, PartialEq)]
enum PolicyPanel {
    Idle,
    Loading,
    Ready(PolicyList),
    Failed(String),
}

/// Results delivered from background tasks.
enum UiEvent {
    Fetched(Result<FetchOutcome, FetchError>),
    Policies {
        reading_sequence: u64,
        result: Result<PolicyList, FetchError>,
    },
}

struct App {
    deps: Dashboard,
    tracker: CoordinateTracker,
    markers: MapMarkers,
    viewport: Viewport,
    /// Inner area of the map panel as last drawn; maps mouse cells to coordinates.
    map_area: Rect,
    view: View,
    policies: PolicyPanel,
    /// Reading sequence the policy panel was generated for.
    policies_for: Option<u64>,
    status: String,
    tx: UnboundedSender<UiEvent>,
    rx: UnboundedReceiver<UiEvent>,
}

impl App {
    fn new(deps: Dashboard) -> Self {
        let (_, hq_lat, hq_lng) = LANDMARKS[0];
        let tracker = match Coordinate::new(hq_lat, hq_lng) {
            Ok(hq) => CoordinateTracker::with_hover(hq),
            Err(_) => CoordinateTracker::new(),
        };
        let (tx, rx) = unbounded_channel();
        Self {
            deps,
            tracker,
            markers: MapMarkers::default(),
            viewport: Viewport::default(),
            map_area: Rect::default(),
            view: View::Location,
            policies: PolicyPanel::Idle,
            policies_for: None,
            status: "Click the map (or move with arrows + Enter) to pick a location.".to_string(),
            tx,
            rx,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        let mut was_loading = false;
        loop {
            if self.drain_background() {
                needs_redraw = true;
            }
            let loading = self.deps.orchestrator.is_loading();
            if loading != was_loading {
                was_loading = loading;
                needs_redraw = true;
            }

            if needs_redraw {
                let snapshot = self.deps.orchestrator.snapshot();
                terminal
                    .draw(|f| self.draw(f, &snapshot))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Mouse(mouse) => {
                    needs_redraw = self.handle_mouse(mouse);
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply finished background work; returns whether anything changed.
    fn drain_background(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed = true;
            match event {
                UiEvent::Fetched(Ok(outcome)) => {
                    let source = outcome.reading.source;
                    self.status = match (outcome.applied, source.notice()) {
                        (false, _) => format!("Fetch #{} finished but a newer one is shown.", outcome.sequence),
                        (true, Some(notice)) => notice.to_string(),
                        (true, None) => format!("Data ready for {}.", outcome.location_key.as_deref().unwrap_or("-")),
                    };
                }
                UiEvent::Fetched(Err(err)) => {
                    self.status = err.to_string();
                }
                UiEvent::Policies {
                    reading_sequence,
                    result,
                } => {
                    if self.policies_for != Some(reading_sequence) {
                        continue;
                    }
                    self.policies = match result {
                        Ok(list) => PolicyPanel::Ready(list),
                        Err(err) => {
                            self.status = "Failed to load policies. Please try again later.".to_string();
                            PolicyPanel::Failed(err.to_string())
                        }
                    };
                }
            }
        }
        changed
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => self.view = View::Location,
            KeyCode::Up => self.nudge_hover(1, 0),
            KeyCode::Down => self.nudge_hover(-1, 0),
            KeyCode::Left => self.nudge_hover(0, -1),
            KeyCode::Right => self.nudge_hover(0, 1),
            KeyCode::Enter => {
                if let Some(h) = self.tracker.hover() {
                    self.select(h.lat(), h.lng());
                }
            }
            KeyCode::Char('g') => self.start_fetch(),
            KeyCode::Char('1') => self.open_view(View::Metrics),
            KeyCode::Char('2') => self.open_view(View::Projections),
            KeyCode::Char('3') => {
                self.open_view(View::Policies);
                if self.view == View::Policies {
                    self.request_policies();
                }
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some((lat, lng)) = self
            .viewport
            .cell_to_coordinate(self.map_area, mouse.column, mouse.row)
        else {
            return false;
        };
        match mouse.kind {
            MouseEventKind::Moved => {
                self.tracker.on_hover(lat, lng);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.tracker.on_hover(lat, lng);
                self.select(lat, lng);
                true
            }
            _ => false,
        }
    }

    fn nudge_hover(&mut self, d_lat: i32, d_lng: i32) {
        let Some(from) = self.tracker.hover() else {
            return;
        };
        let (lat, lng) = self.viewport.step(from, d_lat, d_lng);
        self.tracker.on_hover(lat, lng);
    }

    fn select(&mut self, lat: f64, lng: f64) {
        match self.tracker.on_select(lat, lng, &mut self.markers) {
            Ok(c) => self.status = format!("Selected {c}. Press g to get data."),
            Err(e) => self.status = format!("Cannot select that point: {e}"),
        }
    }

    fn start_fetch(&mut self) {
        let Some(selected) = self.tracker.selected() else {
            self.status = FetchError::NoSelection.to_string();
            return;
        };
        let orchestrator = Arc::clone(&self.deps.orchestrator);
        let tx = self.tx.clone();
        self.deps.runtime.spawn(async move {
            let result = orchestrator.fetch_for_selection(Some(selected)).await;
            let _ = tx.send(UiEvent::Fetched(result));
        });
        self.status = format!("Fetching data for {selected}...");
    }

    fn open_view(&mut self, view: View) {
        if !self.deps.orchestrator.is_ready() {
            self.status = "Get data first (select a location, then press g).".to_string();
            return;
        }
        self.view = view;
    }

    /// Generate policies for the retained reading, once per reading.
    fn request_policies(&mut self) {
        let snapshot = self.deps.orchestrator.snapshot();
        let sequence = snapshot.reading_sequence;
        let already = self.policies_for == Some(sequence)
            && matches!(self.policies, PolicyPanel::Loading | PolicyPanel::Ready(_));
        if already {
            return;
        }

        self.policies_for = Some(sequence);
        let Some(advisor) = self.deps.advisor.clone() else {
            let reason = self
                .deps
                .advisor_unavailable
                .clone()
                .unwrap_or_else(|| "policy generation is not configured".to_string());
            self.policies = PolicyPanel::Failed(reason);
            return;
        };

        let co2 = snapshot.reading.as_ref().map(|r| r.co2_ppm);
        let tx = self.tx.clone();
        self.policies = PolicyPanel::Loading;
        self.deps.runtime.spawn(async move {
            let result = advisor.recommend(co2).await;
            let _ = tx.send(UiEvent::Policies {
                reading_sequence: sequence,
                result,
            });
        });
    }

    fn write_debug(&mut self) {
        let snapshot = self.deps.orchestrator.snapshot();
        let (policies, policy_error) = match &self.policies {
            PolicyPanel::Ready(list) => (Some(list.as_slice()), None),
            PolicyPanel::Failed(err) => (None, Some(err.as_str())),
            PolicyPanel::Idle | PolicyPanel::Loading => (None, None),
        };
        let session = crate::debug::SessionDump {
            hover: self.tracker.hover(),
            selected: self.tracker.selected(),
            snapshot: &snapshot,
            policies,
            policy_error,
        };
        self.status = match crate::debug::write_debug_bundle(Path::new("debug"), &session) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>, snapshot: &FetchSnapshot) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0], snapshot);
        self.draw_body(frame, chunks[1], snapshot);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &FetchSnapshot) {
        let mut lines: Vec<Line> = Vec::new();
        let mut title = vec![
            Span::styled("Carbon Compass", Style::default().fg(Color::LightGreen)),
            Span::raw(" - CO2 predictions by location"),
        ];
        if snapshot.loading {
            title.push(Span::styled(
                "  Loading...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(title));

        let fmt = |c: Option<Coordinate>| c.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(Span::styled(
            format!(
                "hover: {} | selected: {} | fetches: {} | data ready: {}",
                fmt(self.tracker.hover()),
                fmt(self.tracker.selected()),
                snapshot.issued,
                if snapshot.ready { "yes" } else { "no" },
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &FetchSnapshot) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let map_block = Block::default().borders(Borders::ALL);
        self.map_area = map_block.inner(chunks[0]);
        let canvas = map_canvas(
            self.viewport,
            self.tracker.hover(),
            &self.markers,
            "Map (click to select)".to_string(),
        );
        frame.render_widget(canvas, chunks[0]);

        match self.view {
            View::Location => self.draw_location(frame, chunks[1], snapshot),
            View::Metrics => draw_metrics(frame, chunks[1], snapshot),
            View::Projections => draw_projections(frame, chunks[1], snapshot),
            View::Policies => self.draw_policies(frame, chunks[1]),
        }
    }

    fn draw_location(&self, frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &FetchSnapshot) {
        let mut lines = vec![Line::from(match self.tracker.display() {
            Some(c) => format!("Coordinates: {c}"),
            None => "Coordinates: -".to_string(),
        })];
        if let Some(reading) = &snapshot.reading {
            lines.push(Line::from(format!("Last reading: {:.2} ppm CO2", reading.co2_ppm)));
            if let Some(notice) = reading.source.notice() {
                lines.push(Line::from(Span::styled(notice, Style::default().fg(Color::Yellow))));
            }
        }
        lines.push(Line::from(""));
        for (name, lat, lng) in LANDMARKS {
            lines.push(Line::from(Span::styled(
                format!("{name}: {lat:.4}, {lng:.4}"),
                Style::default().fg(Color::Cyan),
            )));
        }
        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Location").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_policies(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.policies {
            PolicyPanel::Idle => Text::from("Press 3 to generate recommendations."),
            PolicyPanel::Loading => Text::from(Span::styled(
                "Generating recommendations...",
                Style::default().fg(Color::Yellow),
            )),
            PolicyPanel::Ready(list) => {
                let mut lines = vec![Line::from(Span::styled(
                    "Based on our analysis, key recommendations for this location:",
                    Style::default().fg(Color::LightGreen),
                ))];
                lines.extend(list.iter().enumerate().map(|(i, p)| Line::from(format!("{}. {p}", i + 1))));
                Text::from(lines)
            }
            PolicyPanel::Failed(err) => Text::from(vec![
                Line::from(Span::styled(
                    "Failed to load policies. Please try again later.",
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(err.clone(), Style::default().fg(Color::Gray))),
            ]),
        };
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Policy Recommendations").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "arrows move  Enter select  g get data  1 metrics  2 projections  3 policies  d debug  Esc back  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_metrics(frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &FetchSnapshot) {
    let Some(reading) = &snapshot.reading else {
        frame.render_widget(Block::default().title("Metrics").borders(Borders::ALL), area);
        return;
    };
    let body = crate::report::format_reading(reading);
    let mut lines: Vec<Line> = Vec::new();
    for line in body.lines().skip(1) {
        let style = if line.starts_with('!') {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
    let p = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Metrics").borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_projections(frame: &mut ratatui::Frame<'_>, area: Rect, snapshot: &FetchSnapshot) {
    let block = Block::default()
        .title("Projections (carbon density, tons/km2)")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let Some(projections) = &snapshot.projections else {
        let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    let notice = match projections.source.notice() {
        Some(n) => Span::styled(n, Style::default().fg(Color::Yellow)),
        None => Span::styled(
            match projections.horizon() {
                Some((label, value)) => format!("{label}: {value:.1}"),
                None => String::new(),
            },
            Style::default().fg(Color::Gray),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(notice)), rows[0]);

    let points: Vec<(f64, f64)> = projections
        .series()
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();
    let (x_bounds, y_bounds) = series_bounds(projections.series());
    let chart = ProjectionChart {
        points: &points,
        labels: projections.labels(),
        x_bounds,
        y_bounds,
        y_label: "tons/km2",
        placeholder: projections.source.is_placeholder(),
    };
    frame.render_widget(chart, rows[1]);
}
