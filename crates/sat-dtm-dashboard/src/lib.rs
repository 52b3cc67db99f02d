//! ---
//! dtm_section: "05-dashboard"
//! dtm_subsection: "01-bootstrap"
//! dtm_type: "source"
//! dtm_scope: "code"
//! dtm_description: "Terminal dashboard rendering for the monitor."
//! dtm_version: "v0.4.0"
//! dtm_owner: "tbd"
//! ---
//! Live terminal dashboard: status banner, subsystem metric cards with
//! range flags, and trailing-window trend sparklines. Rendering is a pure
//! read of [`MonitorState`]; all mutation stays in the loop.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline};
use ratatui::{Frame, Terminal};
use sat_dtm_common::format_utc;
use sat_dtm_core::MonitorState;
use sat_dtm_telemetry::{parameter, ParameterSpec};
use tracing::info;

/// Identity strings shown in the banner.
#[derive(Debug, Clone, Copy)]
pub struct DashboardContext<'a> {
    pub system_id: &'a str,
    pub twin_version: &'a str,
}

/// Subsystem cards mirrored on the dashboard, three key channels each.
const CARDS: [(&str, [&str; 3]); 4] = [
    ("⚡ Power Systems", ["battery_voltage", "solar_panel_voltage", "power_consumption"]),
    ("🌡 Thermal Systems", ["internal_temp", "battery_temp", "solar_panel_temp"]),
    ("🛰 AOCS", ["gyroscope", "orientation", "reaction_wheel_rpm"]),
    ("📡 Communications", ["signal_strength", "data_rate", "packet_loss"]),
];

/// Channels charted in the trend pane.
const TRENDS: [(&str, &str); 4] = [
    ("battery_voltage", "Battery Voltage (V)"),
    ("internal_temp", "Internal Temperature (°C)"),
    ("gyroscope", "Gyroscope (rad/s)"),
    ("data_quality", "Data Quality (%)"),
];

/// Whether a value sits outside its declared catalog range.
///
/// Zero is a valid bound: a parameter whose minimum is exactly 0 still
/// flags when the value drops below it.
pub fn range_violation(name: &str, value: f64) -> bool {
    match parameter(name) {
        Some(param) => {
            let (min, max) = param.spec.range();
            value < min || value > max
        }
        None => false,
    }
}

/// Full-screen terminal session owning raw mode and the alternate screen.
pub struct TerminalUi {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalUi {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    /// Redraw the whole dashboard from the current state snapshot.
    pub fn draw(&mut self, state: &MonitorState, context: DashboardContext<'_>) -> Result<()> {
        self.terminal
            .draw(|frame| draw_dashboard(frame, state, context))?;
        Ok(())
    }

    /// Poll input for up to `timeout`; returns `true` when the operator
    /// asked to quit (`q`, `Esc`, or ctrl-c).
    pub fn poll_quit(&mut self, timeout: Duration) -> Result<bool> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) || ctrl_c {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show);
        let _ = self.terminal.show_cursor();
    }
}

/// Headless fallback: one structured status line instead of a frame.
pub fn log_status(state: &MonitorState, context: DashboardContext<'_>) {
    let status = if state.last_anomaly() {
        "CRITICAL ANOMALY DETECTED"
    } else {
        "SYSTEM NOMINAL"
    };
    info!(
        system = %context.system_id,
        twin_version = %context.twin_version,
        status,
        last_update = %format_utc(state.last_update()),
        history = state.history_len(),
        "dashboard status"
    );
}

fn draw_dashboard(frame: &mut Frame<'_>, state: &MonitorState, context: DashboardContext<'_>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(11),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_banner(frame, layout[0], state, context);
    draw_cards(frame, layout[1], state);
    draw_trends(frame, layout[2], state);

    let help = Paragraph::new("q quit").style(Style::default().fg(Color::Gray));
    frame.render_widget(help, layout[3]);
}

fn draw_banner(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &MonitorState,
    context: DashboardContext<'_>,
) {
    let (status, color) = if state.last_anomaly() {
        ("🚨 CRITICAL ANOMALY DETECTED", Color::Red)
    } else {
        ("✅ SYSTEM NOMINAL", Color::Green)
    };
    let last_update = if state.last_point().is_some() {
        format!("Last Update: {}", format_utc(state.last_update()))
    } else {
        "Awaiting first reading".to_owned()
    };
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            status,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(last_update, Style::default().fg(Color::Gray))),
    ])
    .block(
        Block::default().borders(Borders::ALL).title(format!(
            "🌍 {} Digital Twin Dashboard  v{}",
            context.system_id, context.twin_version
        )),
    );
    frame.render_widget(banner, area);
}

fn draw_cards(frame: &mut Frame<'_>, area: Rect, state: &MonitorState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    for ((title, channels), column) in CARDS.iter().zip(columns.iter()) {
        let mut lines = Vec::with_capacity(channels.len() * 3);
        for name in channels {
            lines.extend(card_lines(name, state));
        }
        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(*title));
        frame.render_widget(card, *column);
    }
}

fn card_lines(name: &str, state: &MonitorState) -> Vec<Line<'static>> {
    let value = state.last_point().and_then(|point| point.get(name));
    let param = parameter(name);
    let unit = param.map(|p| p.unit).unwrap_or("");

    let mut header = vec![Span::styled(
        title_case(name),
        Style::default().fg(Color::Gray),
    )];
    if let Some(value) = value {
        if range_violation(name, value) {
            header.push(Span::styled(" ⚠", Style::default().fg(Color::Red)));
        }
    }

    let value_line = match value {
        Some(value) => Line::from(Span::styled(
            format_value(value, unit),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled("--", Style::default().fg(Color::DarkGray))),
    };

    let range_line = match param.map(|p| p.spec) {
        Some(ParameterSpec::Continuous { min, max, .. }) => Line::from(Span::styled(
            format!("Range: {min:.1}-{max:.1}{unit}"),
            Style::default().fg(Color::DarkGray),
        )),
        _ => Line::from(Span::styled(
            "Range: 0-1",
            Style::default().fg(Color::DarkGray),
        )),
    };

    vec![Line::from(header), value_line, range_line]
}

fn draw_trends(frame: &mut Frame<'_>, area: Rect, state: &MonitorState) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title("📈 Real-Time Telemetry Trends (Last 10 Readings)");
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50); 2])
        .split(inner);
    let cells: Vec<Rect> = rows
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50); 2])
                .split(*row)
                .to_vec()
        })
        .collect();

    for ((name, label), cell) in TRENDS.iter().zip(cells) {
        let series = state.series(name);
        let scaled = scale_series(&series);
        let latest = series
            .last()
            .map(|value| format!("{label}  {value:.3}"))
            .unwrap_or_else(|| format!("{label}  --"));
        let sparkline = Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title(latest))
            .data(&scaled)
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(sparkline, cell);
    }
}

/// Scale a float series into sparkline bars, preserving shape.
fn scale_series(series: &[f64]) -> Vec<u64> {
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if series.is_empty() {
        return Vec::new();
    }
    if max - min <= f64::EPSILON {
        return vec![1; series.len()];
    }
    series
        .iter()
        .map(|value| (((value - min) / (max - min)) * 100.0).round() as u64)
        .collect()
}

/// `battery_voltage` → `Battery Voltage`.
fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(value: f64, unit: &str) -> String {
    if value.abs() < 0.01 && value != 0.0 {
        format!("{value:.2e}{unit}")
    } else {
        format!("{value:.2}{unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_minimum_still_flags_violations() {
        // packet_loss is declared [0, 3]; a negative excursion must flag
        assert!(range_violation("packet_loss", -0.1));
        assert!(!range_violation("packet_loss", 0.0));
        assert!(!range_violation("packet_loss", 1.5));
        assert!(range_violation("packet_loss", 3.5));
    }

    #[test]
    fn fault_excursions_flag_their_channel() {
        assert!(range_violation("battery_voltage", 28.0 * 0.6));
        assert!(range_violation("internal_temp", 25.0 + 20.0));
        assert!(range_violation("gyroscope", 0.05 * 10.0));
        assert!(!range_violation("battery_voltage", 28.0));
    }

    #[test]
    fn unknown_channels_never_flag() {
        assert!(!range_violation("warp_core_temp", 1e9));
    }

    #[test]
    fn title_case_splits_underscores() {
        assert_eq!(title_case("battery_voltage"), "Battery Voltage");
        assert_eq!(title_case("gyroscope"), "Gyroscope");
    }

    #[test]
    fn scale_series_handles_flat_and_varied_data() {
        assert_eq!(scale_series(&[]), Vec::<u64>::new());
        assert_eq!(scale_series(&[5.0, 5.0, 5.0]), vec![1, 1, 1]);
        let scaled = scale_series(&[0.0, 5.0, 10.0]);
        assert_eq!(scaled, vec![0, 50, 100]);
    }

    #[test]
    fn small_values_use_scientific_notation() {
        assert_eq!(format_value(5e-6, ""), "5.00e-6");
        assert_eq!(format_value(28.0, "V"), "28.00V");
        assert_eq!(format_value(0.0, "%"), "0.00%");
    }
}
