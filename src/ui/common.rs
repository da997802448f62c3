//! Common UI components shared across views.
//!
//! This module contains the header bar, time window bar, status bar, error
//! banner, help overlay and the timeline used by both pages.

use chrono::{TimeDelta, Utc};
use netwatch_types::TimelinePoint;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, WINDOWS};
use crate::state::LoadPhase;
use crate::tools::summary::format_number;
use crate::ui::theme::Health;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with overall network health.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" NETWATCH ", Style::default().add_modifier(Modifier::BOLD));

    let Some(snapshot) = app.state.snapshot() else {
        let line = Line::from(vec![title, Span::raw("│ Loading...")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };
    let overview = &snapshot.health_overview;
    let health = Health::from_error_rate(overview.error_rate);

    let mut spans = vec![
        Span::styled(format!(" {}", health.symbol()), app.theme.health_style(health)),
        title,
        Span::raw("│ "),
        Span::styled(
            format_number(overview.total_transactions),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" txns │ "),
        Span::styled(
            format!("{:.2}%", overview.error_rate),
            app.theme.error_rate_style(overview.error_rate),
        ),
        Span::raw(" errors │ "),
        Span::raw(format!("{} avg", format_latency(overview.avg_latency_ms))),
        Span::raw(" │ "),
        Span::raw(format!(
            "{} clients → {} servers",
            format_number(overview.unique_clients),
            format_number(overview.unique_servers)
        )),
    ];
    if app.state.phase() == LoadPhase::Refreshing {
        spans.push(Span::styled(" │ ⟳", Style::default().fg(app.theme.highlight)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the time window selector and the sensor filter.
pub fn render_windows(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.window_index();
    let mut spans = Vec::new();

    for (i, hours) in WINDOWS.iter().enumerate() {
        let style = if active == Some(i) {
            app.theme.tab_active
        } else {
            app.theme.tab_inactive
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, window_label(*hours)), style));
        spans.push(Span::raw("|"));
    }
    if active.is_none() {
        spans.push(Span::styled(
            format!(" {} ", window_label(app.state.filter().hours())),
            app.theme.tab_active,
        ));
        spans.push(Span::raw("|"));
    }

    let filter = app.state.filter();
    let sensor = if app.sensor_input_active {
        Span::styled(
            format!(" sensor: {}_", app.sensor_input),
            Style::default().fg(app.theme.highlight),
        )
    } else {
        let label = filter
            .sensor_ip()
            .or(filter.sensor_name())
            .unwrap_or("all");
        Span::raw(format!(" sensor: {}", label))
    };
    spans.push(sensor);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn window_label(hours: u32) -> String {
    if hours > 24 && hours % 24 == 0 {
        format!("{}d", hours / 24)
    } else {
        format!("{}h", hours)
    }
}

/// Render the persistent transport error banner, if any.
pub fn render_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(error) = app.state.error() else {
        return;
    };
    let suffix = if app.state.snapshot().is_some() {
        " (showing last good data)"
    } else {
        ""
    };
    let banner = Paragraph::new(format!(" ✖ {}{} | r:retry", error, suffix))
        .style(app.theme.health_style(Health::Critical));
    frame.render_widget(banner, area);
}

/// Render the status bar at the bottom.
///
/// Shows: breadcrumb trail, time since last update, auto-refresh flag,
/// available controls. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.sensor_input_active {
        "Type sensor IP or name | Enter:apply Esc:cancel"
    } else if app.in_drilldown() {
        "Esc:back r:refresh a:auto 1-5:window ?:help q:quit"
    } else {
        "↑↓:select Enter:detail r:refresh a:auto 1-5:window /:sensor ?:help q:quit"
    };

    let updated = match app.last_update_age(Utc::now()) {
        Some(age) => format!("Updated {} ago", format_age(age.num_seconds())),
        None => "Loading...".to_string(),
    };
    let auto = if app.state.auto_refresh() {
        format!("auto {}s", app.state.refresh_period().as_secs())
    } else {
        "auto off".to_string()
    };

    let status = format!(
        " {} | {} | {} | {} | {}",
        app.breadcrumb(),
        updated,
        auto,
        app.source_description(),
        controls
    );
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

/// Format a latency in milliseconds.
pub fn format_latency(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{:.1}ms", ms)
    }
}

/// Render requests and errors per bucket as two sparklines.
pub fn render_timeline(frame: &mut Frame, app: &App, area: Rect, points: &[TimelinePoint]) {
    let block = Block::default()
        .title(" Traffic ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if points.is_empty() {
        frame.render_widget(
            Paragraph::new("No traffic in this window")
                .style(Style::default().add_modifier(Modifier::DIM)),
            inner,
        );
        return;
    }

    // newest hours win when the timeline is wider than the panel
    let width = usize::from(inner.width.saturating_sub(10)).max(1);
    let visible = hourly_slots(points, width);
    let requests: Vec<u64> = visible.iter().map(|p| p.request_count).collect();
    let errors: Vec<u64> = visible.iter().map(|p| p.error_count).collect();

    let peak = requests.iter().copied().max().unwrap_or_default();
    let lines = vec![
        Line::from(vec![
            Span::raw("requests  "),
            Span::styled(sparkline(&requests), Style::default().fg(app.theme.timeline)),
        ]),
        Line::from(vec![
            Span::raw("errors    "),
            Span::styled(sparkline(&errors), Style::default().fg(app.theme.critical)),
        ]),
        Line::from(Span::styled(
            format!(
                "          {} → {} (peak {}/h)",
                visible[0].bucket_start.format("%m-%d %H:%M"),
                visible[visible.len() - 1].bucket_start.format("%m-%d %H:%M"),
                format_number(peak)
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Lay sparse buckets out on consecutive hours ending at the newest one.
///
/// At most `slots` hours are kept. Hours without a bucket count zero.
pub fn hourly_slots(points: &[TimelinePoint], slots: usize) -> Vec<TimelinePoint> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };

    let span = usize::try_from((last.bucket_start - first.bucket_start).num_hours())
        .unwrap_or(0)
        .saturating_add(1);
    let count = span.min(slots.max(1));
    let start = last.bucket_start - TimeDelta::hours(count as i64 - 1);

    let mut filled: Vec<TimelinePoint> = (0..count)
        .map(|i| TimelinePoint {
            bucket_start: start + TimeDelta::hours(i as i64),
            request_count: 0,
            error_count: 0,
        })
        .collect();

    for point in points.iter().filter(|p| p.bucket_start >= start) {
        let index = usize::try_from((point.bucket_start - start).num_hours()).unwrap_or(0);
        if let Some(slot) = filled.get_mut(index) {
            slot.request_count = slot.request_count.saturating_add(point.request_count);
            slot.error_count = slot.error_count.saturating_add(point.error_count);
        }
    }
    filled
}

/// Scale values into sparkline characters relative to their maximum.
pub fn sparkline(values: &[u64]) -> String {
    let max = values.iter().copied().max().unwrap_or_default();
    if max == 0 {
        return SPARKLINE_CHARS[0].to_string().repeat(values.len());
    }
    values
        .iter()
        .map(|&v| {
            let level = (v as f64 / max as f64 * 7.0).round() as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

/// Render a centered message block, used for loading, empty and error pages.
pub fn render_message(frame: &mut Frame, app: &App, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = lines.len() as u16;
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(inner);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), middle);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(" Navigation", bold)]),
        Line::from("  ↑/↓ j/k     Select application"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Application detail"),
        Line::from("  Esc/Bksp    Back to overview"),
        Line::from(""),
        Line::from(vec![Span::styled(" Filters", bold)]),
        Line::from("  1-5         1h 6h 24h 72h 7d"),
        Line::from("  /           Sensor IP or name"),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  r           Refresh now"),
        Line::from("  a           Toggle auto-refresh"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 21u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
