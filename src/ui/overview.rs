//! Overview page: health stats, applications, top talkers and traffic.

use netwatch_types::DashboardSnapshot;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::tools::summary::{format_bytes, format_number};
use crate::ui::common::{format_latency, render_message, render_timeline};
use crate::ui::theme::Health;

/// Render the overview page.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(snapshot) = app.state.snapshot() else {
        let lines = vec![Line::from(format!(
            "Loading network health for the {}...",
            app.state.filter().describe_window()
        ))];
        render_message(frame, app, area, "Overview", lines);
        return;
    };

    let [stats_area, tables_area, timeline_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Min(6),
        Constraint::Length(5),
    ])
    .areas(area);
    let [apps_area, talkers_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(tables_area);

    render_stats(frame, app, stats_area, snapshot);
    render_applications(frame, app, apps_area, snapshot);
    render_talkers(frame, app, talkers_area, snapshot);
    render_timeline(frame, app, timeline_area, &snapshot.traffic_timeline);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect, snapshot: &DashboardSnapshot) {
    let overview = &snapshot.health_overview;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(vec![
            Span::raw(" Transactions "),
            Span::styled(format_number(overview.total_transactions), bold),
            Span::raw("   Errors "),
            Span::styled(
                format!(
                    "{} ({:.2}%)",
                    format_number(overview.error_count),
                    overview.error_rate
                ),
                app.theme.error_rate_style(overview.error_rate),
            ),
        ]),
        Line::from(vec![
            Span::raw(" Latency avg "),
            Span::styled(format_latency(overview.avg_latency_ms), bold),
            Span::raw("  p95 "),
            Span::styled(format_latency(overview.p95_latency_ms), bold),
            Span::raw("   Clients "),
            Span::styled(format_number(overview.unique_clients), bold),
            Span::raw("  Servers "),
            Span::styled(format_number(overview.unique_servers), bold),
        ]),
    ];

    let block = Block::default()
        .title(format!(" Health ({}) ", snapshot.filter.describe_window()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_applications(frame: &mut Frame, app: &App, area: Rect, snapshot: &DashboardSnapshot) {
    let applications = &snapshot.health_overview.applications;

    let header = Row::new(vec!["Application", "Txns", "Errors", "Avg", "p95", ""])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = applications
        .iter()
        .map(|a| {
            let rate = a.error_rate();
            let health = Health::from_error_rate(rate);
            Row::new(vec![
                Cell::from(a.application_name.clone()),
                Cell::from(format_number(a.total_transactions)),
                Cell::from(format!("{:.2}%", rate)).style(app.theme.error_rate_style(rate)),
                Cell::from(format_latency(a.avg_latency_ms)),
                Cell::from(format_latency(a.p95_latency_ms)),
                Cell::from(health.symbol()).style(app.theme.health_style(health)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(2),
    ];

    let position_info = if applications.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", app.selected_app_index + 1, applications.len())
    };
    let title = format!(" Applications{} [Enter:detail] ", position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !applications.is_empty() {
        state.select(Some(app.selected_app_index));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_talkers(frame: &mut Frame, app: &App, area: Rect, snapshot: &DashboardSnapshot) {
    let header = Row::new(vec!["Client → Server", "Bytes", "Reqs"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = snapshot
        .top_talkers
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(format!("{} → {}", t.client_ip, t.server_ip)),
                Cell::from(format_bytes(t.bytes)),
                Cell::from(format_number(t.request_count)),
            ])
        })
        .collect();

    let widths = [Constraint::Fill(3), Constraint::Fill(1), Constraint::Fill(1)];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Top Talkers ({}) ", snapshot.top_talkers.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, area);
}
