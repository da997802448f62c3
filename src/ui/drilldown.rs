//! Drilldown page for a single application.

use netwatch_types::ApplicationDetail;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::state::DetailView;
use crate::tools::summary::{format_bytes, format_number};
use crate::ui::common::{format_latency, render_message, render_timeline};

/// Render the drilldown page.
pub fn render(frame: &mut Frame, app: &App, area: Rect, application: &str, view: &DetailView) {
    let dim = Style::default().add_modifier(Modifier::DIM);
    match view {
        DetailView::Loading => {
            let lines = vec![Line::from(format!("Loading details for {}...", application))];
            render_message(frame, app, area, application, lines);
        }
        DetailView::NoData => {
            let lines = vec![
                Line::from(format!(
                    "No traffic for {} in the {}.",
                    application,
                    app.state.filter().describe_window()
                )),
                Line::from(""),
                Line::from(Span::styled("Esc:back 1-5:wider window", dim)),
            ];
            render_message(frame, app, area, application, lines);
        }
        DetailView::Failed(message) => {
            let lines = vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(app.theme.critical),
                )),
                Line::from(""),
                Line::from(Span::styled("Esc:back r:retry", dim)),
            ];
            render_message(frame, app, area, application, lines);
        }
        DetailView::Loaded(detail) => render_detail(frame, app, area, detail),
    }
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect, detail: &ApplicationDetail) {
    let [summary_area, tables_area, timeline_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Min(6),
        Constraint::Length(5),
    ])
    .areas(area);
    let [clients_area, servers_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(tables_area);

    render_summary(frame, app, summary_area, detail);
    render_clients(frame, app, clients_area, detail);
    render_servers(frame, app, servers_area, detail);
    render_timeline(frame, app, timeline_area, &detail.timeline);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect, detail: &ApplicationDetail) {
    let o = &detail.overview;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(vec![
            Span::raw(" Transactions "),
            Span::styled(format_number(o.total_transactions), bold),
            Span::raw("   Errors "),
            Span::styled(
                format!("{} ({:.2}%)", format_number(o.error_count), o.error_rate),
                app.theme.error_rate_style(o.error_rate),
            ),
            Span::raw("   Bytes "),
            Span::styled(format_bytes(o.total_bytes), bold),
        ]),
        Line::from(vec![
            Span::raw(" Latency avg "),
            Span::styled(format_latency(o.avg_latency_ms), bold),
            Span::raw("  p50 "),
            Span::styled(format_latency(o.p50_latency_ms), bold),
            Span::raw("  p95 "),
            Span::styled(format_latency(o.p95_latency_ms), bold),
            Span::raw("  p99 "),
            Span::styled(format_latency(o.p99_latency_ms), bold),
        ]),
        Line::from(vec![
            Span::raw(" Clients "),
            Span::styled(format_number(o.unique_clients), bold),
            Span::raw("  Servers "),
            Span::styled(format_number(o.unique_servers), bold),
        ]),
    ];

    let block = Block::default()
        .title(format!(
            " {} ({}) ",
            detail.application_name(),
            detail.filter.describe_window()
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_clients(frame: &mut Frame, app: &App, area: Rect, detail: &ApplicationDetail) {
    let header = Row::new(vec!["Client", "Txns", "Errors", "Bytes"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = detail
        .top_clients
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.client_ip.clone()),
                Cell::from(format_number(c.transactions)),
                Cell::from(format_number(c.errors)),
                Cell::from(format_bytes(c.bytes)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Top Clients ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, area);
}

fn render_servers(frame: &mut Frame, app: &App, area: Rect, detail: &ApplicationDetail) {
    let header = Row::new(vec!["Server", "Txns", "Avg"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = detail
        .top_servers
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(format!("{}:{}", s.server_ip, s.server_port)),
                Cell::from(format_number(s.transactions)),
                Cell::from(format_latency(s.avg_latency_ms)),
            ])
        })
        .collect();

    let widths = [Constraint::Fill(2), Constraint::Fill(1), Constraint::Fill(1)];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Top Servers ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, area);
}
