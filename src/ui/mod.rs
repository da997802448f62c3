//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`overview`]: Health stats, applications, top talkers and traffic
//! - [`drilldown`]: One application's detail, or its loading/empty/error page
//! - [`common`]: Shared components (header, window bar, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Windows (common::render_windows)     │
//! ├──────────────────────────────────────┤
//! │ Error banner, only while failing     │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ Page (overview/drilldown::render)    │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//! ```

pub mod common;
pub mod drilldown;
pub mod overview;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::state::Nav;

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let banner_height = if app.state.error().is_some() { 1 } else { 0 };
    let [header, windows, banner, content, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .areas(area);

    common::render_header(frame, app, header);
    common::render_windows(frame, app, windows);
    common::render_error_banner(frame, app, banner);

    match app.state.nav() {
        Nav::Overview => overview::render(frame, app, content),
        Nav::Drilldown { application, view } => {
            drilldown::render(frame, app, content, application, view)
        }
    }

    common::render_status_bar(frame, app, status);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::ready_app;
    use crate::state::{DashboardState, Msg};
    use netwatch_types::{ApplicationDetail, ApplicationOverview, Filter};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_loading_screen() {
        let app = App::new(DashboardState::new(Filter::default()), Theme::dark(), "test");
        let screen = render(&app);
        assert!(screen.contains("Loading network health for the last 24 hours"));
    }

    #[test]
    fn test_overview_lists_applications() {
        let app = ready_app(&["HTTPS", "DNS"]);
        let screen = render(&app);
        assert!(screen.contains("NETWATCH"));
        assert!(screen.contains("HTTPS"));
        assert!(screen.contains("Top Talkers"));
    }

    #[test]
    fn test_error_banner_keeps_data() {
        let mut app = ready_app(&["HTTPS"]);
        app.apply(Msg::RefreshRequested);
        app.apply(Msg::SnapshotReceived(Err("connection refused".into())));

        let screen = render(&app);
        assert!(screen.contains("connection refused (showing last good data)"));
        assert!(screen.contains("HTTPS"));
    }

    #[test]
    fn test_drilldown_pages() {
        let mut app = ready_app(&["DNS"]);
        app.enter_drilldown();
        assert!(render(&app).contains("Loading details for DNS"));

        let mut overview = ApplicationOverview::empty("DNS");
        overview.total_transactions = 42;
        overview.p99_latency_ms = 80.0;
        app.apply(Msg::DetailReceived {
            application: "DNS".into(),
            result: Ok(ApplicationDetail {
                overview,
                top_clients: Vec::new(),
                top_servers: Vec::new(),
                timeline: Vec::new(),
                filter: Filter::default(),
                generated_at: chrono::Utc::now(),
            }),
        });
        let screen = render(&app);
        assert!(screen.contains("Top Clients"));
        assert!(screen.contains("p99 80.0ms"));
    }

    #[test]
    fn test_drilldown_no_data_page() {
        let mut app = ready_app(&["Gopher"]);
        app.enter_drilldown();
        app.apply(Msg::DetailReceived {
            application: "Gopher".into(),
            result: Ok(ApplicationDetail {
                overview: ApplicationOverview::empty("Gopher"),
                top_clients: Vec::new(),
                top_servers: Vec::new(),
                timeline: Vec::new(),
                filter: Filter::default(),
                generated_at: chrono::Utc::now(),
            }),
        });
        assert!(render(&app).contains("No traffic for Gopher in the last 24 hours."));
    }

    #[test]
    fn test_too_small() {
        let app = ready_app(&["HTTPS"]);
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
    }
}
