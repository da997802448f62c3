//! Terminal dashboard state and navigation logic.
//!
//! [`App`] wraps the shared [`DashboardState`] with what only the terminal
//! needs: row selection, the sensor input box, the help overlay and
//! transient status messages. Every action that changes what is fetched goes
//! through [`App::apply`] and yields the reducer's [`Command`]s.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use netwatch_types::ApplicationMetrics;

use crate::state::{Command, DashboardState, Msg, Nav};
use crate::ui::Theme;

/// Selectable time windows, in hours, bound to keys `1` to `5`.
pub const WINDOWS: [u32; 5] = [1, 6, 24, 72, 168];

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub state: DashboardState,

    // Navigation state
    pub selected_app_index: usize,

    // Sensor filter input
    pub sensor_input: String,
    pub sensor_input_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,

    source_description: String,
}

impl App {
    /// Create a new App around a dashboard session.
    pub fn new(state: DashboardState, theme: Theme, source_description: impl Into<String>) -> Self {
        Self {
            running: true,
            show_help: false,
            state,
            selected_app_index: 0,
            sensor_input: String::new(),
            sensor_input_active: false,
            theme,
            status_message: None,
            source_description: source_description.into(),
        }
    }

    /// Returns a description of where tool calls go.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Feed a message to the dashboard state.
    pub fn apply(&mut self, msg: Msg) -> Vec<Command> {
        let commands = self.state.update(msg);
        self.clamp_selection();
        commands
    }

    /// Applications in the current snapshot, busiest first.
    pub fn applications(&self) -> &[ApplicationMetrics] {
        self.state
            .snapshot()
            .map(|s| s.health_overview.applications.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_application(&self) -> Option<&str> {
        self.applications()
            .get(self.selected_app_index)
            .map(|app| app.application_name.as_str())
    }

    pub fn in_drilldown(&self) -> bool {
        matches!(self.state.nav(), Nav::Drilldown { .. })
    }

    /// Move selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.applications().len().saturating_sub(1);
        self.selected_app_index = (self.selected_app_index + n).min(max);
    }

    /// Move selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_app_index = self.selected_app_index.saturating_sub(n);
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_first(&mut self) {
        self.selected_app_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_app_index = self.applications().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.applications().len();
        if self.selected_app_index >= len {
            self.selected_app_index = len.saturating_sub(1);
        }
    }

    /// Index into [`WINDOWS`] of the active time window, if it is one of them.
    pub fn window_index(&self) -> Option<usize> {
        let hours = self.state.filter().hours();
        WINDOWS.iter().position(|&w| w == hours)
    }

    /// Switch the time window.
    pub fn set_window(&mut self, hours: u32) -> Vec<Command> {
        if self.state.filter().hours() == hours {
            return Vec::new();
        }
        let filter = self.state.filter().clone().with_hours(hours);
        self.apply(Msg::FilterChanged(filter))
    }

    /// Drill into the selected application.
    pub fn enter_drilldown(&mut self) -> Vec<Command> {
        if self.in_drilldown() {
            return Vec::new();
        }
        let Some(name) = self.selected_application().map(str::to_string) else {
            return Vec::new();
        };
        self.apply(Msg::ApplicationSelected(name))
    }

    /// Leave the drilldown, if open.
    pub fn go_back(&mut self) -> Vec<Command> {
        if self.in_drilldown() {
            self.apply(Msg::Back)
        } else {
            Vec::new()
        }
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        self.apply(Msg::RefreshRequested)
    }

    pub fn toggle_auto_refresh(&mut self) -> Vec<Command> {
        let commands = self.apply(Msg::AutoRefreshToggled);
        let message = if self.state.auto_refresh() {
            format!(
                "Auto-refresh on (every {}s)",
                self.state.refresh_period().as_secs()
            )
        } else {
            "Auto-refresh off".to_string()
        };
        self.set_status_message(message);
        commands
    }

    /// Open the sensor input box, prefilled with the active sensor.
    pub fn start_sensor_input(&mut self) {
        let filter = self.state.filter();
        self.sensor_input = filter
            .sensor_ip()
            .or(filter.sensor_name())
            .unwrap_or_default()
            .to_string();
        self.sensor_input_active = true;
    }

    /// Close the input box without changing the filter.
    pub fn cancel_sensor_input(&mut self) {
        self.sensor_input_active = false;
    }

    pub fn sensor_push(&mut self, c: char) {
        self.sensor_input.push(c);
    }

    pub fn sensor_pop(&mut self) {
        self.sensor_input.pop();
    }

    /// Apply the typed sensor as the new filter.
    ///
    /// An address filters by sensor IP, anything else by sensor name, and an
    /// empty input clears both.
    pub fn apply_sensor_input(&mut self) -> Vec<Command> {
        self.sensor_input_active = false;
        let input = self.sensor_input.trim();

        let (sensor_ip, sensor_name) = if input.is_empty() {
            (None, None)
        } else if input.parse::<IpAddr>().is_ok() {
            (Some(input.to_string()), None)
        } else {
            (None, Some(input.to_string()))
        };

        let current = self.state.filter();
        if current.sensor_ip() == sensor_ip.as_deref()
            && current.sensor_name() == sensor_name.as_deref()
        {
            return Vec::new();
        }

        let filter = current
            .clone()
            .with_sensor_ip(sensor_ip)
            .with_sensor_name(sensor_name);
        self.apply(Msg::FilterChanged(filter))
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Get breadcrumb trail for current navigation.
    pub fn breadcrumb(&self) -> String {
        match self.state.nav() {
            Nav::Overview => "Overview".to_string(),
            Nav::Drilldown { application, .. } => format!("Overview > {}", application),
        }
    }

    /// Age of the snapshot on screen.
    pub fn last_update_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.state.snapshot().map(|s| now - s.generated_at)
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::ToolRequest;
    use netwatch_types::{DashboardSnapshot, Filter, HealthOverview};

    pub(crate) fn snapshot_with_apps(names: &[&str]) -> DashboardSnapshot {
        let mut overview = HealthOverview::from_totals(1000, 20);
        overview.applications = names
            .iter()
            .enumerate()
            .map(|(i, name)| ApplicationMetrics {
                application_name: name.to_string(),
                total_transactions: 100 * (names.len() - i) as u64,
                ..Default::default()
            })
            .collect();
        DashboardSnapshot::new(overview, Vec::new(), Vec::new(), Filter::default())
    }

    pub(crate) fn ready_app(names: &[&str]) -> App {
        let mut state = DashboardState::new(Filter::default());
        state.start();
        state.update(Msg::SnapshotReceived(Ok(snapshot_with_apps(names))));
        App::new(state, Theme::dark(), "test")
    }

    #[test]
    fn test_selection_clamped_to_applications() {
        let mut app = ready_app(&["HTTPS", "DNS", "SSH"]);
        app.select_next_n(10);
        assert_eq!(app.selected_application(), Some("SSH"));

        app.apply(Msg::SnapshotReceived(Ok(snapshot_with_apps(&["HTTPS"]))));
        assert_eq!(app.selected_app_index, 0);
    }

    #[test]
    fn test_set_window() {
        let mut app = ready_app(&["HTTPS"]);
        assert_eq!(app.window_index(), Some(2));
        assert!(app.set_window(24).is_empty());

        let commands = app.set_window(6);
        assert_eq!(
            commands,
            vec![Command::Fetch(ToolRequest::RefreshDashboard(Filter::last_hours(6)))]
        );
        assert_eq!(app.window_index(), Some(1));
    }

    #[test]
    fn test_sensor_input_classifies_ip_and_name() {
        let mut app = ready_app(&["HTTPS"]);

        app.start_sensor_input();
        "10.1.2.3".chars().for_each(|c| app.sensor_push(c));
        assert_eq!(app.apply_sensor_input().len(), 1);
        assert_eq!(app.state.filter().sensor_ip(), Some("10.1.2.3"));
        assert_eq!(app.state.filter().sensor_name(), None);

        app.start_sensor_input();
        assert_eq!(app.sensor_input, "10.1.2.3");
        app.sensor_input = "edge-01".into();
        app.apply_sensor_input();
        assert_eq!(app.state.filter().sensor_ip(), None);
        assert_eq!(app.state.filter().sensor_name(), Some("edge-01"));

        app.start_sensor_input();
        app.sensor_input.clear();
        app.apply_sensor_input();
        assert!(app.state.filter().is_all_sensors());

        // unchanged input does not refetch
        app.start_sensor_input();
        assert!(app.apply_sensor_input().is_empty());
    }

    #[test]
    fn test_drilldown_and_back() {
        let mut app = ready_app(&["HTTPS", "DNS"]);
        app.select_next();

        let commands = app.enter_drilldown();
        assert_eq!(commands.len(), 1);
        assert_eq!(app.breadcrumb(), "Overview > DNS");

        // no nesting
        assert!(app.enter_drilldown().is_empty());

        assert!(app.go_back().is_empty());
        assert!(!app.in_drilldown());
        assert_eq!(app.selected_application(), Some("DNS"));
    }

    #[test]
    fn test_toggle_auto_refresh_sets_message() {
        let mut app = ready_app(&[]);
        let commands = app.toggle_auto_refresh();
        assert_eq!(commands, vec![Command::StartTimer(Duration::from_secs(60))]);
        assert_eq!(app.get_status_message(), Some("Auto-refresh on (every 60s)"));
    }
}
