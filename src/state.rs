//! Client view state.
//!
//! [`DashboardState`] is a pure reducer: every input (user action, timer
//! tick, tool response) arrives as a [`Msg`], and every side effect leaves
//! as a [`Command`] for the dispatcher to execute. Nothing here touches a
//! clock or a transport, so the whole state machine is testable by feeding
//! it messages.

use std::time::Duration;

use netwatch_types::{ApplicationDetail, DashboardSnapshot, Filter};
use tracing::debug;

use crate::tools::ToolRequest;

/// Default auto-refresh period.
pub const REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Time window or sensor changed.
    FilterChanged(Filter),
    /// Manual refresh.
    RefreshRequested,
    AutoRefreshToggled,
    TimerTick,
    /// Drill into one application.
    ApplicationSelected(String),
    /// Leave the drilldown.
    Back,
    SnapshotReceived(Result<DashboardSnapshot, String>),
    DetailReceived {
        application: String,
        result: Result<ApplicationDetail, String>,
    },
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch(ToolRequest),
    StartTimer(Duration),
    CancelTimer,
}

/// Progress of the overview snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// No snapshot yet.
    Loading,
    /// Snapshot present, nothing in flight.
    Ready,
    /// Snapshot present, at least one fetch in flight.
    Refreshing,
}

/// What the drilldown is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loading,
    Loaded(ApplicationDetail),
    /// The application had no rows for the filter.
    NoData,
    Failed(String),
}

/// Which page is on screen. The stack is one level deep.
#[derive(Debug, Clone, PartialEq)]
pub enum Nav {
    Overview,
    Drilldown {
        application: String,
        view: DetailView,
    },
}

impl Nav {
    /// The application being drilled into, if any.
    pub fn application(&self) -> Option<&str> {
        match self {
            Nav::Overview => None,
            Nav::Drilldown { application, .. } => Some(application),
        }
    }
}

/// State of one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardState {
    filter: Filter,
    snapshot: Option<DashboardSnapshot>,
    /// Overview fetches issued but not yet answered.
    in_flight: usize,
    error: Option<String>,
    auto_refresh: bool,
    refresh_period: Duration,
    nav: Nav,
}

impl DashboardState {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            snapshot: None,
            in_flight: 0,
            error: None,
            auto_refresh: false,
            refresh_period: REFRESH_PERIOD,
            nav: Nav::Overview,
        }
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    /// Commands to run when the session starts: the first overview fetch.
    pub fn start(&mut self) -> Vec<Command> {
        vec![self.fetch_overview()]
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The last snapshot received, possibly stale.
    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    /// The persistent transport error banner, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub fn nav(&self) -> &Nav {
        &self.nav
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn phase(&self) -> LoadPhase {
        match (&self.snapshot, self.in_flight) {
            (None, _) => LoadPhase::Loading,
            (Some(_), 0) => LoadPhase::Ready,
            (Some(_), _) => LoadPhase::Refreshing,
        }
    }

    /// Apply one message and return the commands it produces.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::FilterChanged(filter) => {
                self.filter = filter;
                let mut commands = vec![self.fetch_overview()];
                commands.extend(self.fetch_detail());
                commands
            }
            Msg::RefreshRequested => {
                let mut commands = vec![self.fetch_overview()];
                commands.extend(self.fetch_detail());
                commands
            }
            Msg::AutoRefreshToggled => {
                self.auto_refresh = !self.auto_refresh;
                if self.auto_refresh {
                    vec![Command::StartTimer(self.refresh_period)]
                } else {
                    vec![Command::CancelTimer]
                }
            }
            Msg::TimerTick => {
                // a tick can race the cancel; ignore it once auto-refresh is off
                if self.auto_refresh {
                    vec![self.fetch_overview()]
                } else {
                    Vec::new()
                }
            }
            Msg::ApplicationSelected(application) => {
                self.nav = Nav::Drilldown {
                    application,
                    view: DetailView::Loading,
                };
                self.fetch_detail().into_iter().collect()
            }
            Msg::Back => {
                self.nav = Nav::Overview;
                Vec::new()
            }
            Msg::SnapshotReceived(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(snapshot) => {
                        self.snapshot = Some(snapshot);
                        self.error = None;
                    }
                    Err(message) => {
                        self.error = Some(message);
                    }
                }
                Vec::new()
            }
            Msg::DetailReceived {
                application,
                result,
            } => {
                match &mut self.nav {
                    Nav::Drilldown {
                        application: active,
                        view,
                    } if *active == application => {
                        *view = match result {
                            Ok(detail) if detail.has_data() => DetailView::Loaded(detail),
                            Ok(_) => DetailView::NoData,
                            Err(message) => DetailView::Failed(message),
                        };
                    }
                    _ => debug!(application = %application, "Discarding stale detail"),
                }
                Vec::new()
            }
        }
    }

    fn fetch_overview(&mut self) -> Command {
        self.in_flight += 1;
        Command::Fetch(ToolRequest::RefreshDashboard(self.filter.clone()))
    }

    fn fetch_detail(&self) -> Option<Command> {
        self.nav.application().map(|application| {
            Command::Fetch(ToolRequest::ApplicationDetails {
                filter: self.filter.clone(),
                application: application.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netwatch_types::{ApplicationOverview, HealthOverview};

    fn snapshot(total: u64) -> DashboardSnapshot {
        DashboardSnapshot::new(
            HealthOverview::from_totals(total, 0),
            Vec::new(),
            Vec::new(),
            Filter::default(),
        )
    }

    fn detail(application: &str, transactions: u64) -> ApplicationDetail {
        let mut overview = ApplicationOverview::empty(application);
        overview.total_transactions = transactions;
        ApplicationDetail {
            overview,
            top_clients: Vec::new(),
            top_servers: Vec::new(),
            timeline: Vec::new(),
            filter: Filter::default(),
            generated_at: chrono::Utc::now(),
        }
    }

    fn ready_state() -> DashboardState {
        let mut state = DashboardState::new(Filter::default());
        state.start();
        state.update(Msg::SnapshotReceived(Ok(snapshot(100))));
        state
    }

    #[test]
    fn test_start_fetches_overview() {
        let mut state = DashboardState::new(Filter::last_hours(6));
        assert_eq!(state.phase(), LoadPhase::Loading);

        let commands = state.start();
        assert_eq!(
            commands,
            vec![Command::Fetch(ToolRequest::RefreshDashboard(Filter::last_hours(6)))]
        );

        state.update(Msg::SnapshotReceived(Ok(snapshot(5))));
        assert_eq!(state.phase(), LoadPhase::Ready);
    }

    #[test]
    fn test_filter_change_refetches_and_marks_refreshing() {
        let mut state = ready_state();
        let commands = state.update(Msg::FilterChanged(Filter::last_hours(72)));

        assert_eq!(
            commands,
            vec![Command::Fetch(ToolRequest::RefreshDashboard(Filter::last_hours(72)))]
        );
        assert_eq!(state.phase(), LoadPhase::Refreshing);
        assert_eq!(state.filter().hours(), 72);
    }

    #[test]
    fn test_failure_keeps_snapshot_and_sets_banner() {
        let mut state = ready_state();
        state.update(Msg::RefreshRequested);
        state.update(Msg::SnapshotReceived(Err("connection refused".into())));

        assert_eq!(state.snapshot().unwrap().health_overview.total_transactions, 100);
        assert_eq!(state.error(), Some("connection refused"));
        assert_eq!(state.phase(), LoadPhase::Ready);

        state.update(Msg::RefreshRequested);
        state.update(Msg::SnapshotReceived(Ok(snapshot(200))));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_overlapping_refreshes_last_arrival_wins() {
        let mut state = ready_state();
        state.update(Msg::RefreshRequested);
        state.update(Msg::RefreshRequested);
        assert_eq!(state.in_flight(), 2);

        state.update(Msg::SnapshotReceived(Ok(snapshot(2))));
        assert_eq!(state.phase(), LoadPhase::Refreshing);
        state.update(Msg::SnapshotReceived(Ok(snapshot(1))));

        assert_eq!(state.phase(), LoadPhase::Ready);
        assert_eq!(state.snapshot().unwrap().health_overview.total_transactions, 1);
    }

    #[test]
    fn test_auto_refresh_toggle_and_ticks() {
        let mut state = ready_state().with_refresh_period(Duration::from_secs(30));

        assert_eq!(
            state.update(Msg::AutoRefreshToggled),
            vec![Command::StartTimer(Duration::from_secs(30))]
        );
        assert_eq!(state.update(Msg::TimerTick).len(), 1);

        assert_eq!(state.update(Msg::AutoRefreshToggled), vec![Command::CancelTimer]);
        assert!(state.update(Msg::TimerTick).is_empty());
    }

    #[test]
    fn test_drilldown_flow() {
        let mut state = ready_state();
        state.update(Msg::AutoRefreshToggled);

        let commands = state.update(Msg::ApplicationSelected("DNS".into()));
        assert_eq!(
            commands,
            vec![Command::Fetch(ToolRequest::ApplicationDetails {
                filter: Filter::default(),
                application: "DNS".into(),
            })]
        );
        assert!(state.auto_refresh());
        assert_eq!(
            state.nav(),
            &Nav::Drilldown {
                application: "DNS".into(),
                view: DetailView::Loading,
            }
        );

        state.update(Msg::DetailReceived {
            application: "DNS".into(),
            result: Ok(detail("DNS", 40)),
        });
        assert!(matches!(
            state.nav(),
            Nav::Drilldown { view: DetailView::Loaded(_), .. }
        ));
    }

    #[test]
    fn test_drilldown_without_rows_is_no_data() {
        let mut state = ready_state();
        state.update(Msg::ApplicationSelected("Gopher".into()));
        state.update(Msg::DetailReceived {
            application: "Gopher".into(),
            result: Ok(detail("Gopher", 0)),
        });
        assert!(matches!(
            state.nav(),
            Nav::Drilldown { view: DetailView::NoData, .. }
        ));
    }

    #[test]
    fn test_drilldown_failure() {
        let mut state = ready_state();
        state.update(Msg::ApplicationSelected("DNS".into()));
        state.update(Msg::DetailReceived {
            application: "DNS".into(),
            result: Err("Failed to load details for DNS".into()),
        });
        assert!(matches!(
            state.nav(),
            Nav::Drilldown { view: DetailView::Failed(_), .. }
        ));
        // the overview is untouched
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_stale_detail_is_discarded() {
        let mut state = ready_state();
        state.update(Msg::ApplicationSelected("DNS".into()));
        state.update(Msg::ApplicationSelected("HTTPS".into()));

        state.update(Msg::DetailReceived {
            application: "DNS".into(),
            result: Ok(detail("DNS", 10)),
        });
        assert_eq!(
            state.nav(),
            &Nav::Drilldown {
                application: "HTTPS".into(),
                view: DetailView::Loading,
            }
        );

        state.update(Msg::Back);
        state.update(Msg::DetailReceived {
            application: "HTTPS".into(),
            result: Ok(detail("HTTPS", 10)),
        });
        assert_eq!(state.nav(), &Nav::Overview);
    }

    #[test]
    fn test_back_does_not_refetch() {
        let mut state = ready_state();
        state.update(Msg::ApplicationSelected("DNS".into()));
        assert!(state.update(Msg::Back).is_empty());
        assert_eq!(state.nav(), &Nav::Overview);
        assert_eq!(state.snapshot().unwrap().health_overview.total_transactions, 100);
    }

    #[test]
    fn test_timer_refreshes_overview_only_during_drilldown() {
        let mut state = ready_state();
        state.update(Msg::AutoRefreshToggled);
        state.update(Msg::ApplicationSelected("DNS".into()));

        let commands = state.update(Msg::TimerTick);
        assert_eq!(
            commands,
            vec![Command::Fetch(ToolRequest::RefreshDashboard(Filter::default()))]
        );
    }

    #[test]
    fn test_filter_change_refetches_active_drilldown() {
        let mut state = ready_state();
        state.update(Msg::ApplicationSelected("DNS".into()));

        let commands = state.update(Msg::FilterChanged(Filter::last_hours(1)));
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[1],
            Command::Fetch(ToolRequest::ApplicationDetails {
                filter: Filter::last_hours(1),
                application: "DNS".into(),
            })
        );
    }
}
