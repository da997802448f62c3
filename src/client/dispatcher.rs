//! Executes [`Command`]s and feeds their outcomes back as [`Msg`]s.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{ToolTransport, TransportError};
use crate::state::{Command, Msg};
use crate::tools::{ToolRequest, ToolResponse};

/// Runs fetches on a transport and owns the auto-refresh timer.
///
/// Fetches are never cancelled. A superseded one still lands and the state
/// reconciles it.
#[derive(Debug)]
pub struct Dispatcher {
    transport: Arc<dyn ToolTransport>,
    tx: UnboundedSender<Msg>,
    timer: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn ToolTransport>, tx: UnboundedSender<Msg>) -> Self {
        Self {
            transport,
            tx,
            timer: None,
        }
    }

    pub fn transport(&self) -> &Arc<dyn ToolTransport> {
        &self.transport
    }

    pub fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Execute commands in order.
    pub fn run(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            match command {
                Command::Fetch(request) => self.fetch(request),
                Command::StartTimer(period) => self.start_timer(period),
                Command::CancelTimer => self.cancel_timer(),
            }
        }
    }

    fn fetch(&self, request: ToolRequest) {
        let transport = self.transport.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            debug!(tool = request.name().as_str(), "Fetching");
            let result = transport.call(request.clone()).await;
            if let Err(e) = &result {
                warn!(tool = request.name().as_str(), error = %e, "Fetch failed");
            }
            // the receiver is gone once the client has shut down
            let _ = tx.send(into_msg(request, result));
        });
    }

    fn start_timer(&mut self, period: Duration) {
        self.cancel_timer();
        let tx = self.tx.clone();

        self.timer = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Msg::TimerTick).is_err() {
                    break;
                }
            }
        }));
        debug!(period_secs = period.as_secs(), "Auto-refresh timer started");
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("Auto-refresh timer cancelled");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn into_msg(request: ToolRequest, result: Result<ToolResponse, TransportError>) -> Msg {
    match request {
        ToolRequest::ShowDashboard(_) | ToolRequest::RefreshDashboard(_) => {
            Msg::SnapshotReceived(match result {
                Ok(ToolResponse::Dashboard { snapshot, .. }) | Ok(ToolResponse::Snapshot(snapshot)) => {
                    Ok(snapshot)
                }
                Ok(ToolResponse::Detail(_)) => Err("unexpected detail response".to_string()),
                Err(e) => Err(e.to_string()),
            })
        }
        ToolRequest::ApplicationDetails { application, .. } => Msg::DetailReceived {
            application,
            result: match result {
                Ok(ToolResponse::Detail(detail)) => Ok(detail),
                Ok(_) => Err("unexpected dashboard response".to_string()),
                Err(e) => Err(e.to_string()),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LocalTransport;
    use crate::tools::ToolSurface;
    use netwatch_store::{ScriptedStore, StoreError, TelemetryAggregator};
    use netwatch_types::Filter;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn dispatcher(store: ScriptedStore) -> (Dispatcher, UnboundedReceiver<Msg>) {
        let surface = ToolSurface::new(TelemetryAggregator::new(Arc::new(store)));
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher::new(Arc::new(LocalTransport::new(surface)), tx), rx)
    }

    #[tokio::test]
    async fn test_fetch_feeds_snapshot_back() {
        let (mut dispatcher, mut rx) = dispatcher(ScriptedStore::new());
        dispatcher.run([Command::Fetch(ToolRequest::RefreshDashboard(Filter::last_hours(6)))]);

        match rx.recv().await.unwrap() {
            Msg::SnapshotReceived(Ok(snapshot)) => assert_eq!(snapshot.filter.hours(), 6),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_detail_fetch_carries_application() {
        let (mut dispatcher, mut rx) = dispatcher(ScriptedStore::failing(StoreError::Timeout));
        dispatcher.run([Command::Fetch(ToolRequest::ApplicationDetails {
            filter: Filter::default(),
            application: "DNS".into(),
        })]);

        match rx.recv().await.unwrap() {
            Msg::DetailReceived {
                application,
                result: Err(message),
            } => {
                assert_eq!(application, "DNS");
                assert!(message.contains("Request timed out"));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_until_cancelled() {
        let (mut dispatcher, mut rx) = dispatcher(ScriptedStore::new());
        let started = Instant::now();

        dispatcher.run([Command::StartTimer(Duration::from_secs(60))]);
        assert!(dispatcher.timer_running());

        assert_eq!(rx.recv().await, Some(Msg::TimerTick));
        assert_eq!(rx.recv().await, Some(Msg::TimerTick));
        assert!(started.elapsed() >= Duration::from_secs(120));

        dispatcher.run([Command::CancelTimer]);
        assert!(!dispatcher.timer_running());
        let next = time::timeout(Duration::from_secs(600), rx.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_timer_replaces_it() {
        let (mut dispatcher, mut rx) = dispatcher(ScriptedStore::new());

        dispatcher.run([
            Command::StartTimer(Duration::from_secs(60)),
            Command::StartTimer(Duration::from_secs(60)),
        ]);

        assert_eq!(rx.recv().await, Some(Msg::TimerTick));
        // only one timer: nothing else arrives before the next period
        let early = time::timeout(Duration::from_secs(59), rx.recv()).await;
        assert!(early.is_err());
    }
}
