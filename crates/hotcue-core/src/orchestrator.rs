//! The event loop tying matcher, dispatcher and router together.
//!
//! Snapshot replacements and events arrive on two independent channels and
//! are multiplexed with `tokio::select!`. Each event is matched against the
//! snapshot current at that instant; every networked destination batch is
//! sent on its own task and the tasks are joined before the next event is
//! taken, so one slow destination never holds up another.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::dispatcher::Dispatcher;
use crate::event::HotcueEvent;
use crate::matcher::match_event;
use crate::router::{Router, RouterError};
use crate::shutdown::Shutdown;
use crate::snapshot::{SnapshotCell, TriggerSnapshot};
use crate::trigger::ActionRef;
use crate::types::AppId;

// ---------------------------------------------------------------------------
// Local actions
// ---------------------------------------------------------------------------

/// Receives actions whose destination is handled in-process.
pub trait LocalActionSink: Send + Sync {
    fn deliver(&self, event: &HotcueEvent, action: &ActionRef);
}

/// Default sink: records each local action in the log and does nothing else.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl LocalActionSink for LoggingSink {
    fn deliver(&self, event: &HotcueEvent, action: &ActionRef) {
        let a = action.action();
        tracing::info!(
            app_id = %a.app_id,
            action_type = %a.action_type,
            deck = event.deck,
            cue_name = %event.cue_name,
            "local action"
        );
    }
}

// ---------------------------------------------------------------------------
// EventReport
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SendOutcome {
    pub destination: AppId,
    pub actions: usize,
    pub result: Result<(), RouterError>,
}

/// What happened to one event.
#[derive(Debug, Default)]
pub struct EventReport {
    /// Number of triggers that matched.
    pub matched: usize,
    pub local: Vec<ActionRef>,
    /// One entry per destination batch, in completion order.
    pub sends: Vec<SendOutcome>,
}

impl EventReport {
    pub fn failures(&self) -> impl Iterator<Item = &SendOutcome> {
        self.sends.iter().filter(|s| s.result.is_err())
    }

    pub fn outcome_for(&self, destination: &str) -> Option<&SendOutcome> {
        self.sends.iter().find(|s| s.destination == destination)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    snapshot: Arc<SnapshotCell>,
    dispatcher: Dispatcher,
    router: Arc<Router>,
    local: Arc<dyn LocalActionSink>,
    shutdown: Shutdown,
}

impl Orchestrator {
    /// Starts with an empty snapshot and the [`LoggingSink`].
    pub fn new(router: Router, dispatcher: Dispatcher, shutdown: Shutdown) -> Self {
        Self {
            snapshot: Arc::new(SnapshotCell::default()),
            dispatcher,
            router: Arc::new(router),
            local: Arc::new(LoggingSink),
            shutdown,
        }
    }

    /// Share an existing cell, e.g. with the config endpoint's read view.
    pub fn with_snapshot_cell(mut self, cell: Arc<SnapshotCell>) -> Self {
        self.snapshot = cell;
        self
    }

    pub fn with_local_sink(mut self, sink: Arc<dyn LocalActionSink>) -> Self {
        self.local = sink;
        self
    }

    pub fn snapshot_cell(&self) -> &Arc<SnapshotCell> {
        &self.snapshot
    }

    pub fn replace_snapshot(&self, next: TriggerSnapshot) {
        let (id, count) = (next.id(), next.len());
        let previous = self.snapshot.replace(next);
        tracing::info!(
            snapshot = %id,
            previous = %previous.id(),
            triggers = count,
            "trigger snapshot replaced"
        );
    }

    /// Match, dispatch and send for one event. Never fails: per-destination
    /// errors are logged and returned in the report.
    pub async fn handle_event(&self, event: HotcueEvent) -> EventReport {
        let snapshot = self.snapshot.load();
        let matched = match_event(&event, &snapshot);
        let mut report = EventReport {
            matched: matched.len(),
            ..EventReport::default()
        };

        if matched.is_empty() {
            tracing::debug!(
                deck = event.deck,
                hotcue_type = %event.hot_cue_type,
                cue_name = %event.cue_name,
                "no trigger matched"
            );
            return report;
        }

        let mut sends = JoinSet::new();
        for trigger in &matched {
            let dispatch = self.dispatcher.dispatch(trigger);

            for action in dispatch.local {
                self.local.deliver(&event, &action);
                report.local.push(action);
            }

            for batch in dispatch.networked {
                let router = Arc::clone(&self.router);
                let shutdown = self.shutdown.clone();
                sends.spawn(async move {
                    let result = router
                        .send_actions(&batch.destination, &batch.actions, &shutdown)
                        .await;
                    SendOutcome {
                        destination: batch.destination,
                        actions: batch.actions.len(),
                        result,
                    }
                });
            }
        }

        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Err(e) = &outcome.result {
                        let protocol = self
                            .router
                            .target(&outcome.destination)
                            .map(|t| t.protocol().as_str())
                            .unwrap_or("none");
                        tracing::warn!(
                            destination = %outcome.destination,
                            protocol,
                            config_error = e.is_config_error(),
                            error = %e,
                            "send failed"
                        );
                    }
                    report.sends.push(outcome);
                }
                Err(e) => tracing::error!(error = %e, "send task aborted"),
            }
        }

        report
    }

    /// Run until shutdown fires or the event channel closes. A closed
    /// snapshot channel only stops replacements.
    pub async fn run(
        self,
        mut snapshots: mpsc::Receiver<TriggerSnapshot>,
        mut events: mpsc::Receiver<HotcueEvent>,
    ) {
        tracing::info!("orchestrator started");
        let mut snapshots_open = true;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("orchestrator shutting down");
                    break;
                }
                next = snapshots.recv(), if snapshots_open => match next {
                    Some(snapshot) => self.replace_snapshot(snapshot),
                    None => {
                        tracing::debug!("snapshot channel closed");
                        snapshots_open = false;
                    }
                },
                next = events.recv() => match next {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => {
                        tracing::info!("event channel closed, orchestrator stopping");
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{AppTarget, HttpTarget, TcpTarget, UdpTarget};
    use crate::trigger::{Trigger, TriggerAction};
    use crate::types::{CueColor, CueMatchType, HotcueType};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::UdpSocket;

    fn drop_event() -> HotcueEvent {
        HotcueEvent::new(1, HotcueType::HotCue, CueColor::RED, "Drop")
    }

    fn drop_trigger(apps: &[&str]) -> Trigger {
        let mut trigger = Trigger::default()
            .with_type(HotcueType::HotCue)
            .with_color(CueColor::RED)
            .with_deck(1)
            .with_cue_name(CueMatchType::Exact, "Drop");
        for app in apps {
            trigger = trigger.with_action(TriggerAction::new(*app, "SendRequest"));
        }
        trigger
    }

    fn orchestrator(targets: BTreeMap<AppId, AppTarget>) -> Orchestrator {
        Orchestrator::new(Router::new(targets), Dispatcher::default(), Shutdown::never())
    }

    async fn udp_sink() -> (UdpSocket, String) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        (socket, addr)
    }

    async fn recv_datagram(socket: &UdpSocket) -> Vec<u8> {
        let mut buf = vec![0u8; 65536];
        let n = tokio::time::timeout(Duration::from_secs(2), socket.recv(&mut buf))
            .await
            .expect("datagram should arrive")
            .unwrap();
        buf.truncate(n);
        buf
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl LocalActionSink for RecordingSink {
        fn deliver(&self, _event: &HotcueEvent, action: &ActionRef) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}:{}", action.app_id(), action.action().action_type));
        }
    }

    #[tokio::test]
    async fn unmatched_event_sends_nothing() {
        let orch = orchestrator(BTreeMap::new());
        orch.replace_snapshot(TriggerSnapshot::new(vec![drop_trigger(&[
            AppId::HTTP_ENDPOINT,
        ])]));
        let mut event = drop_event();
        event.deck = 2;
        let report = orch.handle_event(event).await;
        assert_eq!(report.matched, 0);
        assert!(report.sends.is_empty());
    }

    #[tokio::test]
    async fn matching_event_posts_trigger_over_http() {
        let mut server = mockito::Server::new_async().await;
        let trigger = drop_trigger(&[AppId::HTTP_ENDPOINT]);
        let body = serde_json::to_string(&trigger).unwrap();
        let mock = server
            .mock("POST", "/cue")
            .match_body(mockito::Matcher::Exact(body))
            .with_status(200)
            .create_async()
            .await;

        let orch = orchestrator(BTreeMap::from([(
            AppId::new(AppId::HTTP_ENDPOINT),
            AppTarget::Http(HttpTarget::new(format!("{}/cue", server.url()))),
        )]));
        orch.replace_snapshot(TriggerSnapshot::new(vec![trigger]));

        let report = orch.handle_event(drop_event()).await;
        assert_eq!(report.matched, 1);
        assert_eq!(report.sends.len(), 1);
        assert!(report.sends[0].result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn two_matching_triggers_send_independently() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cue")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let (socket, udp_addr) = udp_sink().await;

        let orch = orchestrator(BTreeMap::from([
            (
                AppId::new(AppId::HTTP_ENDPOINT),
                AppTarget::Http(HttpTarget::new(format!("{}/cue", server.url()))),
            ),
            (
                AppId::new(AppId::UDP_ENDPOINT),
                AppTarget::Udp(UdpTarget::new(udp_addr)),
            ),
        ]));
        let udp_trigger = drop_trigger(&[AppId::UDP_ENDPOINT]);
        let expected = serde_json::to_vec(&udp_trigger).unwrap();
        orch.replace_snapshot(TriggerSnapshot::new(vec![
            drop_trigger(&[AppId::HTTP_ENDPOINT]),
            udp_trigger,
        ]));

        let report = orch.handle_event(drop_event()).await;
        assert_eq!(report.matched, 2);
        assert_eq!(report.sends.len(), 2);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(recv_datagram(&socket).await, expected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_target_does_not_stop_other_triggers() {
        let (socket, udp_addr) = udp_sink().await;
        let orch = orchestrator(BTreeMap::from([(
            AppId::new(AppId::UDP_ENDPOINT),
            AppTarget::Udp(UdpTarget::new(udp_addr)),
        )]));
        orch.replace_snapshot(TriggerSnapshot::new(vec![
            drop_trigger(&[AppId::TCP_ENDPOINT]),
            drop_trigger(&[AppId::UDP_ENDPOINT]),
        ]));

        let report = orch.handle_event(drop_event()).await;
        let tcp = report.outcome_for(AppId::TCP_ENDPOINT).unwrap();
        assert!(matches!(tcp.result, Err(RouterError::NoTarget(_))));
        let udp = report.outcome_for(AppId::UDP_ENDPOINT).unwrap();
        assert!(udp.result.is_ok());
        assert!(!recv_datagram(&socket).await.is_empty());
    }

    #[tokio::test]
    async fn slow_destination_does_not_block_healthy_one() {
        // Accepts TCP but never answers HTTP, so the request runs into its timeout.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let silent_addr = silent.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = silent.accept().await {
                held.push(stream);
            }
        });
        let (socket, udp_addr) = udp_sink().await;

        let mut http = HttpTarget::new(format!("http://{silent_addr}/cue"));
        http.timeout_ms = Some(300);
        let orch = orchestrator(BTreeMap::from([
            (AppId::new(AppId::HTTP_ENDPOINT), AppTarget::Http(http)),
            (
                AppId::new(AppId::UDP_ENDPOINT),
                AppTarget::Udp(UdpTarget::new(udp_addr)),
            ),
        ]));
        orch.replace_snapshot(TriggerSnapshot::new(vec![drop_trigger(&[
            AppId::HTTP_ENDPOINT,
            AppId::UDP_ENDPOINT,
        ])]));

        let handle = tokio::spawn(async move { orch.handle_event(drop_event()).await });
        // The datagram lands while the HTTP send is still waiting.
        let datagram = tokio::time::timeout(Duration::from_millis(250), async {
            let mut buf = vec![0u8; 65536];
            socket.recv(&mut buf).await.map(|n| n > 0)
        })
        .await;
        assert!(matches!(datagram, Ok(Ok(true))));

        let report = handle.await.unwrap();
        let http = report.outcome_for(AppId::HTTP_ENDPOINT).unwrap();
        assert!(http.result.is_err());
        assert!(report.outcome_for(AppId::UDP_ENDPOINT).unwrap().result.is_ok());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn local_actions_go_to_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let orch = orchestrator(BTreeMap::new()).with_local_sink(sink.clone());
        orch.replace_snapshot(TriggerSnapshot::new(vec![drop_trigger(&[
            AppId::OBS,
            AppId::LIGHTING_CONTROLLER,
        ])]));

        let report = orch.handle_event(drop_event()).await;
        assert_eq!(report.local.len(), 2);
        assert!(report.sends.is_empty());
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec!["OBS:SendRequest", "LightingController:SendRequest"]
        );
    }

    #[tokio::test]
    async fn run_applies_snapshots_and_stops_on_shutdown() {
        let (socket, udp_addr) = udp_sink().await;
        let (trigger, shutdown) = Shutdown::new();
        let orch = Orchestrator::new(
            Router::new(BTreeMap::from([(
                AppId::new(AppId::UDP_ENDPOINT),
                AppTarget::Udp(UdpTarget::new(udp_addr)),
            )])),
            Dispatcher::default(),
            shutdown,
        );
        let cell = Arc::clone(orch.snapshot_cell());
        let (snapshot_tx, snapshot_rx) = mpsc::channel(4);
        let (event_tx, event_rx) = mpsc::channel(4);
        let task = tokio::spawn(orch.run(snapshot_rx, event_rx));

        let snapshot = TriggerSnapshot::new(vec![drop_trigger(&[AppId::UDP_ENDPOINT])]);
        let id = snapshot.id();
        snapshot_tx.send(snapshot).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while cell.load().id() != id {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snapshot should be applied");

        event_tx.send(drop_event()).await.unwrap();
        assert!(!recv_datagram(&socket).await.is_empty());

        trigger.cancel();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("loop should exit")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_sends() {
        let (trigger, shutdown) = Shutdown::new();
        let mut tcp = TcpTarget::new("10.255.255.1:9");
        tcp.timeout_ms = Some(30_000);
        let orch = Orchestrator::new(
            Router::new(BTreeMap::from([(
                AppId::new(AppId::TCP_ENDPOINT),
                AppTarget::Tcp(tcp),
            )])),
            Dispatcher::default(),
            shutdown,
        );
        orch.replace_snapshot(TriggerSnapshot::new(vec![drop_trigger(&[
            AppId::TCP_ENDPOINT,
        ])]));
        trigger.cancel();

        let report = tokio::time::timeout(Duration::from_secs(2), orch.handle_event(drop_event()))
            .await
            .expect("cancelled send should return promptly");
        let outcome = report.outcome_for(AppId::TCP_ENDPOINT).unwrap();
        assert!(matches!(outcome.result, Err(RouterError::Cancelled)));
    }

    #[tokio::test]
    async fn run_exits_when_event_channel_closes() {
        let orch = orchestrator(BTreeMap::new());
        let (_snapshot_tx, snapshot_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::channel(1);
        drop(event_tx);
        tokio::time::timeout(Duration::from_secs(1), orch.run(snapshot_rx, event_rx))
            .await
            .expect("loop should exit");
    }
}
