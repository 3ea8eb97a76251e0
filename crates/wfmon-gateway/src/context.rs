//! Service-wide context: the event log, the viewer registry and the
//! shutdown token, built once at startup and shared by every handler.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use wfmon_core::{Event, EventDraft, EventLog, MonitorState};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::frame::PushFrame;
use crate::registry::{Connection, ConnectionRegistry, Registration};

pub struct MonitorContext {
    log: Mutex<EventLog>,
    registry: Arc<ConnectionRegistry>,
    viewer_slots: Arc<Semaphore>,
    init_limit: usize,
    outbound_queue: usize,
    shutdown: CancellationToken,
}

impl MonitorContext {
    pub fn new(config: &GatewayConfig, shutdown: CancellationToken) -> Self {
        Self {
            log: Mutex::new(EventLog::new(config.capacity)),
            registry: Arc::new(ConnectionRegistry::new()),
            viewer_slots: Arc::new(Semaphore::new(config.max_connections)),
            init_limit: config.init_limit,
            outbound_queue: config.outbound_queue,
            shutdown,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn outbound_queue(&self) -> usize {
        self.outbound_queue
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Append a draft and fan the stored event out to every viewer.
    ///
    /// The log lock is held across the broadcast enqueue so viewers see
    /// events in append order.
    pub async fn ingest(&self, draft: EventDraft) -> Result<Event, GatewayError> {
        let mut log = self.log.lock().await;
        let event = log.append(draft, Utc::now())?;
        let frame = PushFrame::Event {
            event: event.clone(),
        }
        .to_text()?;
        let report = self.registry.broadcast(&frame);
        drop(log);

        tracing::debug!(
            agent = %event.agent,
            action = %event.action,
            delivered = report.delivered,
            failed = report.failed.len(),
            "event ingested"
        );
        Ok(event)
    }

    pub async fn events(&self, limit: Option<usize>) -> Vec<Event> {
        self.log.lock().await.events(limit)
    }

    pub async fn state(&self) -> MonitorState {
        self.log.lock().await.state()
    }

    /// Administrative reset of the log and the derived state.
    pub async fn clear(&self) {
        let mut log = self.log.lock().await;
        let dropped = log.len();
        log.clear();
        drop(log);
        tracing::info!(dropped, "event log cleared");
    }

    /// Register a freshly accepted viewer and queue its `init` snapshot.
    ///
    /// Runs under the log lock, so no event can be broadcast between the
    /// registration and the snapshot: `init` is always the first frame.
    pub async fn attach(&self, conn: Arc<dyn Connection>) -> Result<Registration, GatewayError> {
        let log = self.log.lock().await;
        self.registry.register(Arc::clone(&conn));
        let registration = Registration::new(Arc::clone(&self.registry), conn.id());

        let (events, state) = log.snapshot(Some(self.init_limit));
        let frame = PushFrame::Init { events, state }.to_text()?;
        self.registry.send_direct(&conn, &frame)?;
        drop(log);

        Ok(registration)
    }

    /// Reply to one connection with an `error` frame.
    pub fn send_error(&self, conn: &Arc<dyn Connection>, message: &str) {
        match PushFrame::error(message).to_text() {
            Ok(frame) => {
                let _ = self.registry.send_direct(conn, &frame);
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode error frame"),
        }
    }

    /// Claim one of the bounded viewer slots, if any is free.
    pub fn try_reserve_viewer(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.viewer_slots).try_acquire_owned().ok()
    }

    /// Teardown: stop every subscription loop and drop all viewers.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.registry.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingConnection;

    fn context() -> MonitorContext {
        MonitorContext::new(&GatewayConfig::default(), CancellationToken::new())
    }

    fn as_dyn(conn: &Arc<RecordingConnection>) -> Arc<dyn Connection> {
        conn.clone()
    }

    #[tokio::test]
    async fn ingest_appends_and_broadcasts() {
        let ctx = context();
        let viewer = RecordingConnection::new(1);
        let _reg = ctx.attach(as_dyn(&viewer)).await.unwrap();

        let event = ctx
            .ingest(EventDraft::new("architect", "start").with_workflow("design-feature"))
            .await
            .unwrap();

        let frames = viewer.json_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["type"], "init");
        assert_eq!(frames[1]["type"], "event");
        assert_eq!(frames[1]["event"]["agent"], "architect");
        assert_eq!(
            frames[1]["event"],
            serde_json::to_value(&event).unwrap(),
            "broadcast carries the stored event"
        );

        let state = ctx.state().await;
        assert_eq!(state.active_agent.as_deref(), Some("architect"));
        assert_eq!(state.active_workflow.as_deref(), Some("design-feature"));
        assert_eq!(state.event_count, 1);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_without_mutation() {
        let ctx = context();
        let viewer = RecordingConnection::new(1);
        let _reg = ctx.attach(as_dyn(&viewer)).await.unwrap();

        let err = ctx.ingest(EventDraft::default()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(ctx.state().await.event_count, 0);
        assert_eq!(viewer.frames().len(), 1, "only the init frame");
    }

    #[tokio::test]
    async fn init_snapshot_is_capped() {
        let ctx = context();
        for i in 0..150 {
            ctx.ingest(EventDraft::new(format!("a{i}"), "progress"))
                .await
                .unwrap();
        }
        let viewer = RecordingConnection::new(1);
        let _reg = ctx.attach(as_dyn(&viewer)).await.unwrap();

        let frames = viewer.json_frames();
        assert_eq!(frames.len(), 1);
        let events = frames[0]["events"].as_array().unwrap();
        assert_eq!(events.len(), 100);
        assert_eq!(events[0]["agent"], "a50");
        assert_eq!(events[99]["agent"], "a149");
        assert_eq!(frames[0]["state"]["event_count"], 150);
    }

    #[tokio::test]
    async fn two_viewers_see_identical_event_frames() {
        let ctx = context();
        let a = RecordingConnection::new(1);
        let b = RecordingConnection::new(2);
        let _ra = ctx.attach(as_dyn(&a)).await.unwrap();
        let _rb = ctx.attach(as_dyn(&b)).await.unwrap();

        ctx.ingest(EventDraft::new("architect", "start")).await.unwrap();
        ctx.ingest(EventDraft::new("architect", "end")).await.unwrap();

        assert_eq!(a.frames()[1..], b.frames()[1..]);
        assert_eq!(a.json_frames()[1]["event"]["action"], "start");
        assert_eq!(a.json_frames()[2]["event"]["action"], "end");
    }

    #[tokio::test]
    async fn failing_viewer_does_not_block_ingest() {
        let ctx = context();
        let healthy = RecordingConnection::new(1);
        let _reg = ctx.attach(as_dyn(&healthy)).await.unwrap();

        // a viewer whose transport died after its handshake
        let broken = RecordingConnection::failing(2);
        ctx.registry().register(as_dyn(&broken));

        ctx.ingest(EventDraft::new("architect", "start")).await.unwrap();

        assert_eq!(healthy.json_frames().len(), 2);
        assert_eq!(ctx.registry().connection_count(), 1);
        assert!(broken.is_closed());
    }

    #[tokio::test]
    async fn attach_to_dead_connection_fails_and_releases() {
        let ctx = context();
        let dead = RecordingConnection::failing(1);
        let result = ctx.attach(as_dyn(&dead)).await;
        assert!(matches!(result, Err(GatewayError::Delivery(_))));
        assert_eq!(ctx.registry().connection_count(), 0);
    }

    #[tokio::test]
    async fn dropping_registration_releases_slot() {
        let ctx = context();
        let viewer = RecordingConnection::new(1);
        let reg = ctx.attach(as_dyn(&viewer)).await.unwrap();
        assert_eq!(ctx.registry().connection_count(), 1);
        drop(reg);
        assert_eq!(ctx.registry().connection_count(), 0);
    }

    #[tokio::test]
    async fn clear_resets_count_and_state_together() {
        let ctx = context();
        ctx.ingest(EventDraft::new("architect", "start")).await.unwrap();
        ctx.ingest(EventDraft::new("coder", "error")).await.unwrap();

        ctx.clear().await;

        assert!(ctx.events(None).await.is_empty());
        assert_eq!(ctx.state().await, MonitorState::default());
    }

    #[tokio::test]
    async fn readers_never_see_count_out_of_step_with_log() {
        let ctx = Arc::new(context());
        let writer = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                for i in 0..200 {
                    ctx.ingest(EventDraft::new(format!("a{i}"), "start"))
                        .await
                        .unwrap();
                    if i % 50 == 49 {
                        ctx.clear().await;
                    }
                }
            })
        };

        for _ in 0..200 {
            let log = ctx.log.lock().await;
            let (events, state) = log.snapshot(None);
            drop(log);
            assert_eq!(state.event_count, events.len());
            if events.is_empty() {
                assert!(state.active_agent.is_none());
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn error_reply_targets_one_connection() {
        let ctx = context();
        let a = RecordingConnection::new(1);
        let b = RecordingConnection::new(2);
        let _ra = ctx.attach(as_dyn(&a)).await.unwrap();
        let _rb = ctx.attach(as_dyn(&b)).await.unwrap();

        ctx.send_error(&as_dyn(&a), "Invalid JSON");

        assert_eq!(a.json_frames()[1]["type"], "error");
        assert_eq!(b.frames().len(), 1);
    }

    #[tokio::test]
    async fn viewer_slots_are_bounded() {
        let config = GatewayConfig::default().with_max_connections(1);
        let ctx = MonitorContext::new(&config, CancellationToken::new());
        let first = ctx.try_reserve_viewer();
        assert!(first.is_some());
        assert!(ctx.try_reserve_viewer().is_none());
        drop(first);
        assert!(ctx.try_reserve_viewer().is_some());
    }

    #[tokio::test]
    async fn shutdown_closes_viewers() {
        let ctx = context();
        let viewer = RecordingConnection::new(1);
        let _reg = ctx.attach(as_dyn(&viewer)).await.unwrap();

        ctx.shutdown();
        assert!(viewer.is_closed());
        assert!(ctx.shutdown_token().is_cancelled());
        assert_eq!(ctx.registry().connection_count(), 0);
    }
}
