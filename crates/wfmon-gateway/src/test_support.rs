use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::DeliveryError;
use crate::registry::{Connection, ConnectionId};

/// In-memory connection that records every frame it is sent.
pub(crate) struct RecordingConnection {
    id: ConnectionId,
    frames: Mutex<Vec<String>>,
    fail: AtomicBool,
    closed: AtomicBool,
}

impl RecordingConnection {
    pub(crate) fn new(id: ConnectionId) -> Arc<Self> {
        Arc::new(Self {
            id,
            frames: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn failing(id: ConnectionId) -> Arc<Self> {
        let conn = Self::new(id);
        conn.fail.store(true, Ordering::SeqCst);
        conn
    }

    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    pub(crate) fn json_frames(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, text: &str) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.frames.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
