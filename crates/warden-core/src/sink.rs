//! Audit sink implementations and the best-effort forwarding helper.
//!
//! Committing to the ledger and notifying the sink are separate phases. The
//! governor and the ledger call `forward()` only after a record is committed,
//! and `forward()` never returns an error: a failed submission is logged and
//! dropped.
//!
//! - `MemorySink` keeps every event in memory (tests, demos).
//! - `TracingSink` turns events into `tracing` log lines.
//! - `FanoutSink` submits every event to several sinks.
//! - `QueuedSink` hands events to a background worker over a channel, so
//!   a slow or hanging downstream sink never stalls the caller.

use std::{
    sync::{mpsc, Arc, Mutex},
    thread::JoinHandle,
};

use tracing::{debug, error, info, warn};

use warden_contracts::{
    error::{WardenError, WardenResult},
    event::{EventLevel, SinkEvent},
};

use crate::traits::AuditSink;

/// Submit `event` to `sink`, logging and swallowing any failure.
pub fn forward(sink: &dyn AuditSink, event: SinkEvent) {
    if let Err(e) = sink.submit(&event) {
        warn!(
            agent_id = %event.agent_id,
            event_type = %event.event_type,
            error = %e,
            "audit sink rejected event; continuing"
        );
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// Collects events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every event received so far, in arrival order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()> {
        let mut events = self.events.lock().map_err(|e| WardenError::SinkUnavailable {
            reason: format!("memory sink lock poisoned: {}", e),
        })?;
        events.push(event.clone());
        Ok(())
    }
}

// ── TracingSink ───────────────────────────────────────────────────────────────

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()> {
        let payload = serde_json::to_string(&event.payload)?;
        match event.level {
            EventLevel::Error => error!(
                agent_id = %event.agent_id,
                event_type = %event.event_type,
                payload = %payload,
                "audit event"
            ),
            EventLevel::Warning => warn!(
                agent_id = %event.agent_id,
                event_type = %event.event_type,
                payload = %payload,
                "audit event"
            ),
            EventLevel::Info | EventLevel::Success => info!(
                agent_id = %event.agent_id,
                event_type = %event.event_type,
                level = %event.level,
                payload = %payload,
                "audit event"
            ),
        }
        Ok(())
    }
}

// ── FanoutSink ────────────────────────────────────────────────────────────────

/// Submits each event to every inner sink in order.
///
/// One failing sink does not keep the event from the others; the first
/// failure is returned after all of them were tried.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AuditSink for FanoutSink {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.submit(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── QueuedSink ────────────────────────────────────────────────────────────────

/// Fire-and-forget wrapper that delivers events to an inner sink on a
/// dedicated worker thread.
///
/// `submit` only enqueues. Failures of the inner sink are logged by the
/// worker and never retried. Dropping the sink (or calling `shutdown`)
/// closes the queue and waits for the worker to drain what was enqueued.
pub struct QueuedSink {
    sender: Mutex<Option<mpsc::Sender<SinkEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedSink {
    /// Start a worker that forwards queued events to `inner`.
    pub fn spawn(inner: Arc<dyn AuditSink>) -> WardenResult<Self> {
        let (tx, rx) = mpsc::channel::<SinkEvent>();

        let worker = std::thread::Builder::new()
            .name("warden-sink".to_string())
            .spawn(move || {
                let mut delivered: u64 = 0;
                for event in rx {
                    forward(inner.as_ref(), event);
                    delivered += 1;
                }
                debug!(delivered, "sink worker drained queue and stopped");
            })
            .map_err(|e| WardenError::SinkUnavailable {
                reason: format!("failed to start sink worker: {}", e),
            })?;

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Close the queue and block until every enqueued event was handed to
    /// the inner sink. Later submissions fail with `SinkUnavailable`.
    pub fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let handle = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("sink worker panicked during shutdown");
            }
        }
    }
}

impl AuditSink for QueuedSink {
    fn submit(&self, event: &SinkEvent) -> WardenResult<()> {
        let sender = self.sender.lock().map_err(|e| WardenError::SinkUnavailable {
            reason: format!("sink queue lock poisoned: {}", e),
        })?;
        match sender.as_ref() {
            Some(tx) => tx.send(event.clone()).map_err(|_| WardenError::SinkUnavailable {
                reason: "sink worker has stopped".to_string(),
            }),
            None => Err(WardenError::SinkUnavailable {
                reason: "sink queue is shut down".to_string(),
            }),
        }
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use warden_contracts::{
        agent::AgentId,
        error::{WardenError, WardenResult},
        event::{EventLevel, EventType, SinkEvent},
    };

    use super::{forward, FanoutSink, MemorySink, QueuedSink, TracingSink};
    use crate::traits::AuditSink;

    fn event(n: u64) -> SinkEvent {
        SinkEvent::new(AgentId::new("A1"), EventType::Ledger, EventLevel::Info, json!({ "n": n }))
    }

    /// A sink that always fails and counts attempts.
    struct BrokenSink {
        attempts: Arc<Mutex<u32>>,
    }

    impl AuditSink for BrokenSink {
        fn submit(&self, _event: &SinkEvent) -> WardenResult<()> {
            *self.attempts.lock().unwrap() += 1;
            Err(WardenError::SinkUnavailable { reason: "endpoint down".to_string() })
        }
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.submit(&event(1)).unwrap();
        sink.submit(&event(2)).unwrap();

        assert_eq!(handle.len(), 2);
        assert_eq!(handle.events()[1].payload["n"], 2);
    }

    #[test]
    fn forward_swallows_sink_failures() {
        let attempts = Arc::new(Mutex::new(0));
        let sink = BrokenSink { attempts: attempts.clone() };

        forward(&sink, event(1));

        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn tracing_sink_accepts_every_level() {
        let sink = TracingSink;
        for level in [EventLevel::Info, EventLevel::Warning, EventLevel::Error, EventLevel::Success] {
            let e = SinkEvent::new(AgentId::new("A1"), EventType::Alert, level, json!({}));
            assert!(sink.submit(&e).is_ok());
        }
    }

    #[test]
    fn fanout_reaches_every_sink_despite_failures() {
        let attempts = Arc::new(Mutex::new(0));
        let memory = MemorySink::new();
        let fanout = FanoutSink::new(vec![Arc::new(BrokenSink { attempts: attempts.clone() })])
            .with(Arc::new(memory.clone()));

        assert!(matches!(
            fanout.submit(&event(1)),
            Err(WardenError::SinkUnavailable { .. })
        ));
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn queued_sink_delivers_in_order_after_shutdown() {
        let inner = MemorySink::new();
        let queued = QueuedSink::spawn(Arc::new(inner.clone())).unwrap();

        for n in 0..20 {
            queued.submit(&event(n)).unwrap();
        }
        queued.shutdown();

        let delivered = inner.events();
        assert_eq!(delivered.len(), 20);
        for (n, e) in delivered.iter().enumerate() {
            assert_eq!(e.payload["n"], n as u64);
        }
    }

    #[test]
    fn queued_sink_rejects_after_shutdown() {
        let queued = QueuedSink::spawn(Arc::new(MemorySink::new())).unwrap();
        queued.shutdown();

        assert!(matches!(
            queued.submit(&event(1)),
            Err(WardenError::SinkUnavailable { .. })
        ));
    }

    #[test]
    fn queued_sink_survives_failing_inner_sink() {
        let attempts = Arc::new(Mutex::new(0));
        let queued =
            QueuedSink::spawn(Arc::new(BrokenSink { attempts: attempts.clone() })).unwrap();

        queued.submit(&event(1)).unwrap();
        queued.submit(&event(2)).unwrap();
        drop(queued);

        assert_eq!(*attempts.lock().unwrap(), 2);
    }
}
