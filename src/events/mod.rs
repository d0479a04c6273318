//! Best-effort audit event sinks.
//!
//! Recording an event must never block or fail the operation it describes.
//! Callers go through [`emit`], which logs and swallows sink errors.

use std::sync::Mutex;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::EventRecord;
use crate::error::{PhasegateError, Result};

/// Destination for audit events.
pub trait EventSink: Send + Sync {
    /// Record an event without waiting on I/O.
    fn record(&self, event: EventRecord) -> Result<()>;
}

/// Record an event, logging instead of propagating failures.
pub fn emit(sink: &dyn EventSink, event: EventRecord) {
    let event_type = event.event_type.clone();
    if let Err(e) = sink.record(event) {
        warn!("Event sink unavailable, dropping {}: {}", event_type, e);
    }
}

/// Sink that writes events to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn record(&self, event: EventRecord) -> Result<()> {
        debug!(
            "event {} subject={} payload={}",
            event.event_type,
            event.subject.as_deref().unwrap_or("-"),
            event.payload
        );
        Ok(())
    }
}

/// Sink that keeps events in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<EventRecord>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events of one type, in recording order.
    pub fn of_type(&self, event_type: &str) -> Vec<EventRecord> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: EventRecord) -> Result<()> {
        self.events
            .lock()
            .map_err(|e| PhasegateError::Storage(e.to_string()))?
            .push(event);
        Ok(())
    }
}

/// Bounded queue drained by a background worker into another sink.
///
/// `record` never awaits: a full queue drops the event with an error the
/// caller logs.
pub struct QueuedEventSink {
    tx: mpsc::Sender<EventRecord>,
}

impl QueuedEventSink {
    /// Start the drain worker. The worker exits once every sender is dropped.
    pub fn spawn<S>(inner: S, capacity: usize) -> (Self, JoinHandle<()>)
    where
        S: EventSink + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<EventRecord>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                emit(&inner, event);
            }
        });
        (Self { tx }, handle)
    }
}

impl EventSink for QueuedEventSink {
    fn record(&self, event: EventRecord) -> Result<()> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PhasegateError::Storage("event queue full".into()),
            mpsc::error::TrySendError::Closed(_) => PhasegateError::Storage("event queue closed".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FailingSink;

    impl EventSink for FailingSink {
        fn record(&self, _event: EventRecord) -> Result<()> {
            Err(PhasegateError::Storage("audit backend down".into()))
        }
    }

    #[test]
    fn test_emit_swallows_errors() {
        emit(&FailingSink, EventRecord::phase_failed("design", "gate failed"));
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        emit(&sink, EventRecord::agent_started("a", "design"));
        emit(&sink, EventRecord::agent_failed("a", "boom"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "agent.started");
        assert_eq!(sink.of_type("agent.failed").len(), 1);
    }

    struct SharedSink(Arc<MemoryEventSink>);

    impl EventSink for SharedSink {
        fn record(&self, event: EventRecord) -> Result<()> {
            self.0.record(event)
        }
    }

    #[tokio::test]
    async fn test_queued_sink_drains_to_inner() {
        let memory = Arc::new(MemoryEventSink::new());
        let (queued, handle) = QueuedEventSink::spawn(SharedSink(memory.clone()), 8);

        queued.record(EventRecord::agent_started("a", "design")).unwrap();
        queued.record(EventRecord::agent_started("b", "design")).unwrap();
        drop(queued);
        handle.await.unwrap();

        assert_eq!(memory.events().len(), 2);
    }

    #[tokio::test]
    async fn test_queued_sink_full_queue_errors() {
        // Receiver is never drained
        let (tx, _rx) = mpsc::channel::<EventRecord>(1);
        let queued = QueuedEventSink { tx };
        queued.record(EventRecord::agent_started("a", "design")).unwrap();
        let err = queued.record(EventRecord::agent_started("b", "design"));
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_queued_sink_closed_queue_errors() {
        let (tx, rx) = mpsc::channel::<EventRecord>(4);
        drop(rx);
        let queued = QueuedEventSink { tx };
        assert!(queued.record(EventRecord::agent_started("a", "design")).is_err());
    }
}
