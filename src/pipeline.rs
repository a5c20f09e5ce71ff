// Ingest pipeline: the single writer of the rolling window.
// A mutation and the publish of its event happen under one write lock, so the
// event order on the bus always matches the order the window saw.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::aggregator::Aggregator;
use crate::grammar::decode_line;
use crate::models::{DecodedLine, TelemetryEvent, WindowSnapshot};

/// Counters reported in the periodic stats log line.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub samples_appended: AtomicU64,
    pub interval_updates: AtomicU64,
    pub lines_ignored: AtomicU64,
    pub resets: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub samples_appended: u64,
    pub interval_updates: u64,
    pub lines_ignored: u64,
    pub resets: u64,
}

#[derive(Clone)]
pub struct Pipeline {
    aggregator: Arc<Aggregator>,
    events: broadcast::Sender<TelemetryEvent>,
    counters: Arc<PipelineCounters>,
    write_lock: Arc<Mutex<()>>,
}

impl Pipeline {
    pub fn new(aggregator: Arc<Aggregator>, events: broadcast::Sender<TelemetryEvent>) -> Self {
        Self {
            aggregator,
            events,
            counters: Arc::new(PipelineCounters::default()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Convenience constructor owning a fresh broadcast bus.
    pub fn with_capacity(aggregator: Arc<Aggregator>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self::new(aggregator, events)
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.aggregator.snapshot()
    }

    /// Decode one framed line and apply it. Unrecognized lines yield `None`.
    pub fn ingest_line(&self, line: &str) -> Option<TelemetryEvent> {
        let decoded = decode_line(line);
        if matches!(decoded, DecodedLine::Unrecognized) {
            tracing::trace!(line, "ignoring unrecognized line");
        }
        self.apply(decoded)
    }

    pub fn apply(&self, decoded: DecodedLine) -> Option<TelemetryEvent> {
        if matches!(decoded, DecodedLine::Unrecognized) {
            self.counters.lines_ignored.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let _writer = self.writer();
        let event = match decoded {
            DecodedLine::Sample(sample) => {
                let (timestamp, values) = self.aggregator.append_sample(&sample);
                self.counters.samples_appended.fetch_add(1, Ordering::Relaxed);
                TelemetryEvent::SampleAppended { timestamp, values }
            }
            DecodedLine::Interval(seconds) => {
                self.aggregator.set_interval(seconds);
                self.counters.interval_updates.fetch_add(1, Ordering::Relaxed);
                tracing::info!(interval_secs = seconds, "sample interval updated");
                TelemetryEvent::IntervalChanged {
                    seconds: self.aggregator.interval(),
                }
            }
            DecodedLine::Unrecognized => return None,
        };
        self.publish(event.clone());
        Some(event)
    }

    /// Clear the window and tell every consumer.
    pub fn reset(&self) {
        let _writer = self.writer();
        self.aggregator.reset();
        self.counters.resets.fetch_add(1, Ordering::Relaxed);
        tracing::info!("rolling window reset");
        self.publish(TelemetryEvent::BufferReset);
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            samples_appended: self.counters.samples_appended.load(Ordering::Relaxed),
            interval_updates: self.counters.interval_updates.load(Ordering::Relaxed),
            lines_ignored: self.counters.lines_ignored.load(Ordering::Relaxed),
            resets: self.counters.resets.load(Ordering::Relaxed),
        }
    }

    // Never blocks: with no subscribers the event is simply dropped.
    fn publish(&self, event: TelemetryEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!(operation = "publish_event", "no event subscribers");
        }
    }
}
