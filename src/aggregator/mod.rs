// Rolling aggregator: bounded per-channel history plus a logical clock.
// The network task is the only writer; readers take snapshots.

mod merge;
mod series;

pub use merge::merge_with_last;
pub use series::ChannelSeries;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::grammar::clamp_interval;
use crate::models::{Channel, ChannelValues, MetricSample, WindowSnapshot};

/// Samples kept per channel unless configured otherwise.
pub const DEFAULT_HISTORY: usize = 200;

/// Sampling interval assumed until the producer announces one.
pub const DEFAULT_INTERVAL_SECS: f64 = 0.5;

/// Single-threaded window state. Seven channel series and the timestamp
/// series always have the same length.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    timestamps: ChannelSeries,
    channels: [ChannelSeries; Channel::COUNT],
    interval_secs: f64,
    last_stamp: Option<f64>,
}

impl RollingWindow {
    pub fn new(history: usize, interval_secs: f64) -> Self {
        Self {
            timestamps: ChannelSeries::with_capacity(history),
            channels: std::array::from_fn(|_| ChannelSeries::with_capacity(history)),
            interval_secs: clamp_interval(interval_secs),
            last_stamp: None,
        }
    }

    pub fn history(&self) -> usize {
        self.timestamps.capacity()
    }

    pub fn interval(&self) -> f64 {
        self.interval_secs
    }

    /// Logical time of the latest sample; 0.0 before the first one.
    pub fn elapsed(&self) -> f64 {
        self.last_stamp.unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Existing timestamps are left as they are.
    pub fn set_interval(&mut self, seconds: f64) {
        self.interval_secs = clamp_interval(seconds);
    }

    /// Stamp, merge and push one row. Returns what was stored.
    pub fn append_sample(&mut self, sample: &MetricSample) -> (f64, ChannelValues) {
        let stamp = match self.last_stamp {
            Some(prev) => prev + self.interval_secs,
            None => 0.0,
        };
        self.last_stamp = Some(stamp);

        let values = merge_with_last(sample, |ch| self.channels[ch.index()].last());
        self.timestamps.push(stamp);
        for (series, value) in self.channels.iter_mut().zip(values.to_array()) {
            series.push(value);
        }
        self.debug_check_lengths();
        (stamp, values)
    }

    /// Empty every series and rewind the clock. The interval is kept.
    pub fn reset(&mut self) {
        self.timestamps.clear();
        for series in &mut self.channels {
            series.clear();
        }
        self.last_stamp = None;
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.debug_check_lengths();
        let series = |ch: Channel| self.channels[ch.index()].to_vec();
        WindowSnapshot {
            timestamps: self.timestamps.to_vec(),
            cpu: series(Channel::Cpu),
            cpu0: series(Channel::Cpu0),
            cpu1: series(Channel::Cpu1),
            ram: series(Channel::Ram),
            freq0: series(Channel::Freq0),
            freq1: series(Channel::Freq1),
            temp: series(Channel::Temp),
            interval_secs: self.interval_secs,
            elapsed_secs: self.elapsed(),
        }
    }

    fn debug_check_lengths(&self) {
        debug_assert!(
            self.channels
                .iter()
                .all(|s| s.len() == self.timestamps.len()),
            "channel series out of step with timestamps"
        );
    }
}

/// Shared, lock-protected [`RollingWindow`]. Every operation holds the lock
/// exactly once, so readers never observe a half-appended row.
#[derive(Debug)]
pub struct Aggregator {
    window: Mutex<RollingWindow>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY, DEFAULT_INTERVAL_SECS)
    }
}

impl Aggregator {
    pub fn new(history: usize, interval_secs: f64) -> Self {
        Self {
            window: Mutex::new(RollingWindow::new(history, interval_secs)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RollingWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_interval(&self, seconds: f64) {
        self.lock().set_interval(seconds);
    }

    pub fn append_sample(&self, sample: &MetricSample) -> (f64, ChannelValues) {
        self.lock().append_sample(sample)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.lock().snapshot()
    }

    pub fn interval(&self) -> f64 {
        self.lock().interval()
    }

    pub fn history(&self) -> usize {
        self.lock().history()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
