// Point-in-time views of the rolling window and its display ranges

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelValues};

/// Consistent copy of the rolling window taken under the aggregator lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub timestamps: Vec<f64>,
    pub cpu: Vec<f64>,
    pub cpu0: Vec<f64>,
    pub cpu1: Vec<f64>,
    pub ram: Vec<f64>,
    pub freq0: Vec<f64>,
    pub freq1: Vec<f64>,
    pub temp: Vec<f64>,
    pub interval_secs: f64,
    pub elapsed_secs: f64,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn series(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Cpu => &self.cpu,
            Channel::Cpu0 => &self.cpu0,
            Channel::Cpu1 => &self.cpu1,
            Channel::Ram => &self.ram,
            Channel::Freq0 => &self.freq0,
            Channel::Freq1 => &self.freq1,
            Channel::Temp => &self.temp,
        }
    }

    /// Most recent row, if any.
    pub fn latest(&self) -> Option<(f64, ChannelValues)> {
        let t = *self.timestamps.last()?;
        let mut row = [0.0; Channel::COUNT];
        for ch in Channel::ALL {
            row[ch.index()] = *self.series(ch).last()?;
        }
        Some((t, ChannelValues::from_array(row)))
    }
}

/// Closed display interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Ranges for every plotted axis; `None` where the window has no data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRanges {
    pub time: AxisRange,
    pub cpu: AxisRange,
    pub ram: AxisRange,
    pub temp: Option<AxisRange>,
    pub freq: Option<AxisRange>,
}

/// Body of GET /api/window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub snapshot: WindowSnapshot,
    pub ranges: DisplayRanges,
}
