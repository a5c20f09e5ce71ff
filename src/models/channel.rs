// Telemetry channels and the per-line sample they are decoded into

use serde::{Deserialize, Serialize};

/// One of the seven fixed telemetry channels carried by a data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Cpu,
    Cpu0,
    Cpu1,
    Ram,
    Freq0,
    Freq1,
    Temp,
}

impl Channel {
    pub const COUNT: usize = 7;

    /// Every channel in wire order (the order the grammar captures them).
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Cpu,
        Channel::Cpu0,
        Channel::Cpu1,
        Channel::Ram,
        Channel::Freq0,
        Channel::Freq1,
        Channel::Temp,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Cpu => "CPU",
            Channel::Cpu0 => "CPU0",
            Channel::Cpu1 => "CPU1",
            Channel::Ram => "RAM",
            Channel::Freq0 => "FREQ0",
            Channel::Freq1 => "FREQ1",
            Channel::Temp => "TEMP",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded metric values keyed by channel. A channel may be absent; the
/// aggregator's merge policy fills the gap from history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSample {
    values: [Option<f64>; Channel::COUNT],
}

impl MetricSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample carrying all seven channels, in `Channel::ALL` order.
    pub fn complete(values: [f64; Channel::COUNT]) -> Self {
        Self {
            values: values.map(Some),
        }
    }

    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.set(channel, value);
        self
    }

    pub fn set(&mut self, channel: Channel, value: f64) {
        self.values[channel.index()] = Some(value);
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

/// Fully-resolved values for one appended row; every channel present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelValues {
    pub cpu: f64,
    pub cpu0: f64,
    pub cpu1: f64,
    pub ram: f64,
    pub freq0: f64,
    pub freq1: f64,
    pub temp: f64,
}

impl ChannelValues {
    pub fn from_array(v: [f64; Channel::COUNT]) -> Self {
        Self {
            cpu: v[0],
            cpu0: v[1],
            cpu1: v[2],
            ram: v[3],
            freq0: v[4],
            freq1: v[5],
            temp: v[6],
        }
    }

    pub fn to_array(self) -> [f64; Channel::COUNT] {
        [
            self.cpu, self.cpu0, self.cpu1, self.ram, self.freq0, self.freq1, self.temp,
        ]
    }

    pub fn get(&self, channel: Channel) -> f64 {
        self.to_array()[channel.index()]
    }
}
