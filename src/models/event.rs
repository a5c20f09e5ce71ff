// Decoder output and consumer-facing events

use serde::{Deserialize, Serialize};

use super::{ChannelValues, MetricSample};

/// Result of decoding one framed line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    Sample(MetricSample),
    /// Seconds per sample, already clamped to the minimum interval.
    Interval(f64),
    Unrecognized,
}

/// Events published to consumers (view refresher, WebSocket clients).
/// Serializes as `{"type": "sampleAppended", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TelemetryEvent {
    #[serde(rename_all = "camelCase")]
    SampleAppended {
        timestamp: f64,
        values: ChannelValues,
    },
    #[serde(rename_all = "camelCase")]
    IntervalChanged { seconds: f64 },
    BufferReset,
}
