// Domain models: channels, samples, events, window views

mod channel;
mod event;
mod window;

pub use channel::{Channel, ChannelValues, MetricSample};
pub use event::{DecodedLine, TelemetryEvent};
pub use window::{AxisRange, DisplayRanges, WindowSnapshot, WindowView};
