// Line grammar: one framed telemetry line -> one decoded event. Pure, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Channel, DecodedLine, MetricSample};

/// Prefix of the control line that announces the producer's sampling period.
pub const INTERVAL_PREFIX: &str = "INTERVAL_US:";

/// Floor applied to every sampling interval, in seconds.
pub const MIN_INTERVAL_SECS: f64 = 0.001;

// Unanchored: producers append free text (e.g. "(used/total MB)") between RAM and FREQ0.
static DATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"CPU:(\d+\.?\d*)%, CPU0:(\d+\.?\d*)%, CPU1:(\d+\.?\d*)%, RAM:(\d+\.?\d*)%.*?FREQ0:(\d+)\w+, FREQ1:(\d+)\w+, Temp:(\d+\.?\d*)°C",
    )
    .expect("data line regex")
});

/// Decode a trimmed, non-empty line.
pub fn decode_line(line: &str) -> DecodedLine {
    if let Some(rest) = line.strip_prefix(INTERVAL_PREFIX) {
        return match parse_interval_us(rest) {
            Some(secs) => DecodedLine::Interval(secs),
            None => DecodedLine::Unrecognized,
        };
    }
    match parse_metrics(line) {
        Some(sample) => DecodedLine::Sample(sample),
        None => DecodedLine::Unrecognized,
    }
}

/// Microsecond count after the control prefix -> clamped seconds.
fn parse_interval_us(raw: &str) -> Option<f64> {
    let us: i64 = raw.trim().parse().ok()?;
    Some(clamp_interval(us as f64 / 1_000_000.0))
}

pub fn clamp_interval(secs: f64) -> f64 {
    if secs.is_nan() {
        return MIN_INTERVAL_SECS;
    }
    secs.max(MIN_INTERVAL_SECS)
}

/// All seven groups or nothing; partial matches are never merged.
fn parse_metrics(line: &str) -> Option<MetricSample> {
    let caps = DATA_LINE.captures(line)?;
    let mut sample = MetricSample::new();
    for (i, channel) in Channel::ALL.into_iter().enumerate() {
        let value: f64 = caps.get(i + 1)?.as_str().parse().ok()?;
        sample.set(channel, value);
    }
    Some(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "CPU:10.0%, CPU0:5.0%, CPU1:15.0%, RAM:40.0%, FREQ0:1000MHz, FREQ1:2000MHz, Temp:35.0°C";

    #[test]
    fn decodes_all_seven_fields() {
        let DecodedLine::Sample(s) = decode_line(LINE) else {
            panic!("expected sample");
        };
        assert!(s.is_complete());
        assert_eq!(s.get(Channel::Cpu), Some(10.0));
        assert_eq!(s.get(Channel::Cpu0), Some(5.0));
        assert_eq!(s.get(Channel::Cpu1), Some(15.0));
        assert_eq!(s.get(Channel::Ram), Some(40.0));
        assert_eq!(s.get(Channel::Freq0), Some(1000.0));
        assert_eq!(s.get(Channel::Freq1), Some(2000.0));
        assert_eq!(s.get(Channel::Temp), Some(35.0));
    }

    #[test]
    fn tolerates_surrounding_text() {
        let line = "Sent: CPU:1.25%, CPU0:0%, CPU1:2.5%, RAM:33.10% (170/487 MB), FREQ0:667MHz, FREQ1:667MHz, Temp:48.73°C trailing";
        let DecodedLine::Sample(s) = decode_line(line) else {
            panic!("expected sample");
        };
        assert_eq!(s.get(Channel::Cpu0), Some(0.0));
        assert_eq!(s.get(Channel::Ram), Some(33.10));
        assert_eq!(s.get(Channel::Temp), Some(48.73));
    }

    #[test]
    fn missing_field_is_unrecognized() {
        let line = LINE.replace("CPU1:15.0%, ", "");
        assert_eq!(decode_line(&line), DecodedLine::Unrecognized);
        let line = LINE.replace(", Temp:35.0°C", "");
        assert_eq!(decode_line(&line), DecodedLine::Unrecognized);
    }

    #[test]
    fn unitless_frequency_gives_its_last_digit_to_the_unit() {
        // `(\d+)\w+` backtracks: the final digit is consumed as the unit.
        let line = LINE.replace("FREQ0:1000MHz", "FREQ0:1000");
        let DecodedLine::Sample(s) = decode_line(&line) else {
            panic!("expected sample");
        };
        assert_eq!(s.get(Channel::Freq0), Some(100.0));
        assert_eq!(s.get(Channel::Freq1), Some(2000.0));

        let line = LINE.replace("FREQ0:1000MHz", "FREQ0:5");
        assert_eq!(decode_line(&line), DecodedLine::Unrecognized);
    }

    #[test]
    fn interval_is_converted_and_clamped() {
        assert_eq!(decode_line("INTERVAL_US:500000"), DecodedLine::Interval(0.5));
        assert_eq!(decode_line("INTERVAL_US:0"), DecodedLine::Interval(0.001));
        assert_eq!(decode_line("INTERVAL_US:-5"), DecodedLine::Interval(0.001));
        assert_eq!(decode_line("INTERVAL_US: 250000"), DecodedLine::Interval(0.25));
    }

    #[test]
    fn malformed_interval_is_unrecognized() {
        assert_eq!(decode_line("INTERVAL_US:abc"), DecodedLine::Unrecognized);
        assert_eq!(decode_line("INTERVAL_US:"), DecodedLine::Unrecognized);
        assert_eq!(decode_line("INTERVAL_US:1.5"), DecodedLine::Unrecognized);
    }

    #[test]
    fn free_text_is_unrecognized() {
        assert_eq!(decode_line("booting monitor v2"), DecodedLine::Unrecognized);
    }
}
