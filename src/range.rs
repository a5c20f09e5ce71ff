// Display ranges derived from the rolling window

use crate::models::{AxisRange, Channel, DisplayRanges, WindowSnapshot};

/// Fixed range for percentage axes (CPU, RAM).
pub const PERCENT_RANGE: AxisRange = AxisRange {
    min: 0.0,
    max: 110.0,
};

/// Time span shown when there is nothing to span.
pub const DEFAULT_TIME_SPAN: f64 = 1.0;

fn min_max<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Padded range for a single channel (e.g. temperature).
/// Empty -> `None`; constant series -> `[v - 1, v + 1]`.
pub fn value_range(series: &[f64]) -> Option<AxisRange> {
    let (lo, hi) = min_max(series)?;
    if lo == hi {
        return Some(AxisRange::new(lo - 1.0, hi + 1.0));
    }
    let pad = (0.05 * (hi - lo).max(1.0)).max(0.5);
    Some(AxisRange::new(lo - pad, hi + pad))
}

/// Shared range for two jointly scaled, non-negative channels (e.g. the
/// two core frequencies). Both series must have data. Lower bound never
/// drops below zero.
pub fn joint_range(a: &[f64], b: &[f64]) -> Option<AxisRange> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (lo, hi) = min_max(a.iter().chain(b))?;
    if lo == hi {
        return Some(AxisRange::new((lo - 20.0).max(0.0), hi + 20.0));
    }
    let pad = (0.05 * (hi - lo).max(1.0)).max(10.0);
    Some(AxisRange::new((lo - pad).max(0.0), hi + pad))
}

/// Visible time span: the last `history - 1` intervals before the newest
/// stamp, floored at zero. Falls back to `[.., 1.0]` while the newest
/// stamp is still zero.
pub fn time_window(timestamps: &[f64], interval_secs: f64, history: usize) -> AxisRange {
    let Some(&latest) = timestamps.last() else {
        return AxisRange::new(0.0, DEFAULT_TIME_SPAN);
    };
    let back = history.saturating_sub(1) as f64 * interval_secs;
    let min = (latest - back).max(0.0);
    let max = if latest > 0.0 { latest } else { DEFAULT_TIME_SPAN };
    AxisRange::new(min, max)
}

/// Every axis range for one snapshot.
pub fn display_ranges(snapshot: &WindowSnapshot, history: usize) -> DisplayRanges {
    DisplayRanges {
        time: time_window(&snapshot.timestamps, snapshot.interval_secs, history),
        cpu: PERCENT_RANGE,
        ram: PERCENT_RANGE,
        temp: value_range(snapshot.series(Channel::Temp)),
        freq: joint_range(
            snapshot.series(Channel::Freq0),
            snapshot.series(Channel::Freq1),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_range() {
        assert_eq!(value_range(&[]), None);
        assert_eq!(joint_range(&[], &[1.0]), None);
    }

    #[test]
    fn constant_series_gets_unit_margin() {
        assert_eq!(value_range(&[42.0, 42.0]), Some(AxisRange::new(41.0, 43.0)));
    }

    #[test]
    fn small_spread_uses_minimum_pad() {
        assert_eq!(value_range(&[30.0, 32.0]), Some(AxisRange::new(29.5, 32.5)));
    }

    #[test]
    fn large_spread_pads_five_percent() {
        assert_eq!(value_range(&[0.0, 100.0]), Some(AxisRange::new(-5.0, 105.0)));
    }

    #[test]
    fn joint_range_is_never_negative() {
        assert_eq!(joint_range(&[5.0], &[5.0]), Some(AxisRange::new(0.0, 25.0)));
        assert_eq!(joint_range(&[5.0], &[50.0]), Some(AxisRange::new(0.0, 60.0)));
        assert_eq!(
            joint_range(&[1000.0, 1500.0], &[3000.0]),
            Some(AxisRange::new(900.0, 3100.0))
        );
    }

    #[test]
    fn time_window_defaults_and_floors() {
        assert_eq!(time_window(&[], 0.5, 200), AxisRange::new(0.0, 1.0));
        assert_eq!(time_window(&[0.0], 0.5, 200), AxisRange::new(0.0, 1.0));
        assert_eq!(time_window(&[0.0, 0.5], 0.5, 200), AxisRange::new(0.0, 0.5));
        assert_eq!(time_window(&[150.0], 0.5, 200), AxisRange::new(50.5, 150.0));
    }
}
