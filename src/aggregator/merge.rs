// Last-value merge policy for incoming samples

use crate::models::{Channel, ChannelValues, MetricSample};

/// Resolve every channel: incoming value, else last stored value, else 0.0.
pub fn merge_with_last(
    sample: &MetricSample,
    last: impl Fn(Channel) -> Option<f64>,
) -> ChannelValues {
    let mut row = [0.0; Channel::COUNT];
    for ch in Channel::ALL {
        row[ch.index()] = sample.get(ch).or_else(|| last(ch)).unwrap_or(0.0);
    }
    ChannelValues::from_array(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_value_wins() {
        let s = MetricSample::new().with(Channel::Ram, 41.0);
        let v = merge_with_last(&s, |_| Some(7.0));
        assert_eq!(v.ram, 41.0);
        assert_eq!(v.cpu, 7.0);
    }

    #[test]
    fn no_history_falls_back_to_zero() {
        let s = MetricSample::new().with(Channel::Temp, 35.0);
        let v = merge_with_last(&s, |_| None);
        assert_eq!(v.temp, 35.0);
        assert_eq!(v.freq0, 0.0);
        assert_eq!(v.cpu1, 0.0);
    }
}
