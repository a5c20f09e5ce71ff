// Rolling window tests: capacity, eviction, clock, merge policy, reset

use std::sync::Arc;

use telemon::aggregator::{Aggregator, RollingWindow};
use telemon::models::{Channel, MetricSample};

fn sample(v: f64) -> MetricSample {
    MetricSample::complete([v, v + 1.0, v + 2.0, v + 3.0, v + 4.0, v + 5.0, v + 6.0])
}

fn assert_lengths(w: &RollingWindow, expected: usize) {
    let snap = w.snapshot();
    assert_eq!(snap.timestamps.len(), expected);
    for ch in Channel::ALL {
        assert_eq!(snap.series(ch).len(), expected, "channel {}", ch);
    }
}

#[test]
fn length_is_min_of_appends_and_history() {
    for n in [0usize, 1, 5, 9, 10, 11, 25] {
        let mut w = RollingWindow::new(10, 0.5);
        for i in 0..n {
            w.append_sample(&sample(i as f64));
        }
        assert_lengths(&w, n.min(10));
    }
}

#[test]
fn oldest_entries_are_evicted_first() {
    let mut w = RollingWindow::new(200, 0.5);
    for i in 0..250 {
        w.append_sample(&sample(i as f64));
    }
    let snap = w.snapshot();
    let expected: Vec<f64> = (50..250).map(|i| i as f64).collect();
    assert_eq!(snap.cpu, expected);
    assert_eq!(snap.timestamps.first().copied(), Some(25.0));
    assert_eq!(snap.timestamps.last().copied(), Some(124.5));
}

#[test]
fn timestamp_step_equals_interval_at_append() {
    let mut w = RollingWindow::new(50, 0.5);
    let intervals = [0.5, 0.5, 0.25, 0.125, 1.0, 0.001];
    let mut stamps = Vec::new();
    for &dt in &intervals {
        w.set_interval(dt);
        stamps.push(w.append_sample(&sample(0.0)).0);
    }
    assert_eq!(stamps[0], 0.0);
    for i in 1..stamps.len() {
        let step = stamps[i] - stamps[i - 1];
        assert!((step - intervals[i]).abs() < 1e-12, "step {} at {}", step, i);
        assert!(stamps[i] > stamps[i - 1]);
    }
}

#[test]
fn set_interval_does_not_rewrite_history() {
    let mut w = RollingWindow::new(10, 0.5);
    w.append_sample(&sample(1.0));
    w.append_sample(&sample(2.0));
    w.set_interval(2.0);
    assert_eq!(w.snapshot().timestamps, vec![0.0, 0.5]);
    assert_eq!(w.interval(), 2.0);
}

#[test]
fn missing_channel_reuses_previous_value() {
    let mut w = RollingWindow::new(10, 0.5);
    w.append_sample(&sample(10.0));
    let (_, v) = w.append_sample(&MetricSample::new().with(Channel::Ram, 41.0));
    assert_eq!(v.ram, 41.0);
    assert_eq!(v.cpu, 10.0);
    assert_eq!(v.cpu0, 11.0);
    assert_eq!(v.temp, 16.0);
    assert_lengths(&w, 2);
}

#[test]
fn missing_channel_without_history_is_zero() {
    let mut w = RollingWindow::new(10, 0.5);
    let (_, v) = w.append_sample(&MetricSample::new());
    assert_eq!(v.to_array(), [0.0; Channel::COUNT]);
}

#[test]
fn reset_on_empty_window_is_a_no_op() {
    let mut w = RollingWindow::new(10, 0.5);
    w.reset();
    assert!(w.is_empty());
    assert_eq!(w.elapsed(), 0.0);
    w.reset();
    assert_lengths(&w, 0);
}

#[test]
fn reset_after_appends_clears_and_keeps_interval() {
    let mut w = RollingWindow::new(10, 0.5);
    w.set_interval(0.25);
    for i in 0..15 {
        w.append_sample(&sample(i as f64));
    }
    w.reset();
    assert_lengths(&w, 0);
    assert_eq!(w.elapsed(), 0.0);
    assert_eq!(w.interval(), 0.25);
    let snap = w.snapshot();
    assert_eq!(snap.interval_secs, 0.25);
    assert_eq!(snap.elapsed_secs, 0.0);
}

#[test]
fn snapshot_latest_matches_last_append() {
    let mut w = RollingWindow::new(10, 0.5);
    w.append_sample(&sample(1.0));
    let (t, v) = w.append_sample(&sample(2.0));
    assert_eq!(w.snapshot().latest(), Some((t, v)));
}

#[test]
fn concurrent_readers_see_consistent_rows() {
    let agg = Arc::new(Aggregator::new(64, 0.01));
    let writer = {
        let agg = agg.clone();
        std::thread::spawn(move || {
            for i in 0..2000 {
                agg.append_sample(&sample(i as f64));
                if i % 500 == 0 {
                    agg.reset();
                }
            }
        })
    };
    for _ in 0..500 {
        let snap = agg.snapshot();
        for ch in Channel::ALL {
            assert_eq!(snap.series(ch).len(), snap.len());
        }
        // Every row was appended as one unit: CPU0 is always CPU + 1.
        for (cpu, cpu0) in snap.cpu.iter().zip(&snap.cpu0) {
            assert_eq!(*cpu0, cpu + 1.0);
        }
    }
    writer.join().unwrap();
    assert_eq!(agg.len(), 64);
}
