// View refresher: the periodic, read-only consumer of the rolling window.
// Cadence follows the producer's sample interval (floored), and is rebuilt
// whenever an IntervalChanged event arrives.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::instrument;

use crate::models::{TelemetryEvent, WindowView};
use crate::pipeline::Pipeline;
use crate::range::display_ranges;

/// Refresh period for a given sample interval: one tick per sample, but
/// never faster than `min_refresh_ms`.
pub fn refresh_period(interval_secs: f64, min_refresh_ms: u64) -> Duration {
    let ms = (interval_secs * 1000.0) as u64;
    Duration::from_millis(ms.max(min_refresh_ms))
}

fn ticker(period: Duration) -> Interval {
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tick
}

pub struct RefresherDeps {
    pub pipeline: Pipeline,
    /// Latest rendered view; `None` while the window is empty.
    pub views: watch::Sender<Option<Arc<WindowView>>>,
    /// Live `/ws/events` clients, shared with the HTTP routes.
    pub ws_event_connections: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct RefresherConfig {
    pub history: usize,
    pub min_refresh_ms: u64,
    /// How often to log pipeline counters (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Build the current view, or `None` for an empty window.
pub fn build_view(pipeline: &Pipeline, history: usize) -> Option<WindowView> {
    let snapshot = pipeline.snapshot();
    if snapshot.is_empty() {
        return None;
    }
    let ranges = display_ranges(&snapshot, history);
    Some(WindowView { snapshot, ranges })
}

pub fn spawn(deps: RefresherDeps, config: RefresherConfig) -> tokio::task::JoinHandle<()> {
    // Subscribe before spawning so no event published after this call is missed.
    let events = deps.pipeline.subscribe();
    tokio::spawn(run(deps, events, config))
}

#[instrument(skip_all, fields(history = config.history))]
async fn run(
    deps: RefresherDeps,
    mut events: broadcast::Receiver<TelemetryEvent>,
    config: RefresherConfig,
) {
    let RefresherDeps {
        pipeline,
        views,
        ws_event_connections,
        mut shutdown_rx,
    } = deps;
    let RefresherConfig {
        history,
        min_refresh_ms,
        stats_log_interval_secs,
    } = config;

    let mut period = refresh_period(pipeline.aggregator().interval(), min_refresh_ms);
    let mut tick = ticker(period);
    let mut stats_log_tick = ticker(Duration::from_secs(stats_log_interval_secs));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let Some(view) = build_view(&pipeline, history) else {
                    continue;
                };
                if let Some((t, latest)) = view.snapshot.latest() {
                    tracing::debug!(
                        t,
                        samples = view.snapshot.len(),
                        cpu = latest.cpu,
                        ram = latest.ram,
                        temp = latest.temp,
                        freq0 = latest.freq0,
                        freq1 = latest.freq1,
                        "window refreshed"
                    );
                }
                views.send_replace(Some(Arc::new(view)));
            }
            result = events.recv() => {
                match result {
                    Ok(TelemetryEvent::IntervalChanged { seconds }) => {
                        let next = refresh_period(seconds, min_refresh_ms);
                        if next != period {
                            period = next;
                            tick = ticker(period);
                            tracing::debug!(
                                refresh_ms = period.as_millis() as u64,
                                "refresh cadence rescheduled"
                            );
                        }
                    }
                    Ok(TelemetryEvent::BufferReset) => {
                        views.send_replace(None);
                    }
                    Ok(TelemetryEvent::SampleAppended { .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "refresher lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Event bus closed");
                        break;
                    }
                }
            }
            _ = stats_log_tick.tick() => {
                let stats = pipeline.stats();
                tracing::info!(
                    samples_appended = stats.samples_appended,
                    interval_updates = stats.interval_updates,
                    lines_ignored = stats.lines_ignored,
                    resets = stats.resets,
                    window_len = pipeline.aggregator().len(),
                    ws_event_clients = ws_event_connections.load(Ordering::Relaxed),
                    "app stats"
                );
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Refresher shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_follows_interval_with_floor() {
        assert_eq!(refresh_period(0.5, 50), Duration::from_millis(500));
        assert_eq!(refresh_period(0.001, 50), Duration::from_millis(50));
        assert_eq!(refresh_period(0.25, 50), Duration::from_millis(250));
    }
}
