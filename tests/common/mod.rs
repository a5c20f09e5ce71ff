// Shared test helpers
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use telemon::aggregator::Aggregator;
use telemon::listener::ListenerState;
use telemon::models::TelemetryEvent;
use telemon::pipeline::Pipeline;
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, timeout};

pub const WAIT: Duration = Duration::from_secs(3);

/// A data line in the producer's wire format.
pub fn data_line(
    cpu: f64,
    cpu0: f64,
    cpu1: f64,
    ram: f64,
    freq0: u32,
    freq1: u32,
    temp: f64,
) -> String {
    format!(
        "CPU:{:.1}%, CPU0:{:.1}%, CPU1:{:.1}%, RAM:{:.1}%, FREQ0:{}MHz, FREQ1:{}MHz, Temp:{:.1}°C",
        cpu, cpu0, cpu1, ram, freq0, freq1, temp
    )
}

pub fn test_pipeline(history: usize) -> Pipeline {
    Pipeline::with_capacity(Arc::new(Aggregator::new(history, 0.5)), 64)
}

pub async fn next_event(rx: &mut broadcast::Receiver<TelemetryEvent>) -> TelemetryEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

/// Wait for the next state matching `pick`, starting from the current one.
pub async fn wait_for_state<T>(
    rx: &mut watch::Receiver<ListenerState>,
    mut pick: impl FnMut(ListenerState) -> Option<T>,
) -> T {
    timeout(WAIT, async {
        loop {
            let state = *rx.borrow_and_update();
            if let Some(found) = pick(state) {
                return found;
            }
            rx.changed().await.expect("listener state channel closed");
        }
    })
    .await
    .expect("timed out waiting for listener state")
}

pub async fn wait_listening(rx: &mut watch::Receiver<ListenerState>) -> SocketAddr {
    wait_for_state(rx, |s| match s {
        ListenerState::Listening { local_addr } => Some(local_addr),
        _ => None,
    })
    .await
}

pub async fn wait_connected(rx: &mut watch::Receiver<ListenerState>) -> SocketAddr {
    wait_for_state(rx, |s| match s {
        ListenerState::Connected { peer } => Some(peer),
        _ => None,
    })
    .await
}
