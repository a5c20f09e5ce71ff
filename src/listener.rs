// Telemetry listener: accepts one producer connection at a time and feeds
// its lines through the pipeline. Any failure restarts the accept cycle;
// only process shutdown ends the loop.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::config::ListenerConfig;
use crate::framer::LineReader;
use crate::pipeline::Pipeline;

/// Where the accept cycle currently is. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Listening { local_addr: SocketAddr },
    Connected { peer: SocketAddr },
    Closing,
}

/// Anything that ends one accept cycle. Logged, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable address for {0}")]
    NoAddress(String),
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("accept: {0}")]
    Accept(#[source] std::io::Error),
    #[error("read from {peer}: {source}")]
    Read {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

pub struct TelemetryListener {
    config: ListenerConfig,
    pipeline: Pipeline,
    state_tx: watch::Sender<ListenerState>,
}

impl TelemetryListener {
    pub fn new(config: ListenerConfig, pipeline: Pipeline) -> Self {
        let (state_tx, _) = watch::channel(ListenerState::Idle);
        Self {
            config,
            pipeline,
            state_tx,
        }
    }

    /// Follow state transitions (tests use this to learn the bound port).
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: ListenerState) {
        self.state_tx.send_replace(state);
    }

    /// Run accept cycles until `shutdown` fires.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                result = self.serve_once() => {
                    if let Err(e) = result {
                        info!(error = %e, "telemetry listener failed; restarting");
                    }
                    // Restart is immediate; yielding keeps a failing bind from hogging the worker.
                    tokio::task::yield_now().await;
                }
                _ = &mut shutdown => {
                    debug!("Telemetry listener shutting down");
                    break;
                }
            }
        }
        self.set_state(ListenerState::Idle);
    }

    /// One full cycle: bind, accept a single client, stream until it goes away.
    pub async fn serve_once(&self) -> Result<(), TransportError> {
        self.set_state(ListenerState::Idle);
        let addr = resolve(&self.config.host, self.config.port).await?;
        let listener = bind(addr)?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;
        info!(%local_addr, "Listening for telemetry");
        self.set_state(ListenerState::Listening { local_addr });

        let (stream, peer) = listener.accept().await.map_err(TransportError::Accept)?;
        info!(%peer, "Client connected");
        self.set_state(ListenerState::Connected { peer });

        let mut lines = LineReader::new(stream, self.config.read_chunk_size);
        let result = loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    self.pipeline.ingest_line(&line);
                }
                Ok(None) => {
                    info!(%peer, "Client disconnected");
                    break Ok(());
                }
                Err(source) => break Err(TransportError::Read { peer, source }),
            }
        };
        self.set_state(ListenerState::Closing);
        result
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            addr: format!("{}:{}", host, port),
            source,
        })?;
    addrs
        .next()
        .ok_or_else(|| TransportError::NoAddress(format!("{}:{}", host, port)))
}

/// Bind with SO_REUSEADDR and a backlog of one.
fn bind(addr: SocketAddr) -> Result<TcpListener, TransportError> {
    let wrap = |source| TransportError::Bind { addr, source };
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(wrap)?;
    socket.set_reuseaddr(true).map_err(wrap)?;
    socket.bind(addr).map_err(wrap)?;
    socket.listen(1).map_err(wrap)
}

/// Spawn the listener loop. The returned sender stops it at process shutdown.
pub fn spawn(
    listener: TelemetryListener,
) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(listener.run(shutdown_rx));
    (shutdown_tx, handle)
}
