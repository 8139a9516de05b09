//! Static asset server: serves the static root read-only with a permissive CORS header.
//!
//! The server is owned by the composition root through a [`StaticServer`]
//! handle. Starting is guarded by a one-time initialisation: the first call
//! probes the port, binds if it is free, and waits until the socket actually
//! accepts connections. Later calls return the first outcome unchanged.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of a start attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// This handle bound the port and is serving on `addr`
    Started(SocketAddr),
    /// Something already answers on the port; nothing was started
    AlreadyRunning,
}

/// Router serving `static_root`, with `Access-Control-Allow-Origin: *` on every response
pub fn router(static_root: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(static_root.as_ref()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Lifecycle handle for the static asset server
pub struct StaticServer {
    host: String,
    port: u16,
    static_root: PathBuf,
    readiness_timeout: Duration,
    outcome: OnceCell<StartOutcome>,
    running: Mutex<Option<RunningServer>>,
}

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl StaticServer {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.static_port,
            static_root: config.static_root.clone(),
            readiness_timeout: config.readiness_timeout,
            outcome: OnceCell::new(),
            running: Mutex::new(None),
        }
    }

    /// Start the server at most once. Safe to call repeatedly.
    pub async fn start(&self) -> ServerResult<StartOutcome> {
        self.outcome
            .get_or_try_init(|| self.start_once())
            .await
            .copied()
    }

    /// Outcome of the first successful start, if any
    pub fn outcome(&self) -> Option<StartOutcome> {
        self.outcome.get().copied()
    }

    /// Address this handle is serving on, if it started the server itself
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.outcome()? {
            StartOutcome::Started(addr) => Some(addr),
            StartOutcome::AlreadyRunning => None,
        }
    }

    async fn start_once(&self) -> ServerResult<StartOutcome> {
        if port_in_use(&self.host, self.port).await {
            tracing::info!(
                "Port {} already in use, assuming static server is running",
                self.port
            );
            return Ok(StartOutcome::AlreadyRunning);
        }

        // Another instance may bind between the probe and here.
        let listener = match TcpListener::bind((self.host.as_str(), self.port)).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::info!("Port {} taken while starting, assuming static server is running", self.port);
                return Ok(StartOutcome::AlreadyRunning);
            }
            Err(source) => {
                return Err(ServerError::Bind {
                    addr: format!("{}:{}", self.host, self.port),
                    source,
                })
            }
        };
        let addr = listener.local_addr()?;

        let app = router(&self.static_root);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("Static server error: {}", e);
            }
        });
        *self.running.lock().await = Some(RunningServer {
            shutdown: shutdown_tx,
            task,
        });

        if let Err(e) = wait_until_ready(addr, self.readiness_timeout).await {
            // Leave nothing behind so a retry starts from a clean slate.
            if let Some(running) = self.running.lock().await.take() {
                running.stop().await;
            }
            return Err(e);
        }
        tracing::info!(
            "Serving {} with CORS at http://{}",
            self.static_root.display(),
            addr
        );
        Ok(StartOutcome::Started(addr))
    }

    /// Stop a server started by this handle and wait for it to finish.
    /// No-op when nothing was started.
    pub async fn shutdown(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.stop().await;
        tracing::info!("Static server stopped");
    }
}

impl RunningServer {
    async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!("Static server task failed: {}", e);
        }
    }
}

/// `true` if something on `host:port` accepts a TCP connection
pub async fn port_in_use(host: &str, port: u16) -> bool {
    if port == 0 {
        return false;
    }
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Poll until `addr` accepts a connection, or fail after `timeout`
pub async fn wait_until_ready(addr: SocketAddr, timeout: Duration) -> ServerResult<()> {
    let poll = async {
        loop {
            if TcpStream::connect(addr).await.is_ok() {
                return;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    };
    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| ServerError::NotReady { addr, timeout })
}
