//! Ping endpoint and the HTTP server that hosts it
//!
//! - `POST /ping` - Liveness: answers `pong` as plain text
//!
//! Every other path is 404, other methods on `/ping` are 405.

use super::shutdown::{ServeError, Server, ShutdownError};
use async_trait::async_trait;
use axum::{
    extract::ConnectInfo,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Ping handler
///
/// Does not read the request body.
async fn ping(ConnectInfo(remote): ConnectInfo<SocketAddr>) -> impl IntoResponse {
    info!(remote = %remote, "Received ping");
    (StatusCode::OK, [(CONTENT_TYPE, "text/plain")], "pong")
}

/// Build the router for the ping endpoint
pub fn build_router() -> Router {
    Router::new().route("/ping", post(ping))
}

/// HTTP server for the ping endpoint with a two-state lifecycle
///
/// `Running` until the first [`Server::shutdown`], then `ShuttingDown` for good.
pub struct HttpServer {
    addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    shutting_down: AtomicBool,
    stop: watch::Sender<bool>,
    drained: watch::Sender<bool>,
}

impl HttpServer {
    /// Server that binds `addr` when it starts serving
    ///
    /// A bind failure surfaces as [`ServeError::Bind`] from `serve`.
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_listener(addr, None)
    }

    /// Server bound up front, e.g. to an ephemeral port
    pub async fn bind(addr: SocketAddr) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;
        let addr = listener.local_addr()?;
        Ok(Self::with_listener(addr, Some(listener)))
    }

    fn with_listener(addr: SocketAddr, listener: Option<TcpListener>) -> Self {
        let (stop, _) = watch::channel(false);
        let (drained, _) = watch::channel(false);
        Self {
            addr,
            listener: Mutex::new(listener),
            shutting_down: AtomicBool::new(false),
            stop,
            drained,
        }
    }

    /// Address the server listens on (resolved port when pre-bound)
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check if shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn take_listener(&self) -> Option<TcpListener> {
        match self.listener.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    async fn accept_loop(&self) -> Result<(), ServeError> {
        let listener = match self.take_listener() {
            Some(listener) => listener,
            None => TcpListener::bind(self.addr)
                .await
                .map_err(|source| ServeError::Bind {
                    addr: self.addr,
                    source,
                })?,
        };

        info!(addr = %self.addr, "Starting server");

        let mut stop = self.stop.subscribe();
        axum::serve(
            listener,
            build_router().into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop.wait_for(|stopped| *stopped).await;
        })
        .await?;

        Ok(())
    }
}

#[async_trait]
impl Server for HttpServer {
    async fn serve(&self) -> Result<(), ServeError> {
        let result = self.accept_loop().await;
        // Published on every exit path so shutdown() never waits on a dead loop
        self.drained.send_replace(true);
        result
    }

    async fn shutdown(&self) -> Result<(), ShutdownError> {
        let mut drained = self.drained.subscribe();
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.stop.send_replace(true);
        }
        drained
            .wait_for(|done| *done)
            .await
            .map(|_| ())
            .map_err(|_| ShutdownError::Interrupted)
    }
}
