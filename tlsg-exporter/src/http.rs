//! HTTP server for the Prometheus metrics endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::collector::{MetricSink, SharedCollector};
use crate::encoder::{CONTENT_TYPE, TextEncoder};
use crate::mapping::MetricFamily;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    collector: SharedCollector,
}

/// Encodes each batch and forwards it to the response body.
struct ChannelSink {
    encoder: TextEncoder,
    tx: mpsc::UnboundedSender<String>,
}

impl MetricSink for ChannelSink {
    fn emit(&mut self, families: Vec<MetricFamily>) {
        let chunk = self.encoder.encode(&families);
        if chunk.is_empty() {
            return;
        }
        // The receiver is gone when the client disconnected mid-cycle.
        if self.tx.send(chunk).is_err() {
            debug!("Metrics client went away, dropping batch");
        }
    }
}

/// Create the HTTP router.
pub fn create_router(collector: SharedCollector, metrics_path: &str) -> Router {
    let state = AppState { collector };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint.
///
/// Runs one scrape cycle per request. Every switch's metrics are written to
/// the body as soon as that switch is done.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let (tx, rx) = mpsc::unbounded_channel();
    let collector = state.collector.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink {
            encoder: TextEncoder::new(),
            tx,
        };
        collector.scrape(&mut sink).await;
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    collector: SharedCollector,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(collector: SharedCollector, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            collector,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the listen address.
    pub async fn bind(&self) -> anyhow::Result<tokio::net::TcpListener> {
        tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.collector, &self.metrics_path);
        let addr = listener.local_addr().unwrap_or(self.listen_addr);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
