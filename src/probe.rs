//! One-shot ping probe
//!
//! Sends a single `POST http://<target>/ping` and returns the response body.
//! No retries; the transport's default timeouts apply.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("error sending POST request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server responded with status code: {}", .0.as_u16())]
    Status(StatusCode),

    #[error("error reading server response: {0}")]
    Body(#[source] reqwest::Error),
}

/// URL of the ping endpoint on `target` (`host:port`)
pub fn ping_url(target: &str) -> String {
    format!("http://{}/ping", target)
}

/// Ping `target` once and return the decoded body
pub async fn probe(client: &reqwest::Client, target: &str) -> Result<String, ProbeError> {
    let url = ping_url(target);

    let response = client
        .post(&url)
        .send()
        .await
        .map_err(|source| ProbeError::Transport {
            url: url.clone(),
            source,
        })?;

    if response.status() != StatusCode::OK {
        return Err(ProbeError::Status(response.status()));
    }

    response.text().await.map_err(ProbeError::Body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{HttpServer, Server};
    use std::sync::Arc;

    #[test]
    fn test_ping_url() {
        assert_eq!(ping_url("127.0.0.1:8080"), "http://127.0.0.1:8080/ping");
        assert_eq!(ping_url("pong"), "http://pong/ping");
    }

    #[tokio::test]
    async fn test_probe_receives_pong() {
        let server = Arc::new(
            HttpServer::bind("127.0.0.1:0".parse().expect("addr"))
                .await
                .expect("bind"),
        );
        let serving = Arc::clone(&server);
        let handle = tokio::spawn(async move { serving.serve().await });

        let body = probe(&reqwest::Client::new(), &server.local_addr().to_string())
            .await
            .expect("probe succeeds");
        assert_eq!(body, "pong");

        server.shutdown().await.expect("shutdown");
        handle.await.expect("join").expect("clean close");
    }

    #[tokio::test]
    async fn test_probe_rejects_non_200() {
        let app = axum::Router::new().route(
            "/ping",
            axum::routing::post(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let err = probe(&reqwest::Client::new(), &addr.to_string())
            .await
            .expect_err("503 is a failure");
        assert!(matches!(err, ProbeError::Status(status) if status == StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.to_string(), "server responded with status code: 503");
    }

    #[tokio::test]
    async fn test_probe_refused_connection_is_transport_error() {
        let unused = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = unused.local_addr().expect("addr");
        drop(unused);

        let err = probe(&reqwest::Client::new(), &addr.to_string())
            .await
            .expect_err("nothing is listening");

        match err {
            ProbeError::Transport { url, .. } => assert_eq!(url, ping_url(&addr.to_string())),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
