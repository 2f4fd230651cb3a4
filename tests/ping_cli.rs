//! Tests for the `ping` binary

use pong::server::{HttpServer, Server};
use std::sync::Arc;
use tokio::process::Command;

fn ping_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ping"));
    cmd.env("RUST_LOG", "info").env("NO_COLOR", "1");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[tokio::test]
async fn test_missing_argument_exits_non_zero() {
    let output = ping_bin().output().await.expect("run ping");

    assert!(!output.status.success());
    assert!(combined_output(&output).contains("Target address is not provided"));
}

#[tokio::test]
async fn test_refused_connection_exits_non_zero() {
    let unused = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = unused.local_addr().expect("addr");
    drop(unused);

    let output = ping_bin()
        .arg(addr.to_string())
        .output()
        .await
        .expect("run ping");

    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("error sending POST request"),
        "transport error reported: {}",
        text
    );
}

#[tokio::test]
async fn test_successful_probe_prints_pong() {
    let server = Arc::new(
        HttpServer::bind("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("bind"),
    );
    let serving = Arc::clone(&server);
    let handle = tokio::spawn(async move { serving.serve().await });

    let output = ping_bin()
        .arg(server.local_addr().to_string())
        .output()
        .await
        .expect("run ping");

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Message from server: pong"));

    server.shutdown().await.expect("shutdown");
    handle.await.expect("join").expect("clean close");
}
