//! Pong: liveness-check harness for a Nomad batch workload
//!
//! The pong service registers a one-shot ping job with Nomad, then serves
//! `POST /ping` until SIGTERM/SIGINT. The ping client probes that endpoint once.

pub mod config;
pub mod nomad;
pub mod probe;
pub mod server;
