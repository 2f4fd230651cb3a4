//! Nomad job registration for the ping workload
//!
//! Registration is fire-and-forget: one validate call, one register call,
//! no retries and no monitoring afterwards.

mod client;
pub mod job;

pub use client::{NomadClient, DEFAULT_NOMAD_ADDRESS};
pub use job::Job;

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Delay before the first call, giving the Nomad agent time to come up
pub const NOMAD_STARTUP_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum NomadError {
    #[error("error from job validation: {0}")]
    Validation(String),

    #[error("error registering ping job to Nomad: {0}")]
    Register(String),
}

/// Nomad's answer to a job registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RegisterResponse {
    #[serde(rename = "EvalID")]
    pub eval_id: String,
    pub warnings: String,
}

/// Trait for submitting jobs to the orchestrator
///
/// Production code uses `NomadClient` which calls the Nomad HTTP API.
/// Tests use in-memory registrars that record calls.
#[async_trait]
pub trait JobRegistrar: Send + Sync {
    async fn validate(&self, job: &Job) -> Result<(), NomadError>;

    async fn register(&self, job: &Job) -> Result<RegisterResponse, NomadError>;
}

/// Wait `startup_delay`, then validate and register the ping job
///
/// Exactly one attempt; the first failure is returned as is.
pub async fn create_ping_job(
    registrar: &dyn JobRegistrar,
    target_addr: &str,
    startup_delay: Duration,
) -> Result<RegisterResponse, NomadError> {
    if !startup_delay.is_zero() {
        info!(delay = ?startup_delay, "Waiting for Nomad before registering ping job");
        tokio::time::sleep(startup_delay).await;
    }

    let job = Job::ping(target_addr);

    registrar.validate(&job).await?;
    info!(job = %job.id, "Ping job validated");

    let response = registrar.register(&job).await?;
    info!(
        job = %job.id,
        eval_id = %response.eval_id,
        target = %target_addr,
        "Ping job registered"
    );
    if !response.warnings.is_empty() {
        tracing::warn!(job = %job.id, warnings = %response.warnings, "Nomad registration warnings");
    }

    Ok(response)
}

#[cfg(test)]
#[path = "nomad_test.rs"]
mod tests;
