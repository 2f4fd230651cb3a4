//! Nomad HTTP API client
//!
//! Only the two calls the pong service needs: job validation and registration.

use super::job::Job;
use super::{JobRegistrar, NomadError, RegisterResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Nomad agent address inside the compose network
pub const DEFAULT_NOMAD_ADDRESS: &str = "http://nomad:4646";

/// Request body shared by `/v1/validate/job` and `/v1/jobs`
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JobRequest<'a> {
    job: &'a Job,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ValidateResponse {
    validation_errors: Option<Vec<String>>,
    error: Option<String>,
    warnings: Option<String>,
}

/// Production registrar talking to a Nomad agent over HTTP
pub struct NomadClient {
    http: reqwest::Client,
    address: String,
}

impl NomadClient {
    pub fn new(address: impl Into<String>) -> Self {
        NomadClient {
            http: reqwest::Client::new(),
            address: address.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn put_job(&self, path: &str, job: &Job) -> Result<reqwest::Response, String> {
        let url = format!("{}{}", self.address, path);
        let response = self
            .http
            .put(&url)
            .json(&JobRequest { job })
            .send()
            .await
            .map_err(|e| format!("PUT {} failed: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(format!("PUT {} returned {}: {}", url, status, body.trim()));
        }
        Ok(response)
    }
}

#[async_trait]
impl JobRegistrar for NomadClient {
    async fn validate(&self, job: &Job) -> Result<(), NomadError> {
        let response = self
            .put_job("/v1/validate/job", job)
            .await
            .map_err(NomadError::Validation)?;

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| NomadError::Validation(format!("invalid response: {}", e)))?;

        if let Some(errors) = body.validation_errors.filter(|errors| !errors.is_empty()) {
            return Err(NomadError::Validation(errors.join("; ")));
        }
        if let Some(error) = body.error.filter(|error| !error.is_empty()) {
            return Err(NomadError::Validation(error));
        }
        if let Some(warnings) = body.warnings.filter(|warnings| !warnings.is_empty()) {
            tracing::warn!(job = %job.id, warnings = %warnings, "Nomad job validation warnings");
        }
        Ok(())
    }

    async fn register(&self, job: &Job) -> Result<RegisterResponse, NomadError> {
        let response = self
            .put_job("/v1/jobs", job)
            .await
            .map_err(NomadError::Register)?;

        response
            .json()
            .await
            .map_err(|e| NomadError::Register(format!("invalid response: {}", e)))
    }
}
