//! Remote Runner - calls the optimization service

use std::future::Future;

use super::{require_success, transport_error, RemoteClient};
use crate::experiment::{RunRequest, RunResponse};
use crate::Result;

/// Executes a run somewhere other than this process.
///
/// Implementations make exactly one attempt and never touch a store;
/// retry and fallback policy belong to the orchestrator.
pub trait RemoteRunner: Send + Sync {
    /// Run the optimization.
    ///
    /// Fails with `RemoteUnavailable` when the call cannot complete and
    /// `RemoteRejected` when the service answers with a non-success status.
    fn run(&self, request: &RunRequest) -> impl Future<Output = Result<RunResponse>> + Send;
}

/// [`RemoteRunner`] speaking the `POST /run` JSON contract.
#[derive(Debug, Clone)]
pub struct HttpRemoteRunner {
    client: RemoteClient,
}

impl HttpRemoteRunner {
    /// Create a runner for the service at the client's base URL.
    #[must_use]
    pub const fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Probe `GET /health`; any failure reads as unhealthy.
    pub async fn is_healthy(&self) -> bool {
        match self.client.http().get(self.client.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

impl RemoteRunner for HttpRemoteRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse> {
        let response = self
            .client
            .http()
            .post(self.client.url("/run"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = require_success(response).await?;
        response
            .json::<RunResponse>()
            .await
            .map_err(|e| transport_error(&e))
    }
}
