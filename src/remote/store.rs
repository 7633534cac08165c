//! Canonical store client for the `/experiments` HTTP contract.

use reqwest::StatusCode;

use super::{rejected, require_success, transport_error, RemoteClient};
use crate::experiment::Experiment;
use crate::store::{sort_for_listing, ExperimentStore};
use crate::{Error, Result};

/// [`ExperimentStore`] backed by the canonical store service.
#[derive(Debug, Clone)]
pub struct HttpExperimentStore {
    client: RemoteClient,
}

impl HttpExperimentStore {
    /// Create a store client for the service at the client's base URL.
    #[must_use]
    pub const fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    fn experiment_url(&self, id: &str) -> String {
        self.client.url(&format!("/experiments/{}", encode_segment(id)))
    }
}

// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(segment: &str) -> String {
    use std::fmt::Write;
    segment.bytes().fold(String::with_capacity(segment.len()), |mut s, b| {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            s.push(char::from(b));
        } else {
            let _ = write!(s, "%{b:02X}");
        }
        s
    })
}

impl ExperimentStore for HttpExperimentStore {
    async fn list(&self) -> Result<Vec<Experiment>> {
        let response = self
            .client
            .http()
            .get(self.client.url("/experiments"))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let mut experiments = require_success(response)
            .await?
            .json::<Vec<Experiment>>()
            .await
            .map_err(|e| transport_error(&e))?;
        sort_for_listing(&mut experiments);
        Ok(experiments)
    }

    async fn get(&self, id: &str) -> Result<Experiment> {
        let response = self
            .client
            .http()
            .get(self.experiment_url(id))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id.to_string()));
        }
        require_success(response)
            .await?
            .json::<Experiment>()
            .await
            .map_err(|e| transport_error(&e))
    }

    async fn put(&self, experiment: &Experiment) -> Result<()> {
        let response = self
            .client
            .http()
            .post(self.client.url("/experiments"))
            .json(experiment)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        require_success(response).await.map(drop)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .http()
            .delete(self.experiment_url(id))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        // Absent ids are already deleted.
        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(rejected(s, response.text().await.unwrap_or_default())),
        }
    }
}
