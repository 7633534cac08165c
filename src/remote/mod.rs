//! HTTP clients for the two remote collaborators
//!
//! - [`HttpRemoteRunner`]: the optimization service (`POST /run`)
//! - [`HttpExperimentStore`]: the canonical experiment store
//!
//! Both share [`RemoteClient`], which owns the base URL and the caller's
//! timeout and translates transport failures into the crate's error kinds:
//!
//! | Failure                              | Error                      |
//! |--------------------------------------|----------------------------|
//! | connect/DNS/timeout/undecodable body | `RemoteUnavailable`        |
//! | non-2xx status                       | `RemoteRejected`           |

mod runner;
mod store;

pub use runner::{HttpRemoteRunner, RemoteRunner};
pub use store::HttpExperimentStore;

use std::time::Duration;

use reqwest::{Response, StatusCode};

use crate::{Error, Result};

/// Base URL plus a configured `reqwest` client.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Build a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

pub(crate) fn transport_error(e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::RemoteUnavailable(format!("request timed out: {e}"))
    } else if e.is_decode() {
        Error::RemoteUnavailable(format!("invalid response body: {e}"))
    } else {
        Error::RemoteUnavailable(e.to_string())
    }
}

/// Pass 2xx responses through; turn anything else into `RemoteRejected`.
pub(crate) async fn require_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(rejected(status, body))
}

pub(crate) fn rejected(status: StatusCode, body: String) -> Error {
    Error::RemoteRejected {
        status: status.as_u16(),
        body,
    }
}
