//! Canonical store service
//!
//! HTTP surface over any [`ExperimentStore`], speaking the contract that
//! [`crate::remote::HttpExperimentStore`] consumes. All experiment routes
//! live under `/api`:
//!
//! | Method | Path                         | Success            | Failure                 |
//! |--------|------------------------------|--------------------|-------------------------|
//! | GET    | `/health`                    | 200 `{"status":"ok"}` |                      |
//! | GET    | `/api/experiments`           | 200 list, oldest first |                     |
//! | POST   | `/api/experiments`           | 201 stored record  | 400 empty id, 4xx body  |
//! | GET    | `/api/experiments/:id`       | 200 record         | 404                     |
//! | DELETE | `/api/experiments/:id`       | 204, present or not |                        |
//! | GET    | `/api/export/:id?format=`    | 200 file (default csv) | 404 id, then 400 format |
//!
//! Failures carry a JSON body `{"error": "..."}`.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::experiment::Experiment;
use crate::export::{self, ExportFormat};
use crate::store::ExperimentStore;
use crate::Error;

/// Error response: status plus a message for the `error` field.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

/// Build the service router over `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
    S: ExperimentStore + 'static,
{
    let api = Router::new()
        .route("/experiments", get(list::<S>).post(create::<S>))
        .route("/experiments/:id", get(fetch::<S>).delete(remove::<S>))
        .route("/export/:id", get(export_one::<S>))
        .with_state(store);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
}

/// Serve `store` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the underlying IO error if accepting connections fails.
pub async fn serve<S>(
    listener: TcpListener,
    store: Arc<S>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()>
where
    S: ExperimentStore + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "experiment store listening");
    }
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn list<S: ExperimentStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<Experiment>>, ApiError> {
    Ok(Json(store.list().await?))
}

async fn create<S: ExperimentStore>(
    State(store): State<Arc<S>>,
    body: Result<Json<Experiment>, JsonRejection>,
) -> Result<(StatusCode, Json<Experiment>), ApiError> {
    let Json(experiment) = body?;
    if experiment.id().trim().is_empty() {
        return Err(ApiError::bad_request("experiment id must not be empty"));
    }
    store.put(&experiment).await?;
    tracing::debug!(id = experiment.id(), "experiment stored");
    Ok((StatusCode::CREATED, Json(experiment)))
}

async fn fetch<S: ExperimentStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<Experiment>, ApiError> {
    Ok(Json(store.get(&id).await?))
}

async fn remove<S: ExperimentStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    store.delete(&id).await?;
    tracing::debug!(id = %id, "experiment deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn export_one<S: ExperimentStore>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let experiment = store.get(&id).await?;
    let format: ExportFormat = query.format.as_deref().unwrap_or("csv").parse()?;
    let bytes = export::export(&experiment, format)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::file_name(&experiment, format)
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
