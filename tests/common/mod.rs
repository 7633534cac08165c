//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use beelab::experiment::{
    BeeParams, Experiment, ExperimentInput, Kpi, ResultSeriesPoint, RunRequest, RunResponse,
};
use beelab::kv::MemoryKvStore;
use beelab::remote::RemoteRunner;
use beelab::store::{ExperimentCache, ExperimentStore, KvExperimentStore};
use beelab::{Error, Result};
use chrono::{TimeZone, Utc};

pub type MemoryStore = KvExperimentStore<MemoryKvStore>;

pub fn memory_store() -> MemoryStore {
    KvExperimentStore::new(MemoryKvStore::new())
}

/// Experiment with a fixed creation time `minute` minutes into 2024.
pub fn experiment(id: &str, minute: u32) -> Experiment {
    Experiment::builder(
        id,
        format!("experiment {id}"),
        BeeParams::new(10, 2),
        ExperimentInput::manual(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
    )
    .created_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap())
    .kpis(vec![Kpi::new("Best fitness", 1.0)])
    .result_series(vec![ResultSeriesPoint::new(1, 2.0), ResultSeriesPoint::new(2, 1.0)])
    .build()
}

/// How a scripted runner answers.
#[derive(Debug, Clone)]
pub enum Script {
    /// Connection refused
    Down,
    /// Non-2xx answer
    Rejected(u16),
    /// A well-formed response with `maxIterations` points
    Answer,
    /// A response with the given number of points
    WrongLength(usize),
    /// Never answers within any test timeout
    Hang,
}

/// Runner that follows a script and counts calls.
#[derive(Debug, Clone)]
pub struct ScriptedRunner {
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

pub fn remote_response(points: usize) -> RunResponse {
    RunResponse {
        duration_ms: 4321,
        kpis: vec![Kpi::new("Best fitness", 0.5), Kpi::new("Source", "service")],
        best_solution: Some(vec![0.25, 0.75]),
        result_series: (1..=points)
            .map(|i| {
                let i = u32::try_from(i).unwrap();
                ResultSeriesPoint::new(i, 10.0 / f64::from(i))
            })
            .collect(),
    }
}

impl RemoteRunner for ScriptedRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Down => Err(Error::RemoteUnavailable("connection refused".to_string())),
            Script::Rejected(status) => Err(Error::RemoteRejected {
                status,
                body: "nope".to_string(),
            }),
            Script::Answer => Ok(remote_response(request.params.max_iterations() as usize)),
            Script::WrongLength(points) => Ok(remote_response(points)),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::RemoteUnavailable("hung".to_string()))
            }
        }
    }
}

/// Store whose every operation fails, as a down service would.
#[derive(Debug, Default)]
pub struct UnreachableStore;

impl ExperimentStore for UnreachableStore {
    async fn list(&self) -> Result<Vec<Experiment>> {
        Err(Error::RemoteUnavailable("store down".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Experiment> {
        Err(Error::RemoteUnavailable("store down".to_string()))
    }

    async fn put(&self, _experiment: &Experiment) -> Result<()> {
        Err(Error::RemoteUnavailable("store down".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Err(Error::RemoteUnavailable("store down".to_string()))
    }
}

/// Cache that reads fine but refuses writes.
#[derive(Debug, Default)]
pub struct ReadOnlyCache {
    inner: Option<Vec<Experiment>>,
}

impl ReadOnlyCache {
    pub fn with(experiments: Vec<Experiment>) -> Self {
        Self {
            inner: Some(experiments),
        }
    }
}

impl ExperimentStore for ReadOnlyCache {
    async fn list(&self) -> Result<Vec<Experiment>> {
        Ok(self.inner.clone().unwrap_or_default())
    }

    async fn get(&self, id: &str) -> Result<Experiment> {
        self.inner
            .iter()
            .flatten()
            .find(|e| e.id() == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn put(&self, _experiment: &Experiment) -> Result<()> {
        Err(Error::PersistenceFailed("disk full".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Err(Error::PersistenceFailed("disk full".to_string()))
    }
}

impl ExperimentCache for ReadOnlyCache {
    async fn replace_all(&self, _experiments: &[Experiment]) -> Result<()> {
        Err(Error::PersistenceFailed("disk full".to_string()))
    }
}

/// Cache whose writes take `delay` before landing in memory.
#[derive(Debug)]
pub struct SlowCache {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowCache {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: memory_store(),
            delay,
        }
    }
}

impl ExperimentStore for SlowCache {
    async fn list(&self) -> Result<Vec<Experiment>> {
        self.inner.list().await
    }

    async fn get(&self, id: &str) -> Result<Experiment> {
        self.inner.get(id).await
    }

    async fn put(&self, experiment: &Experiment) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(experiment).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }
}

impl ExperimentCache for SlowCache {
    async fn replace_all(&self, experiments: &[Experiment]) -> Result<()> {
        self.inner.replace_all(experiments).await
    }
}
