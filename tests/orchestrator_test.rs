//! Orchestrator Tests
//!
//! One run request end to end: validation, remote execution with fallback,
//! persistence into both stores, cancellation and deletion.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use beelab::error::{InputStep, ValidationError};
use beelab::experiment::{BeeParams, ExperimentInput, ExperimentView, RunOutcome, RunState};
use beelab::orchestrator::{Orchestrator, RunControl, RunSubmission};
use beelab::store::ExperimentStore;
use beelab::Error;

use common::{
    memory_store, MemoryStore, ReadOnlyCache, Script, ScriptedRunner, SlowCache,
    UnreachableStore,
};

fn orchestrator(script: Script) -> Orchestrator<MemoryStore, MemoryStore, ScriptedRunner> {
    Orchestrator::new(
        memory_store(),
        memory_store(),
        ScriptedRunner::new(script),
        Arc::new(ExperimentView::new()),
    )
}

fn two_by_two() -> ExperimentInput {
    ExperimentInput::manual(vec![vec![0.1, 0.9], vec![0.6, 0.4]])
}

// =============================================================================
// Remote execution and fallback
// =============================================================================

#[tokio::test]
async fn test_service_down_falls_back_and_persists() {
    let orch = orchestrator(Script::Down);
    let submission = RunSubmission::new("offline run", BeeParams::new(20, 5), two_by_two());

    let report = orch.run(submission).await.expect("run succeeds offline");

    assert!(report.is_fallback());
    assert!(matches!(report.outcome, RunOutcome::Fallback(ref r) if r.result_series.len() == 5));
    assert!(report.remote_persisted);
    assert_eq!(report.experiment.result_series().len(), 5);
    assert_eq!(report.experiment.best_solution().map(<[f64]>::len), Some(2));
    assert_eq!(report.experiment.name(), "offline run");

    let stored = orch.local().get(report.id()).await.unwrap();
    assert_eq!(stored, report.experiment);
    assert!(orch.remote().get(report.id()).await.is_ok());
    assert_eq!(orch.view().ids(), vec![report.id().to_string()]);
}

#[tokio::test]
async fn test_service_answer_is_used() {
    let orch = orchestrator(Script::Answer);
    let report = orch
        .run(RunSubmission::new("remote run", BeeParams::new(30, 3), two_by_two()))
        .await
        .unwrap();

    assert!(!report.is_fallback());
    assert!(matches!(report.outcome, RunOutcome::Remote(ref r) if r.duration_ms == 4321));
    assert_eq!(report.experiment.duration_ms(), 4321);
    assert_eq!(report.experiment.result_series().len(), 3);
    assert_eq!(report.experiment.kpis()[1].value().to_string(), "service");
}

#[tokio::test]
async fn test_rejected_call_falls_back() {
    let orch = orchestrator(Script::Rejected(500));
    let report = orch
        .run(RunSubmission::new("rejected", BeeParams::new(20, 4), two_by_two()))
        .await
        .unwrap();
    assert!(report.is_fallback());
    assert_eq!(report.experiment.result_series().len(), 4);
}

#[tokio::test]
async fn test_malformed_series_falls_back() {
    let orch = orchestrator(Script::WrongLength(2));
    let report = orch
        .run(RunSubmission::new("short", BeeParams::new(20, 6), two_by_two()))
        .await
        .unwrap();
    assert!(report.is_fallback());
    assert_eq!(report.experiment.result_series().len(), 6);
}

#[tokio::test]
async fn test_slow_service_times_out_into_fallback() {
    let orch = orchestrator(Script::Hang).with_remote_timeout(Duration::from_millis(50));
    let control = RunControl::new();
    let report = orch
        .run_with(
            RunSubmission::new("slow", BeeParams::new(20, 3), two_by_two()),
            &control,
        )
        .await
        .unwrap();
    assert!(report.is_fallback());
    assert_eq!(control.state(), RunState::Done);
}

#[tokio::test]
async fn test_preloaded_dataset_resolved() {
    let orch = orchestrator(Script::Down);
    let report = orch
        .run(RunSubmission::new(
            "toy",
            BeeParams::new(20, 10),
            ExperimentInput::preloaded("toy-9x5"),
        ))
        .await
        .unwrap();

    let input = report.experiment.input();
    assert_eq!(input.dataset_name(), Some("toy-9x5"));
    assert_eq!(input.alternative_count(), 9);
    assert_eq!(report.experiment.best_solution().map(<[f64]>::len), Some(5));
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_local_write_failure_fails_run() {
    let view = Arc::new(ExperimentView::new());
    let orch = Orchestrator::new(
        ReadOnlyCache::default(),
        memory_store(),
        ScriptedRunner::new(Script::Down),
        Arc::clone(&view),
    );
    let control = RunControl::new();

    let err = orch
        .run_with(
            RunSubmission::new("doomed", BeeParams::new(20, 2), two_by_two()),
            &control,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PersistenceFailed(_)));
    assert_eq!(control.state(), RunState::Failed);
    assert!(view.is_empty());
    assert!(orch.remote().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_run_still_reaches_local_cache() {
    let orch = Orchestrator::new(
        SlowCache::new(Duration::from_millis(200)),
        memory_store(),
        ScriptedRunner::new(Script::Down),
        Arc::new(ExperimentView::new()),
    );
    let control = RunControl::new();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        orch.run_with(
            RunSubmission::new("keep", BeeParams::new(10, 2), two_by_two()).with_id("keep-me"),
            &control,
        ),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(control.state(), RunState::Persisting);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(orch.local().get("keep-me").await.is_ok());
    assert!(orch.remote().get("keep-me").await.is_ok());
    assert_eq!(orch.view().ids(), vec!["keep-me"]);
}

#[tokio::test]
async fn test_canonical_store_failure_is_not_fatal() {
    let orch = Orchestrator::new(
        memory_store(),
        UnreachableStore,
        ScriptedRunner::new(Script::Answer),
        Arc::new(ExperimentView::new()),
    );

    let report = orch
        .run(RunSubmission::new("half", BeeParams::new(20, 2), two_by_two()))
        .await
        .unwrap();

    assert!(!report.remote_persisted);
    assert!(orch.local().get(report.id()).await.is_ok());
    assert_eq!(orch.list().len(), 1);
}

#[tokio::test]
async fn test_runs_get_distinct_ids() {
    let orch = orchestrator(Script::Down);
    let a = orch
        .run(RunSubmission::new("a", BeeParams::new(10, 1), two_by_two()))
        .await
        .unwrap();
    let b = orch
        .run(RunSubmission::new("b", BeeParams::new(10, 1), two_by_two()))
        .await
        .unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(orch.list().len(), 2);
}

#[tokio::test]
async fn test_supplied_id_is_kept() {
    let orch = orchestrator(Script::Down);
    let report = orch
        .run(RunSubmission::new("named", BeeParams::new(10, 1), two_by_two()).with_id("fixed-id"))
        .await
        .unwrap();
    assert_eq!(report.id(), "fixed-id");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_blank_name_rejected_before_any_call() {
    let runner = ScriptedRunner::new(Script::Answer);
    let calls = runner.calls();
    let orch = Orchestrator::new(
        memory_store(),
        memory_store(),
        runner,
        Arc::new(ExperimentView::new()),
    );

    let err = orch
        .run(RunSubmission::new("   ", BeeParams::new(20, 5), two_by_two()))
        .await
        .unwrap_err();

    let validation = err.as_validation().expect("validation error");
    assert_eq!(validation, &ValidationError::MissingName);
    assert_eq!(validation.step(), InputStep::Name);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(orch.local().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_matrix_rejected() {
    let orch = orchestrator(Script::Answer);
    let err = orch
        .run(RunSubmission::new(
            "empty",
            BeeParams::new(20, 5),
            ExperimentInput::manual(Vec::new()),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.as_validation().map(ValidationError::step), Some(InputStep::Data));
}

#[tokio::test]
async fn test_unknown_dataset_rejected() {
    let orch = orchestrator(Script::Answer);
    let err = orch
        .run(RunSubmission::new(
            "iris",
            BeeParams::new(20, 5),
            ExperimentInput::preloaded("iris"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownDataset(ref name)) if name == "iris"
    ));
}

#[tokio::test]
async fn test_out_of_range_params_rejected() {
    let orch = orchestrator(Script::Answer);
    let err = orch
        .run(RunSubmission::new("big", BeeParams::new(20, 5000), two_by_two()))
        .await
        .unwrap_err();
    assert_eq!(err.as_validation().map(ValidationError::step), Some(InputStep::Params));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_while_waiting_on_service() {
    let orch = orchestrator(Script::Hang);
    let control = RunControl::new();

    let (result, ()) = tokio::join!(
        orch.run_with(
            RunSubmission::new("cancelled", BeeParams::new(20, 5), two_by_two()),
            &control,
        ),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            control.cancel();
        }
    );

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(control.state(), RunState::Failed);
    assert!(orch.local().list().await.unwrap().is_empty());
    assert!(orch.view().is_empty());
}

#[tokio::test]
async fn test_cancel_before_start() {
    let runner = ScriptedRunner::new(Script::Answer);
    let calls = runner.calls();
    let orch = Orchestrator::new(
        memory_store(),
        memory_store(),
        runner,
        Arc::new(ExperimentView::new()),
    );
    let control = RunControl::new();
    control.cancel();

    let result = orch
        .run_with(
            RunSubmission::new("never", BeeParams::new(20, 5), two_by_two()),
            &control,
        )
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Deletion and lookup
// =============================================================================

#[tokio::test]
async fn test_delete_everywhere_and_idempotent() {
    let orch = orchestrator(Script::Down);
    let report = orch
        .run(RunSubmission::new("gone", BeeParams::new(10, 2), two_by_two()))
        .await
        .unwrap();
    let id = report.id().to_string();

    orch.delete(&id).await.unwrap();
    assert!(matches!(orch.local().get(&id).await, Err(Error::NotFound(_))));
    assert!(matches!(orch.remote().get(&id).await, Err(Error::NotFound(_))));
    assert!(orch.view().is_empty());

    orch.delete(&id).await.unwrap();
    orch.delete("never-existed").await.unwrap();
}

#[tokio::test]
async fn test_delete_survives_unreachable_canonical_store() {
    let orch = Orchestrator::new(
        memory_store(),
        UnreachableStore,
        ScriptedRunner::new(Script::Down),
        Arc::new(ExperimentView::new()),
    );
    let report = orch
        .run(RunSubmission::new("local only", BeeParams::new(10, 2), two_by_two()))
        .await
        .unwrap();

    orch.delete(report.id()).await.unwrap();
    assert!(orch.local().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_falls_back_to_local_cache() {
    let orch = orchestrator(Script::Down);
    let stored = common::experiment("cached", 1);
    orch.local().put(&stored).await.unwrap();

    assert_eq!(orch.get("cached").await.unwrap(), stored);
    assert!(matches!(orch.get("missing").await, Err(Error::NotFound(_))));
}
