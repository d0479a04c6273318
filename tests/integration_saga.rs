//! Saga compensator integration tests
//!
//! Exercises forward execution, reverse-order compensation, and durable
//! records through the JSONL saga store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use phasegate::error::{PhasegateError, Result};
use phasegate::saga::{JsonlSagaStore, Saga, SagaCompensator, SagaStatus, SagaStep, SagaStore, StepStatus, action_fn};
use tempfile::TempDir;

type Log = Arc<Mutex<Vec<String>>>;

fn recorded(log: &Log, entry: &str) -> Arc<dyn phasegate::saga::SagaAction> {
    let log = Arc::clone(log);
    let entry = entry.to_string();
    action_fn(move || {
        let log = Arc::clone(&log);
        let entry = entry.clone();
        async move {
            log.lock().unwrap().push(entry);
            Ok(())
        }
    })
}

fn failing(message: &str) -> Arc<dyn phasegate::saga::SagaAction> {
    let message = message.to_string();
    action_fn(move || {
        let message = message.clone();
        async move { Err(PhasegateError::SagaStep(message)) }
    })
}

fn step(log: &Log, id: &str) -> SagaStep {
    SagaStep::new(id, id.to_uppercase(), recorded(log, &format!("do {}", id)), recorded(log, &format!("undo {}", id)))
        .with_timeout(Duration::from_secs(5))
}

/// Test: C fails, so B then A are compensated, and the record survives a reopen
#[tokio::test]
async fn test_reverse_compensation_is_persisted() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let log: Log = Arc::default();
    let steps = vec![
        step(&log, "a"),
        step(&log, "b"),
        SagaStep::new("c", "C", failing("quota exceeded"), recorded(&log, "undo c")).critical(true),
    ];

    let saga = {
        let store = Arc::new(JsonlSagaStore::new(temp_dir.path())?);
        SagaCompensator::new()
            .with_store(store)
            .execute(Saga::new("rollback design", steps))
            .await
    };

    assert_eq!(saga.status, SagaStatus::Compensated);
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["do a", "do b", "undo b", "undo a"]
    );
    assert_eq!(saga.compensation_order(), vec!["b", "a"]);

    let store = JsonlSagaStore::new(temp_dir.path())?;
    let record = store.get(&saga.id)?.unwrap();
    assert_eq!(record.status, SagaStatus::Compensated);
    assert_eq!(record.step_ids, vec!["a", "b", "c"]);
    let c = record.step_results.iter().find(|r| r.step_id == "c").unwrap();
    assert_eq!(c.status, StepStatus::Failed);
    assert_eq!(c.attempts, 1);
    assert!(record.error.as_deref().unwrap().contains("quota exceeded"));

    Ok(())
}

/// Test: a failing compensation stops the sweep and leaves an inspectable failed saga
#[tokio::test]
async fn test_compensation_failure_needs_operator() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(JsonlSagaStore::new(temp_dir.path())?);
    let log: Log = Arc::default();
    let steps = vec![
        step(&log, "a"),
        SagaStep::new("b", "B", recorded(&log, "do b"), failing("cannot drop column")),
        SagaStep::new("c", "C", failing("boom"), recorded(&log, "undo c")).retryable(false),
    ];

    let saga = SagaCompensator::new()
        .with_store(store.clone())
        .execute(Saga::new("rollback migrate", steps))
        .await;

    assert_eq!(saga.status, SagaStatus::CompensationFailed);
    // a is never compensated once b's compensation fails
    assert_eq!(log.lock().unwrap().clone(), vec!["do a", "do b"]);

    let failed = store.list(Some(SagaStatus::CompensationFailed))?;
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, saga.id);

    Ok(())
}
