//! Phase pipeline integration tests
//!
//! Wires real agent loops, the VoI analyzer, the heuristic verifier, the
//! coordinator, the gate-retry runner, and the saga compensator together with
//! small in-test strategies, tools, gates, and reverters.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use phasegate::agent::{AgentLoop, AgentLoopConfig, AgentStrategy, ToolInvocationResult, ToolInvoker, ToolRequest};
use phasegate::analyzer::{AnalyzerConfig, VoiAnalyzer};
use phasegate::catalog::{Capability, CapabilityPolicy, StaticCatalogue};
use phasegate::coordinator::{
    CoordinatorConfig, GateDecision, GateResult, GateRetryConfig, GatedPhaseRunner, PhaseAgent, PhaseCoordinator,
    QualityGate,
};
use phasegate::domain::{
    Artifact, ExecutionPlan, LoopExit, PhaseInput, PhaseOutput, PlanStep, ReasoningResult, SideEffect, event_types,
};
use phasegate::error::{PhasegateError, Result};
use phasegate::events::MemoryEventSink;
use phasegate::saga::{
    JsonlSagaStore, LedgerRollbackPlanner, SagaCompensator, SagaStatus, SagaStore, SideEffectReverter, StepStatus,
};
use phasegate::verifier::{Verifier, VerifierConfig};
use serde_json::Value;
use tempfile::TempDir;

/// Drafts one answer per attempt and reports the draft as a created artifact.
struct DraftStrategy {
    id: String,
}

#[async_trait]
impl AgentStrategy for DraftStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    async fn plan(&self, input: &PhaseInput) -> Result<ExecutionPlan> {
        Ok(ExecutionPlan::new(
            &input.phase,
            vec![PlanStep::new("1", "draft", "Draft an answer")],
        ))
    }

    async fn reason(&self, input: &PhaseInput, _plan: &ExecutionPlan) -> Result<ReasoningResult> {
        let attempt = input.hints.as_ref().map(|h| h.attempt).unwrap_or(0);
        Ok(ReasoningResult::new(format!("{}-draft-{}", self.id, attempt), 0.5)
            .with_needs_improvement(true)
            .with_usage(0.02, 200))
    }

    async fn generate_artifacts(&self, _input: &PhaseInput, result: &ReasoningResult) -> Result<Vec<Artifact>> {
        Ok(vec![Artifact::new("draft", result.content.clone())])
    }

    fn side_effects(&self, artifacts: &[Artifact]) -> Vec<SideEffect> {
        artifacts
            .iter()
            .map(|a| SideEffect::ArtifactCreated { id: a.content.clone() })
            .collect()
    }
}

#[derive(Default)]
struct EchoTool {
    calls: AtomicU32,
}

#[async_trait]
impl ToolInvoker for EchoTool {
    async fn invoke(&self, request: ToolRequest) -> Result<ToolInvocationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = request.input["content"].as_str().unwrap_or_default().to_string();
        Ok(ToolInvocationResult::ok(Value::String(content), 0.01).with_tokens(50))
    }
}

struct FailingGate {
    calls: AtomicU32,
}

#[async_trait]
impl QualityGate for FailingGate {
    async fn evaluate(&self, _output: &PhaseOutput) -> Result<GateResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GateResult::fail(
            35.0,
            GateDecision::default()
                .with_reason("drafts do not cover failure modes")
                .with_required_action("Describe failure handling"),
        ))
    }
}

#[derive(Default)]
struct RecordingReverter {
    reverted: Mutex<Vec<String>>,
    refuse: Option<String>,
}

#[async_trait]
impl SideEffectReverter for RecordingReverter {
    async fn revert(&self, effect: &SideEffect) -> Result<()> {
        if self.refuse.as_deref() == Some(effect.target()) {
            return Err(PhasegateError::SagaStep(format!("{} is locked", effect.target())));
        }
        self.reverted.lock().unwrap().push(effect.target().to_string());
        Ok(())
    }
}

fn catalogue() -> Arc<StaticCatalogue> {
    Arc::new(StaticCatalogue::from_capabilities(vec![Capability::new(
        "summarizer",
        "analysis",
        0.01,
    )]))
}

fn agent(id: &str, analyzer_threshold: f64, tool: Arc<EchoTool>, max_tool_invocations: u32) -> Arc<dyn PhaseAgent> {
    let analyzer = VoiAnalyzer::new(
        catalogue(),
        CapabilityPolicy::permissive(),
        AnalyzerConfig::default().with_threshold(analyzer_threshold),
    );
    Arc::new(AgentLoop::new(
        Arc::new(DraftStrategy { id: id.to_string() }),
        Arc::new(analyzer),
        tool,
        Arc::new(Verifier::heuristic(VerifierConfig::default())),
        AgentLoopConfig {
            max_tool_invocations,
            ..AgentLoopConfig::default()
        },
    ))
}

/// Test: a cheap relevant tool is consulted once, and the loop stops at its iteration cap
#[tokio::test]
async fn test_agent_consults_cheap_tool() {
    let tool = Arc::new(EchoTool::default());
    let agent = agent("writer", 0.3, tool.clone(), 1);

    let output = agent.run(&PhaseInput::new("design", "Design the cache")).await;

    assert!(output.success);
    assert_eq!(output.tools_invoked, vec!["summarizer".to_string()]);
    assert_eq!(output.exit, LoopExit::IterationLimit);
    assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    // Identical content never counts as an improvement
    assert_eq!(output.integrations, 0);
    assert_eq!(output.artifacts[0].content, "writer-draft-0");
}

/// Test: tools disabled by threshold means a single analysis and a low-value exit
#[tokio::test]
async fn test_threshold_one_disables_tools() {
    let tool = Arc::new(EchoTool::default());
    let agent = agent("writer", 1.0, tool.clone(), 5);

    let output = agent.run(&PhaseInput::new("design", "Design the cache")).await;

    assert_eq!(output.exit, LoopExit::LowValue);
    assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
}

/// Test: five agents at concurrency two run in batches of 2, 2, 1 and all artifacts are aggregated
#[tokio::test]
async fn test_five_agents_batched() {
    let tool = Arc::new(EchoTool::default());
    let events = Arc::new(MemoryEventSink::new());
    let agents = (1..=5).map(|i| agent(&format!("a{}", i), 1.0, tool.clone(), 5)).collect();
    let coordinator = PhaseCoordinator::new(
        agents,
        CoordinatorConfig {
            max_concurrency: 2,
            min_required_agents: 5,
        },
    )
    .with_events(events.clone());

    let output = coordinator.execute(&PhaseInput::new("discovery", "Collect requirements")).await;

    assert!(output.success);
    assert_eq!(output.artifacts.len(), 5);
    assert_eq!(output.side_effects.len(), 5);
    let sizes: Vec<u64> = events
        .of_type(event_types::PHASE_BATCH_DISPATCHED)
        .iter()
        .map(|e| e.payload["size"].as_u64().unwrap())
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    // reason 0.02 + one analysis 0.01 per agent
    assert!((output.cost_usd - 0.15).abs() < 1e-9);
}

/// Test: a gate that keeps failing runs the phase 1 + max retries times, then rolls back every draft
#[tokio::test]
async fn test_exhausted_gate_retries_roll_back_and_persist() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(JsonlSagaStore::new(temp_dir.path())?);
    let reverter = Arc::new(RecordingReverter::default());
    let gate = Arc::new(FailingGate {
        calls: AtomicU32::new(0),
    });
    let events = Arc::new(MemoryEventSink::new());

    let tool = Arc::new(EchoTool::default());
    let agents = vec![agent("a1", 1.0, tool.clone(), 5), agent("a2", 1.0, tool, 5)];
    let coordinator = PhaseCoordinator::new(agents, CoordinatorConfig::default());
    let runner = GatedPhaseRunner::new(
        coordinator,
        gate.clone(),
        Arc::new(LedgerRollbackPlanner::new(reverter.clone())),
        GateRetryConfig { max_gate_retries: 2 },
    )
    .with_compensator(SagaCompensator::new().with_store(store.clone()))
    .with_events(events.clone());

    let report = runner.run(&PhaseInput::new("design", "Design the API")).await;

    assert!(!report.success());
    assert_eq!(gate.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.output.attempts, 3);
    assert_eq!(runner.retry_count(), 2);
    assert_eq!(events.of_type(event_types::GATE_EVALUATED).len(), 3);
    assert!(report.output.error.as_deref().unwrap().contains("do not cover failure modes"));

    // Two agents, three attempts, each attempt drafts distinct artifacts; newest reverted first
    let reverted = reverter.reverted.lock().unwrap().clone();
    assert_eq!(reverted.len(), 6);
    assert_eq!(reverted.first().map(String::as_str), Some("a2-draft-2"));
    assert_eq!(reverted.last().map(String::as_str), Some("a1-draft-0"));

    let saga = report.saga.unwrap();
    assert_eq!(saga.status, SagaStatus::Compensated);

    let record = store.get(&saga.id)?.unwrap();
    assert_eq!(record.status, SagaStatus::Compensated);
    // Six applied effects, each followed by its revert
    assert_eq!(record.step_results.len(), 12);
    let compensated = record
        .step_results
        .iter()
        .filter(|r| r.status == StepStatus::Compensated)
        .count();
    assert_eq!(compensated, 6);
    assert_eq!(store.list(Some(SagaStatus::Compensated))?.len(), 1);
    assert!(store.list(Some(SagaStatus::CompensationFailed))?.is_empty());

    Ok(())
}

/// Test: a revert that fails during rollback leaves the saga needing an operator
#[tokio::test]
async fn test_refused_revert_surfaces_compensation_failed() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(JsonlSagaStore::new(temp_dir.path())?);
    let reverter = Arc::new(RecordingReverter {
        refuse: Some("a2-draft-0".to_string()),
        ..RecordingReverter::default()
    });
    let gate = Arc::new(FailingGate {
        calls: AtomicU32::new(0),
    });

    let tool = Arc::new(EchoTool::default());
    let agents = vec![agent("a1", 1.0, tool.clone(), 5), agent("a2", 1.0, tool, 5)];
    let runner = GatedPhaseRunner::new(
        PhaseCoordinator::new(agents, CoordinatorConfig::default()),
        gate,
        Arc::new(LedgerRollbackPlanner::new(reverter.clone())),
        GateRetryConfig { max_gate_retries: 0 },
    )
    .with_compensator(SagaCompensator::new().with_store(store.clone()));

    let report = runner.run(&PhaseInput::new("design", "Design the API")).await;

    assert!(!report.success());
    let saga = report.saga.unwrap();
    assert_eq!(saga.status, SagaStatus::CompensationFailed);
    // The newest effect could not be reverted, so the sweep stopped before a1's draft
    assert!(reverter.reverted.lock().unwrap().is_empty());
    assert_eq!(store.list(Some(SagaStatus::CompensationFailed))?.len(), 1);

    Ok(())
}
