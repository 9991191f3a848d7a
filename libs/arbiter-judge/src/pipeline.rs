/// Evaluation Entry Point - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate problem store, dispatcher and aggregator to produce a
/// `SubmissionVerdict` for one submission.
///
/// This module is the glue layer - it knows nothing about:
/// - How programs are built (harness's job)
/// - How programs execute (engine's job)
/// - How verdicts are decided (evaluator's job)
use crate::dispatcher::Dispatcher;
use crate::engine::ExecutionEngine;
use crate::error::EvaluationError;
use crate::evaluator;
use crate::problem_store::ProblemStore;
use arbiter_common::{RunMode, Submission, SubmissionVerdict, TestCase};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Cases evaluated for a mode: samples for `Run`, everything for `Submit`
pub fn select_cases(test_cases: Vec<TestCase>, mode: RunMode) -> Vec<TestCase> {
    match mode {
        RunMode::Run => test_cases.into_iter().filter(|tc| tc.is_sample).collect(),
        RunMode::Submit => test_cases,
    }
}

/// Evaluate one submission end to end
///
/// Input errors are rejected before any engine call. Per-case execution
/// failures never surface here; they are outcomes inside the verdict.
#[instrument(
    skip_all,
    fields(
        problem = %submission.problem_ref,
        language = %submission.language,
        mode = ?mode
    )
)]
pub async fn evaluate_submission<S, E>(
    store: &S,
    dispatcher: &Dispatcher<E>,
    submission: &Submission,
    mode: RunMode,
    cancel: &CancellationToken,
) -> Result<SubmissionVerdict, EvaluationError>
where
    S: ProblemStore + ?Sized,
    E: ExecutionEngine,
{
    if submission.source_code.trim().is_empty() {
        return Err(EvaluationError::MissingSource);
    }
    if submission.problem_ref.trim().is_empty() {
        return Err(EvaluationError::ProblemNotFound(String::new()));
    }

    let problem = store.load(&submission.problem_ref).await?;
    let test_cases = select_cases(problem.test_cases, mode);
    if test_cases.is_empty() {
        return Err(EvaluationError::NoTestCases(problem.id));
    }

    let results = dispatcher
        .dispatch(submission, &problem.entry_point, &test_cases, cancel)
        .await?;
    let verdict = evaluator::aggregate(&test_cases, &results)?;

    info!(
        status = %verdict.status,
        passed = verdict.total_passed,
        total = verdict.total_cases,
        "Submission evaluated"
    );

    Ok(verdict)
}
