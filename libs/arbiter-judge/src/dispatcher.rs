/// Dispatcher - Bounded, Order-Preserving Fan-Out
///
/// **Core Responsibility:**
/// Turn one submission and its ordered test cases into one
/// `ExecutionResult` per case, overlapping the engine calls.
///
/// **Guarantees:**
/// - `results[i]` always belongs to `test_cases[i]`, whatever the
///   completion order of the underlying calls
/// - At most `max_concurrency` engine calls are in flight; the rest queue
/// - Every case resolves: a call that outlives its own ceiling, or is
///   still pending when the batch ceiling fires, becomes `DeadlineExceeded`
/// - Only `EngineUnreachable` is retried, within the same per-case budget
/// - Cancellation drops every in-flight engine future
use crate::engine::ExecutionEngine;
use crate::error::EvaluationError;
use crate::harness;
use arbiter_common::{
    DispatchSettings, EngineStatus, ExecutionRequest, ExecutionResult, Language, Submission,
    TestCase,
};
use futures_util::stream::{self, StreamExt};
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub struct Dispatcher<E> {
    engine: E,
    settings: DispatchSettings,
}

impl<E: ExecutionEngine> Dispatcher<E> {
    pub fn new(engine: E, settings: DispatchSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run every test case of a submission and collect results in case order
    #[instrument(
        skip_all,
        fields(
            problem = %submission.problem_ref,
            language = %submission.language,
            cases = test_cases.len()
        )
    )]
    pub async fn dispatch(
        &self,
        submission: &Submission,
        entry_point: &str,
        test_cases: &[TestCase],
        cancel: &CancellationToken,
    ) -> Result<Vec<ExecutionResult>, EvaluationError> {
        if test_cases.is_empty() {
            return Err(EvaluationError::NoTestCases(submission.problem_ref.clone()));
        }

        // Boilerplate depends only on (language, entry point, source)
        let harness = harness::prepare(submission.language, entry_point, &submission.source_code);
        let requests: Vec<ExecutionRequest> = test_cases
            .iter()
            .map(|test_case| ExecutionRequest {
                program: harness.wrap(&test_case.input),
                stdin: test_case.input.clone(),
            })
            .collect();

        let language = submission.language;
        let concurrency = self.settings.max_concurrency.max(1);
        let batch_timeout = self.settings.batch_timeout(requests.len());

        debug!(
            concurrency,
            batch_timeout_ms = batch_timeout.as_millis() as u64,
            passthrough = harness.is_passthrough(),
            "Dispatching test cases"
        );

        // Index-addressed slots, each written exactly once
        let mut slots: Vec<Option<ExecutionResult>> = vec![None; requests.len()];

        let requests_ref = &requests;
        let in_flight = stream::iter(0..requests.len())
            .map(move |index| async move {
                (index, self.run_case(index, &requests_ref[index], language).await)
            })
            .buffer_unordered(concurrency);
        tokio::pin!(in_flight);

        let ceiling = sleep_until(Instant::now() + batch_timeout);
        tokio::pin!(ceiling);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    let pending = slots.iter().filter(|slot| slot.is_none()).count();
                    warn!(pending, "Dispatch cancelled, abandoning in-flight cases");
                    return Err(EvaluationError::Cancelled);
                }

                _ = &mut ceiling => {
                    let pending = slots.iter().filter(|slot| slot.is_none()).count();
                    warn!(
                        pending,
                        batch_timeout_ms = batch_timeout.as_millis() as u64,
                        "Batch ceiling reached, resolving pending cases as timeouts"
                    );
                    break;
                }

                next = in_flight.next() => match next {
                    Some((index, result)) => {
                        debug_assert!(slots[index].is_none(), "slot {} written twice", index);
                        slots[index] = Some(result);
                    }
                    None => break,
                },
            }
        }

        let results: Vec<ExecutionResult> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    ExecutionResult::deadline_exceeded(format!(
                        "Batch did not finish within {} ms",
                        batch_timeout.as_millis()
                    ))
                })
            })
            .collect();

        info!(
            completed = results.iter().filter(|r| r.status.is_completed_run()).count(),
            "Dispatch finished"
        );

        Ok(results)
    }

    /// One case under its own wall-clock ceiling, retries included
    async fn run_case(
        &self,
        index: usize,
        request: &ExecutionRequest,
        language: Language,
    ) -> ExecutionResult {
        let deadline = Instant::now() + self.settings.case_timeout();
        let mut retries_left = self.settings.unreachable_retries;

        loop {
            match timeout_at(deadline, self.engine.execute(request, language)).await {
                Err(_) => {
                    warn!(
                        case = index,
                        case_timeout_ms = self.settings.case_timeout_ms,
                        "Case exceeded its wall-clock ceiling"
                    );
                    return ExecutionResult::deadline_exceeded(format!(
                        "No engine verdict within {} ms",
                        self.settings.case_timeout_ms
                    ));
                }
                Ok(result)
                    if result.status == EngineStatus::EngineUnreachable
                        && retries_left > 0
                        && Instant::now() < deadline =>
                {
                    retries_left -= 1;
                    warn!(
                        case = index,
                        retries_left,
                        reason = result.stderr.as_deref().unwrap_or(""),
                        "Engine unreachable, retrying"
                    );
                }
                Ok(result) => {
                    debug!(case = index, status = ?result.status, "Case finished");
                    return result;
                }
            }
        }
    }
}
