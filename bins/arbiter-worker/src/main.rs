use anyhow::Context;
use arbiter_common::redis;
use arbiter_common::{Config, SubmissionVerdict, VerdictRecord};
use arbiter_judge::{evaluate_submission, Dispatcher, EvaluationError, JsonProblemStore, Judge0Engine};
use std::path::Path;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Arbiter Worker booting...");

    let config = Config::from_env();

    let store = JsonProblemStore::load_from_file(Path::new(&config.problems_path))
        .map_err(|e| {
            error!("Failed to load problems: {}", e);
            error!("Make sure {} exists", config.problems_path);
            e
        })?;
    info!("Loaded problems: {:?}", store.ids());

    let engine = Judge0Engine::new(config.engine.clone()).context("Failed to build engine client")?;
    let dispatcher = Dispatcher::new(engine, config.dispatch.clone());
    info!(
        engine_url = %config.engine.base_url,
        mode = ?config.engine.mode,
        max_concurrency = config.dispatch.max_concurrency,
        case_timeout_ms = config.dispatch.case_timeout_ms,
        "Execution engine configured"
    );

    let client = ::redis::Client::open(config.redis_url.as_str())?;
    let mut redis_conn = ::redis::aio::ConnectionManager::new(client).await?;

    info!("Connected to Redis: {}", config.redis_url);
    info!("Queue: {}", redis::QUEUE_KEY);

    // Setup graceful shutdown
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install CTRL+C signal handler");
            return;
        }
        warn!("Received shutdown signal, cancelling current evaluation...");
        trigger.cancel();
    });

    worker_loop(&mut redis_conn, &store, &dispatcher, &shutdown).await?;

    info!("Worker shutdown complete");
    Ok(())
}

/// Record persisted for a finished evaluation, `None` when it was interrupted
fn record_for(
    submission_id: Uuid,
    outcome: &Result<SubmissionVerdict, EvaluationError>,
) -> Option<VerdictRecord> {
    match outcome {
        Ok(verdict) => Some(VerdictRecord::completed(submission_id, verdict.clone())),
        Err(EvaluationError::Cancelled) => None,
        Err(e) => Some(VerdictRecord::rejected(submission_id, e.code(), e.to_string())),
    }
}

#[instrument(skip_all)]
async fn worker_loop(
    redis_conn: &mut ::redis::aio::ConnectionManager,
    store: &JsonProblemStore,
    dispatcher: &Dispatcher<Judge0Engine>,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    // The pop is never raced against shutdown: dropping a BLPOP that already
    // fired would lose the job. The 5 s timeout bounds shutdown latency.
    while !shutdown.is_cancelled() {
        match redis::pop_job(redis_conn, 5.0).await {
            Ok(Some(job)) => {
                let submission_id = job.id;
                info!(
                    submission_id = %submission_id,
                    problem = %job.submission.problem_ref,
                    language = %job.submission.language,
                    mode = ?job.mode,
                    source_size = job.submission.source_code.len(),
                    "Received submission"
                );

                let start = std::time::Instant::now();
                let outcome = evaluate_submission(
                    store,
                    dispatcher,
                    &job.submission,
                    job.mode,
                    shutdown,
                )
                .await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match &outcome {
                    Ok(verdict) => {
                        info!(
                            submission_id = %submission_id,
                            status = %verdict.status,
                            passed = verdict.total_passed,
                            total = verdict.total_cases,
                            elapsed_ms,
                            "Evaluation completed"
                        );
                        for case in &verdict.case_verdicts {
                            debug!(
                                submission_id = %submission_id,
                                case = case.test_case_index,
                                outcome = ?case.outcome,
                                engine_status = ?case.engine_status,
                                "Case verdict"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(submission_id = %submission_id, code = e.code(), error = %e, "Evaluation ended without verdict");
                    }
                }

                let Some(record) = record_for(submission_id, &outcome) else {
                    // Interrupted by shutdown: hand the job to the next worker
                    match redis::requeue_job(redis_conn, &job).await {
                        Ok(()) => info!(submission_id = %submission_id, "Submission requeued"),
                        Err(e) => {
                            error!(submission_id = %submission_id, error = %e, "Failed to requeue submission")
                        }
                    }
                    break;
                };

                // Persist record to Redis
                match redis::store_record(redis_conn, &record).await {
                    Ok(()) => {
                        info!(submission_id = %submission_id, "Verdict persisted to Redis");
                    }
                    Err(e) => {
                        error!(submission_id = %submission_id, error = %e, "Failed to persist verdict");
                        // Non-fatal - worker continues
                    }
                }
            }
            Ok(None) => {
                // Timeout - check for shutdown
                continue;
            }
            Err(e) => {
                error!(error = %e, "Redis error");
                tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_common::SubmissionStatus;

    fn verdict() -> SubmissionVerdict {
        SubmissionVerdict {
            case_verdicts: Vec::new(),
            total_cases: 0,
            total_passed: 0,
            all_passed: true,
            status: SubmissionStatus::Accepted,
        }
    }

    #[test]
    fn test_completed_evaluation_is_recorded() {
        let id = Uuid::new_v4();
        let record = record_for(id, &Ok(verdict())).unwrap();

        assert_eq!(record.submission_id, id);
        assert!(record.verdict.is_some());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_rejection_is_recorded_with_code() {
        let id = Uuid::new_v4();
        let record =
            record_for(id, &Err(EvaluationError::ProblemNotFound("two-sum".into()))).unwrap();

        let error = record.error.unwrap();
        assert_eq!(error.code, "PROBLEM_NOT_FOUND");
        assert!(error.message.contains("two-sum"));
        assert!(record.verdict.is_none());
    }

    #[test]
    fn test_cancelled_evaluation_is_not_recorded() {
        assert!(record_for(Uuid::new_v4(), &Err(EvaluationError::Cancelled)).is_none());
    }
}
