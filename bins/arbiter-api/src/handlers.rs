// HTTP route handlers for the Arbiter API

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use arbiter_common::redis;
use arbiter_common::{ErrorBody, RunMode, Submission, SubmissionJob};
use arbiter_judge::{evaluate_submission, parse_language, EvaluationError, ProblemStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::AppState;

/// Body shared by `/run` and `/submissions`
///
/// Fields default to empty so that a missing field is reported with its
/// reason code instead of a generic deserialisation failure.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub problem_ref: String,
    pub mode: Option<RunMode>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub submission_id: Uuid,
}

/// Validate the request shape before touching the store or the engine
fn build_submission(payload: SubmissionRequest) -> Result<Submission, EvaluationError> {
    let language = parse_language(&payload.language)?;
    if payload.source_code.trim().is_empty() {
        return Err(EvaluationError::MissingSource);
    }
    if payload.problem_ref.trim().is_empty() {
        return Err(EvaluationError::ProblemNotFound(String::new()));
    }

    Ok(Submission {
        source_code: payload.source_code,
        language,
        problem_ref: payload.problem_ref.trim().to_string(),
    })
}

fn status_for(err: &EvaluationError) -> StatusCode {
    match err {
        EvaluationError::ProblemNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_input_error() => StatusCode::BAD_REQUEST,
        EvaluationError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &EvaluationError) -> Response {
    let status = status_for(err);
    if err.is_input_error() {
        metrics::record_rejected(err.code());
    }
    (
        status,
        Json(ErrorBody {
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

/// POST /run - Evaluate synchronously and return the verdict
pub async fn run_submission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmissionRequest>,
) -> Response {
    let mode = payload.mode.unwrap_or(RunMode::Run);
    let submission = match build_submission(payload) {
        Ok(submission) => submission,
        Err(e) => {
            warn!(code = e.code(), "Run rejected");
            return error_response(&e);
        }
    };

    // Client disconnect drops this future, the guard then cancels the dispatch
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let started = Instant::now();
    let outcome = evaluate_submission(
        &state.store,
        &state.dispatcher,
        &submission,
        mode,
        &cancel,
    )
    .await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    match outcome {
        Ok(verdict) => {
            metrics::record_evaluation(
                &submission.language.to_string(),
                &verdict.status.to_string(),
                elapsed_ms,
            );
            info!(
                problem = %submission.problem_ref,
                language = %submission.language,
                status = %verdict.status,
                passed = verdict.total_passed,
                total = verdict.total_cases,
                elapsed_ms,
                "Run completed"
            );
            (StatusCode::OK, Json(verdict)).into_response()
        }
        Err(e) => {
            if e.is_input_error() {
                warn!(code = e.code(), error = %e, "Run rejected");
            } else {
                error!(code = e.code(), error = %e, "Run failed");
            }
            error_response(&e)
        }
    }
}

/// POST /submissions - Queue a submission for the worker
pub async fn enqueue_submission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmissionRequest>,
) -> Response {
    let mode = payload.mode.unwrap_or(RunMode::Submit);
    let submission = match build_submission(payload) {
        Ok(submission) => submission,
        Err(e) => {
            warn!(code = e.code(), "Submission rejected");
            return error_response(&e);
        }
    };

    // Unknown problems are rejected here rather than by the worker
    if let Err(e) = state.store.load(&submission.problem_ref).await {
        let e = EvaluationError::from(e);
        warn!(code = e.code(), "Submission rejected");
        return error_response(&e);
    }

    let job = SubmissionJob {
        id: Uuid::new_v4(),
        submission,
        mode,
    };

    let mut conn = state.redis.clone();
    match redis::push_job(&mut conn, &job).await {
        Ok(()) => {
            metrics::record_queued(&job.submission.language.to_string());
            info!(
                submission_id = %job.id,
                problem = %job.submission.problem_ref,
                language = %job.submission.language,
                "Submission queued"
            );
            (
                StatusCode::CREATED,
                Json(EnqueueResponse {
                    submission_id: job.id,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(submission_id = %job.id, error = %e, "Failed to queue submission");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    code: "QUEUE_UNAVAILABLE".to_string(),
                    message: format!("Failed to queue submission: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /submissions/{submission_id} - Stored verdict record
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Response {
    let submission_uuid = match Uuid::parse_str(&submission_id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    code: "INVALID_SUBMISSION_ID".to_string(),
                    message: "Invalid submission ID format".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut conn = state.redis.clone();
    match redis::get_record(&mut conn, &submission_uuid).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "submission_id": submission_id,
                "status": "pending",
                "message": "Submission is queued or still evaluating"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(submission_id = %submission_id, error = %e, "Failed to fetch verdict record");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message: format!("Failed to query submission: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}
