use crate::types::{SubmissionJob, VerdictRecord};
use redis::{AsyncCommands, RedisResult};

/// Redis queue semantics - defines only semantics, not runtime logic
/// Ensures API and worker never drift and Redis keys are deterministic

pub const QUEUE_KEY: &str = "arbiter:queue:submissions";
pub const RESULT_PREFIX: &str = "arbiter:result";

/// Stored verdicts expire after 24 hours
pub const RESULT_TTL_SECONDS: u64 = 86_400;

/// Generate result key for a submission
pub fn result_key(submission_id: &uuid::Uuid) -> String {
    format!("{}:{}", RESULT_PREFIX, submission_id)
}

fn serialization_error(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((
        redis::ErrorKind::TypeError,
        "serialization error",
        e.to_string(),
    ))
}

/// Push a job to the submission queue
/// Uses RPUSH for FIFO semantics
pub async fn push_job(
    conn: &mut redis::aio::ConnectionManager,
    job: &SubmissionJob,
) -> RedisResult<()> {
    let payload = serde_json::to_string(job).map_err(serialization_error)?;
    conn.rpush(QUEUE_KEY, payload).await
}

/// Put a job back at the head of the queue (interrupted evaluation)
pub async fn requeue_job(
    conn: &mut redis::aio::ConnectionManager,
    job: &SubmissionJob,
) -> RedisResult<()> {
    let payload = serde_json::to_string(job).map_err(serialization_error)?;
    conn.lpush(QUEUE_KEY, payload).await
}

/// Pop a job from the submission queue
/// Uses BLPOP with timeout for graceful shutdown
pub async fn pop_job(
    conn: &mut redis::aio::ConnectionManager,
    timeout_seconds: f64,
) -> RedisResult<Option<SubmissionJob>> {
    let result: Option<(String, String)> = conn.blpop(QUEUE_KEY, timeout_seconds).await?;

    match result {
        Some((_key, payload)) => {
            let job: SubmissionJob = serde_json::from_str(&payload).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "deserialization error",
                    e.to_string(),
                ))
            })?;
            Ok(Some(job))
        }
        None => Ok(None),
    }
}

/// Store a verdict record with the standard TTL
pub async fn store_record(
    conn: &mut redis::aio::ConnectionManager,
    record: &VerdictRecord,
) -> RedisResult<()> {
    let key = result_key(&record.submission_id);
    let payload = serde_json::to_string(record).map_err(serialization_error)?;
    conn.set_ex(&key, payload, RESULT_TTL_SECONDS).await
}

/// Retrieve a verdict record, `None` while the submission is pending
pub async fn get_record(
    conn: &mut redis::aio::ConnectionManager,
    submission_id: &uuid::Uuid,
) -> RedisResult<Option<VerdictRecord>> {
    let key = result_key(submission_id);
    let payload: Option<String> = conn.get(&key).await?;

    match payload {
        Some(data) => {
            let record: VerdictRecord = serde_json::from_str(&data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "deserialization error",
                    e.to_string(),
                ))
            })?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
