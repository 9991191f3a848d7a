/// Execution Client - Adapter for the External Execution Engine
///
/// **Core Responsibility:**
/// Send one generated program plus stdin to the sandboxed engine and
/// return its raw verdict.
///
/// **Critical Architectural Boundary:**
/// - Knows HOW to talk to the engine (Judge0 REST API)
/// - Does NOT retry and does NOT enforce the per-case ceiling (dispatcher's job)
/// - Does NOT evaluate correctness
/// - Never fails: transport errors, non-2xx answers and malformed bodies
///   all come back as an `EngineUnreachable` result
/// - Oversized payloads never leave the process: `InternalError`
use arbiter_common::{
    EngineMode, EngineSettings, EngineStatus, ExecutionRequest, ExecutionResult, Language,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, warn};

/// Safety limits to keep pathological inputs away from the engine
const MAX_SOURCE_CODE_BYTES: usize = 1024 * 1024; // 1MB
const MAX_STDIN_BYTES: usize = 10 * 1024 * 1024; // 10MB

const RESULT_FIELDS: &str = "stdout,stderr,compile_output,message,status,time,memory";

/// Execution engine trait
///
/// Any implementation must guarantee:
/// 1. One call produces exactly one result
/// 2. Failures are reported as results, never as panics or errors
/// 3. The call is cancel-safe (dropping the future abandons the wait)
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest, language: Language) -> ExecutionResult;
}

#[derive(Debug, thiserror::Error)]
enum EngineError {
    #[error("engine request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("engine answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed engine response: {0}")]
    Malformed(String),

    #[error("engine still processing after {0} polls")]
    PollExhausted(u32),
}

#[derive(Debug, Serialize)]
struct Judge0Submission<'a> {
    source_code: Cow<'a, str>,
    language_id: u32,
    stdin: Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct Judge0Status {
    id: u32,
    #[serde(default)]
    description: String,
}

/// Judge0 reports `time` as a decimal string ("0.002"), accept numbers too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Text(String),
    Number(f64),
}

impl Seconds {
    fn value(&self) -> Option<f64> {
        match self {
            Seconds::Text(text) => text.trim().parse().ok(),
            Seconds::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Judge0Response {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    message: Option<String>,
    status: Option<Judge0Status>,
    time: Option<Seconds>,
    memory: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Judge0Token {
    token: String,
}

fn decode_field(field: Option<String>, base64_encoded: bool) -> Result<Option<String>, EngineError> {
    match field {
        Some(text) if base64_encoded => {
            // Judge0 wraps base64 output at 60 columns
            let compact: String = text.split_whitespace().collect();
            let bytes = general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| EngineError::Malformed(format!("invalid base64 field: {}", e)))?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        other => Ok(other),
    }
}

impl Judge0Response {
    fn into_result(self, base64_encoded: bool) -> Result<ExecutionResult, EngineError> {
        let status = self
            .status
            .ok_or_else(|| EngineError::Malformed("missing status".to_string()))?;
        let engine_status = EngineStatus::from_judge0_id(status.id).ok_or_else(|| {
            EngineError::Malformed(format!(
                "unknown status id {} ({})",
                status.id, status.description
            ))
        })?;

        Ok(ExecutionResult {
            stdout: decode_field(self.stdout, base64_encoded)?,
            stderr: decode_field(self.stderr, base64_encoded)?,
            compile_output: decode_field(self.compile_output, base64_encoded)?,
            message: decode_field(self.message, base64_encoded)?,
            status: engine_status,
            wall_time_seconds: self.time.as_ref().and_then(Seconds::value),
            memory_kb: self.memory,
        })
    }
}

/// Judge0-backed execution engine
pub struct Judge0Engine {
    client: reqwest::Client,
    settings: EngineSettings,
}

impl Judge0Engine {
    pub fn new(settings: EngineSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn submissions_url(&self) -> String {
        format!("{}/submissions", self.settings.base_url.trim_end_matches('/'))
    }

    fn base64_flag(&self) -> &'static str {
        if self.settings.base64_encoded {
            "true"
        } else {
            "false"
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.auth_token {
            Some(token) => builder.header(self.settings.auth_header.as_str(), token.as_str()),
            None => builder,
        }
    }

    fn payload<'a>(&self, request: &'a ExecutionRequest, language: Language) -> Judge0Submission<'a> {
        if self.settings.base64_encoded {
            Judge0Submission {
                source_code: Cow::Owned(general_purpose::STANDARD.encode(&request.program)),
                language_id: language.engine_id(),
                stdin: Cow::Owned(general_purpose::STANDARD.encode(&request.stdin)),
            }
        } else {
            Judge0Submission {
                source_code: Cow::Borrowed(&request.program),
                language_id: language.engine_id(),
                stdin: Cow::Borrowed(&request.stdin),
            }
        }
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| EngineError::Malformed(e.to_string()))
    }

    /// `wait=true`: the engine holds the request until the run finishes
    async fn submit_and_wait(
        &self,
        request: &ExecutionRequest,
        language: Language,
    ) -> Result<ExecutionResult, EngineError> {
        let builder = self
            .client
            .post(self.submissions_url())
            .query(&[
                ("base64_encoded", self.base64_flag()),
                ("wait", "true"),
                ("fields", RESULT_FIELDS),
            ])
            .json(&self.payload(request, language));

        let response = self.authorize(builder).send().await?;
        let body: Judge0Response = Self::read_json(response).await?;
        body.into_result(self.settings.base64_encoded)
    }

    /// Submit, then poll the token with bounded attempts
    async fn submit_and_poll(
        &self,
        request: &ExecutionRequest,
        language: Language,
    ) -> Result<ExecutionResult, EngineError> {
        let builder = self
            .client
            .post(self.submissions_url())
            .query(&[("base64_encoded", self.base64_flag()), ("wait", "false")])
            .json(&self.payload(request, language));

        let response = self.authorize(builder).send().await?;
        let Judge0Token { token } = Self::read_json(response).await?;
        debug!(token = %token, "Submission accepted by engine");

        let poll_url = format!("{}/{}", self.submissions_url(), token);
        let interval = Duration::from_millis(self.settings.poll_interval_ms);

        for attempt in 1..=self.settings.max_poll_attempts {
            tokio::time::sleep(interval).await;

            let builder = self.client.get(&poll_url).query(&[
                ("base64_encoded", self.base64_flag()),
                ("fields", RESULT_FIELDS),
            ]);
            let response = self.authorize(builder).send().await?;
            let body: Judge0Response = Self::read_json(response).await?;
            let result = body.into_result(self.settings.base64_encoded)?;

            if !result.status.is_pending() {
                return Ok(result);
            }
            debug!(token = %token, attempt, "Engine still processing");
        }

        Err(EngineError::PollExhausted(self.settings.max_poll_attempts))
    }
}

#[async_trait]
impl ExecutionEngine for Judge0Engine {
    async fn execute(&self, request: &ExecutionRequest, language: Language) -> ExecutionResult {
        // GUARDRAIL: reject oversized payloads locally
        if request.program.len() > MAX_SOURCE_CODE_BYTES {
            return ExecutionResult::internal_error(format!(
                "Program exceeds maximum size of {} bytes",
                MAX_SOURCE_CODE_BYTES
            ));
        }
        if request.stdin.len() > MAX_STDIN_BYTES {
            return ExecutionResult::internal_error(format!(
                "Input exceeds maximum size of {} bytes",
                MAX_STDIN_BYTES
            ));
        }

        let outcome = match self.settings.mode {
            EngineMode::Wait => self.submit_and_wait(request, language).await,
            EngineMode::Poll => self.submit_and_poll(request, language).await,
        };

        match outcome {
            Ok(result) => result,
            Err(EngineError::PollExhausted(polls)) => {
                warn!(language = %language, polls, "Engine did not finish within poll budget");
                ExecutionResult::deadline_exceeded(format!(
                    "Engine did not finish after {} polls",
                    polls
                ))
            }
            Err(e) => {
                warn!(language = %language, error = %e, "Engine call failed");
                ExecutionResult::unreachable(e.to_string())
            }
        }
    }
}
