use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strongly-typed language enum
/// Every variant maps to exactly one external engine id (see `engine_id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
    C,
    Go,
}

impl Language {
    /// Returns all language variants
    /// This is the single source of truth for available languages
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::Cpp,
            Language::C,
            Language::Go,
        ]
    }

    /// Parse a language from string (case-insensitive, common aliases accepted)
    pub fn from_str(s: &str) -> Option<Language> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Some(Language::Python),
            "javascript" | "js" | "node" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "cpp" | "c++" => Some(Language::Cpp),
            "c" => Some(Language::C),
            "go" | "golang" => Some(Language::Go),
            _ => None,
        }
    }

    /// Judge0 CE language id.
    ///
    /// The match is exhaustive on purpose: adding a language without an
    /// engine id is a compile error.
    pub fn engine_id(&self) -> u32 {
        match self {
            Language::Python => 71,
            Language::JavaScript => 63,
            Language::Java => 62,
            Language::Cpp => 54,
            Language::C => 50,
            Language::Go => 60,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Java => write!(f, "java"),
            Language::Cpp => write!(f, "cpp"),
            Language::C => write!(f, "c"),
            Language::Go => write!(f, "go"),
        }
    }
}

/// Test Case Definition (Immutable Input)
/// Owned by the problem store, read-only to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_sample: bool,
}

/// A problem as served by the problem store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Function or method the harness must call
    pub entry_point: String,
    pub test_cases: Vec<TestCase>,
}

/// Which test cases a submission is evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Sample cases only (interactive "Run")
    Run,
    /// Every case of the problem
    #[default]
    Submit,
}

/// Submission (transient, never persisted by the pipeline)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub source_code: String,
    pub language: Language,
    pub problem_ref: String,
}

/// Queue payload consumed by the worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionJob {
    pub id: Uuid,
    pub submission: Submission,
    #[serde(default)]
    pub mode: RunMode,
}

/// One harness-wrapped program plus its stdin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub program: String,
    pub stdin: String,
}

/// Runtime error flavours reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeErrorKind {
    Sigsegv,
    Sigxfsz,
    Sigfpe,
    Sigabrt,
    Nzec,
    Other,
}

/// Engine status taxonomy
///
/// Mirrors the Judge0 status ids 1-14 and adds two local sentinels that
/// never come from the engine: `EngineUnreachable` (transport failure,
/// non-2xx, malformed body) and `DeadlineExceeded` (a local wall-clock
/// ceiling expired before the engine answered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeError(RuntimeErrorKind),
    InternalError,
    ExecFormatError,
    EngineUnreachable,
    DeadlineExceeded,
}

impl EngineStatus {
    pub fn from_judge0_id(id: u32) -> Option<EngineStatus> {
        let status = match id {
            1 => EngineStatus::InQueue,
            2 => EngineStatus::Processing,
            3 => EngineStatus::Accepted,
            4 => EngineStatus::WrongAnswer,
            5 => EngineStatus::TimeLimitExceeded,
            6 => EngineStatus::CompilationError,
            7 => EngineStatus::RuntimeError(RuntimeErrorKind::Sigsegv),
            8 => EngineStatus::RuntimeError(RuntimeErrorKind::Sigxfsz),
            9 => EngineStatus::RuntimeError(RuntimeErrorKind::Sigfpe),
            10 => EngineStatus::RuntimeError(RuntimeErrorKind::Sigabrt),
            11 => EngineStatus::RuntimeError(RuntimeErrorKind::Nzec),
            12 => EngineStatus::RuntimeError(RuntimeErrorKind::Other),
            13 => EngineStatus::InternalError,
            14 => EngineStatus::ExecFormatError,
            _ => return None,
        };
        Some(status)
    }

    /// Judge0 id, `None` for the local sentinels
    pub fn judge0_id(&self) -> Option<u32> {
        let id = match self {
            EngineStatus::InQueue => 1,
            EngineStatus::Processing => 2,
            EngineStatus::Accepted => 3,
            EngineStatus::WrongAnswer => 4,
            EngineStatus::TimeLimitExceeded => 5,
            EngineStatus::CompilationError => 6,
            EngineStatus::RuntimeError(RuntimeErrorKind::Sigsegv) => 7,
            EngineStatus::RuntimeError(RuntimeErrorKind::Sigxfsz) => 8,
            EngineStatus::RuntimeError(RuntimeErrorKind::Sigfpe) => 9,
            EngineStatus::RuntimeError(RuntimeErrorKind::Sigabrt) => 10,
            EngineStatus::RuntimeError(RuntimeErrorKind::Nzec) => 11,
            EngineStatus::RuntimeError(RuntimeErrorKind::Other) => 12,
            EngineStatus::InternalError => 13,
            EngineStatus::ExecFormatError => 14,
            EngineStatus::EngineUnreachable | EngineStatus::DeadlineExceeded => return None,
        };
        Some(id)
    }

    /// Still queued or running on the engine side
    pub fn is_pending(&self) -> bool {
        matches!(self, EngineStatus::InQueue | EngineStatus::Processing)
    }

    pub fn is_compile_failure(&self) -> bool {
        matches!(self, EngineStatus::CompilationError)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            EngineStatus::TimeLimitExceeded | EngineStatus::DeadlineExceeded
        )
    }

    /// The program ran to completion; stdout is meaningful.
    /// `WrongAnswer` only appears when the engine was given an expected
    /// output, the comparison is still ours.
    pub fn is_completed_run(&self) -> bool {
        matches!(self, EngineStatus::Accepted | EngineStatus::WrongAnswer)
    }
}

/// Raw engine verdict for one execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    /// Engine-side note such as "Exited with error status 1"
    pub message: Option<String>,
    pub status: EngineStatus,
    pub wall_time_seconds: Option<f64>,
    pub memory_kb: Option<u64>,
}

impl ExecutionResult {
    fn sentinel(status: EngineStatus, reason: impl Into<String>) -> Self {
        Self {
            stdout: None,
            stderr: Some(reason.into()),
            compile_output: None,
            message: None,
            status,
            wall_time_seconds: None,
            memory_kb: None,
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::sentinel(EngineStatus::EngineUnreachable, reason)
    }

    pub fn deadline_exceeded(reason: impl Into<String>) -> Self {
        Self::sentinel(EngineStatus::DeadlineExceeded, reason)
    }

    /// Deterministic rejection before the engine was contacted; never retried
    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::sentinel(EngineStatus::InternalError, reason)
    }
}

/// Per-case classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed,
    RuntimeError,
    CompileError,
    Timeout,
}

/// Classified outcome of one test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub test_case_index: usize,
    pub outcome: CaseOutcome,
    pub actual_output: String,
    pub is_sample: bool,
    /// Only disclosed for sample cases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub engine_status: EngineStatus,
    pub wall_time_seconds: Option<f64>,
    pub memory_kb: Option<u64>,
}

/// Submission-level status, decided by the first non-passing case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Accepted,
    WrongAnswer,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::WrongAnswer => "wrong_answer",
            SubmissionStatus::CompileError => "compile_error",
            SubmissionStatus::RuntimeError => "runtime_error",
            SubmissionStatus::TimeLimitExceeded => "time_limit_exceeded",
        };
        f.write_str(label)
    }
}

/// Pipeline output
///
/// ## Invariants:
/// - `case_verdicts[i].test_case_index == i`
/// - `total_passed` counts `Passed` outcomes
/// - `all_passed == (total_passed == total_cases)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionVerdict {
    pub case_verdicts: Vec<CaseVerdict>,
    pub total_cases: usize,
    pub total_passed: usize,
    pub all_passed: bool,
    pub status: SubmissionStatus,
}

/// Top-level rejection carried to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Stored outcome of a queued submission
/// Written by the worker, read by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub submission_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<SubmissionVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub completed_at: DateTime<Utc>,
}

impl VerdictRecord {
    pub fn completed(submission_id: Uuid, verdict: SubmissionVerdict) -> Self {
        Self {
            submission_id,
            verdict: Some(verdict),
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn rejected(submission_id: Uuid, code: &str, message: impl Into<String>) -> Self {
        Self {
            submission_id,
            verdict: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serialization() {
        let json = serde_json::to_string(&Language::JavaScript).unwrap();
        assert_eq!(json, "\"javascript\"");

        let deserialized: Language = serde_json::from_str("\"cpp\"").unwrap();
        assert_eq!(deserialized, Language::Cpp);
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!(Language::from_str("Python"), Some(Language::Python));
        assert_eq!(Language::from_str("js"), Some(Language::JavaScript));
        assert_eq!(Language::from_str("C++"), Some(Language::Cpp));
        assert_eq!(Language::from_str(" java "), Some(Language::Java));
        assert_eq!(Language::from_str("cobol"), None);
        assert_eq!(Language::from_str(""), None);
    }

    #[test]
    fn test_engine_ids_are_unique() {
        let mut ids: Vec<u32> = Language::all_variants()
            .iter()
            .map(|l| l.engine_id())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Language::all_variants().len());
    }

    #[test]
    fn test_engine_status_judge0_mapping() {
        for id in 1..=14 {
            let status = EngineStatus::from_judge0_id(id).unwrap();
            assert_eq!(status.judge0_id(), Some(id));
        }
        assert_eq!(EngineStatus::from_judge0_id(0), None);
        assert_eq!(EngineStatus::from_judge0_id(15), None);
    }

    #[test]
    fn test_sentinels_have_no_engine_id() {
        assert_eq!(EngineStatus::EngineUnreachable.judge0_id(), None);
        assert_eq!(EngineStatus::DeadlineExceeded.judge0_id(), None);
        assert!(EngineStatus::DeadlineExceeded.is_timeout());
        assert!(!EngineStatus::EngineUnreachable.is_completed_run());
    }

    #[test]
    fn test_engine_status_serialization() {
        let json = serde_json::to_string(&EngineStatus::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"time_limit_exceeded\"");

        let json =
            serde_json::to_string(&EngineStatus::RuntimeError(RuntimeErrorKind::Nzec)).unwrap();
        assert_eq!(json, "{\"runtime_error\":\"nzec\"}");
    }

    #[test]
    fn test_submission_job_defaults_to_submit_mode() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "submission": {"source_code": "x", "language": "python", "problem_ref": "two-sum"}
        }"#;
        let job: SubmissionJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.mode, RunMode::Submit);
        assert_eq!(job.submission.language, Language::Python);
    }

    #[test]
    fn test_rejected_record_omits_verdict() {
        let record = VerdictRecord::rejected(Uuid::new_v4(), "NO_TEST_CASES", "empty");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("verdict").is_none());
        assert_eq!(json["error"]["code"], "NO_TEST_CASES");
    }
}
