pub mod config;
pub mod redis;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{Config, DispatchSettings, EngineMode, EngineSettings};
pub use types::{
    CaseOutcome, CaseVerdict, EngineStatus, ErrorBody, ExecutionRequest, ExecutionResult,
    Language, Problem, RunMode, RuntimeErrorKind, Submission, SubmissionJob, SubmissionStatus,
    SubmissionVerdict, TestCase, VerdictRecord,
};
