use crate::problem_store::StoreError;

/// Submission-level failures
///
/// Per-case execution problems never show up here: they resolve to a
/// `CaseVerdict` outcome. Only input errors (rejected before dispatch),
/// cancellation and pipeline defects surface as an error.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("source code is empty")]
    MissingSource,

    #[error("language is missing")]
    MissingLanguage,

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("problem not found: {0}")]
    ProblemNotFound(String),

    #[error("problem {0} has no test cases to evaluate")]
    NoTestCases(String),

    #[error("problem store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("internal evaluation error: {0}")]
    Internal(String),
}

impl EvaluationError {
    /// Stable reason code exposed to consumers
    pub fn code(&self) -> &'static str {
        match self {
            EvaluationError::MissingSource => "MISSING_SOURCE",
            EvaluationError::MissingLanguage => "MISSING_LANGUAGE",
            EvaluationError::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
            EvaluationError::ProblemNotFound(_) => "PROBLEM_NOT_FOUND",
            EvaluationError::NoTestCases(_) => "NO_TEST_CASES",
            EvaluationError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            EvaluationError::Cancelled => "CANCELLED",
            EvaluationError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Rejected before any dispatch because of what the caller sent
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EvaluationError::MissingSource
                | EvaluationError::MissingLanguage
                | EvaluationError::UnsupportedLanguage(_)
                | EvaluationError::ProblemNotFound(_)
                | EvaluationError::NoTestCases(_)
        )
    }
}

impl From<StoreError> for EvaluationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(problem_ref) => EvaluationError::ProblemNotFound(problem_ref),
            other => EvaluationError::StoreUnavailable(other.to_string()),
        }
    }
}
