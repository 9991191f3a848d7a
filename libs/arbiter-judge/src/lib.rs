//! Submission evaluation pipeline
//!
//! submission → harness (one program per case) → dispatcher (bounded
//! fan-out to the execution engine) → evaluator (verdict) → consumer

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod harness;
pub mod pipeline;
pub mod problem_store;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use engine::{ExecutionEngine, Judge0Engine};
pub use error::EvaluationError;
pub use pipeline::evaluate_submission;
pub use problem_store::{JsonProblemStore, ProblemStore, StoreError};

use arbiter_common::Language;

/// Parse a user-supplied language name into a supported language
pub fn parse_language(name: &str) -> Result<Language, EvaluationError> {
    if name.trim().is_empty() {
        return Err(EvaluationError::MissingLanguage);
    }
    Language::from_str(name).ok_or_else(|| EvaluationError::UnsupportedLanguage(name.to_string()))
}
