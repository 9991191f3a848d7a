/// Verdict Aggregator - Language-Agnostic Classification
///
/// **Core Responsibility:**
/// Turn (TestCase, ExecutionResult) pairs into a `SubmissionVerdict`.
///
/// **Critical Properties:**
/// - Knows nothing about the engine transport
/// - Knows nothing about language harnesses
/// - Pure function: (test cases, raw results) → verdict
///
/// **Classification Order (per case):**
/// 1. Compile failure → CompileError
/// 2. Timeout (engine TLE or local deadline) → Timeout
/// 3. Any other non-completed run (runtime error, engine unreachable,
///    internal engine error) → RuntimeError
/// 4. Completed run → compare trimmed stdout with trimmed expected output
///
/// **Normalization Rules:**
/// - Trim leading and trailing whitespace: YES
/// - Case sensitivity: YES (exact match required)
/// - Floating-point tolerance: NO
use crate::error::EvaluationError;
use arbiter_common::{
    CaseOutcome, CaseVerdict, ExecutionResult, SubmissionStatus, SubmissionVerdict, TestCase,
};
use tracing::{debug, error};

/// Shown when a case produced nothing on any channel
pub const NO_OUTPUT_PLACEHOLDER: &str = "No output";

fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Classify a single raw result against its test case
pub fn classify(result: &ExecutionResult, test_case: &TestCase) -> CaseOutcome {
    if result.status.is_compile_failure() {
        CaseOutcome::CompileError
    } else if result.status.is_timeout() {
        CaseOutcome::Timeout
    } else if !result.status.is_completed_run() {
        CaseOutcome::RuntimeError
    } else {
        let actual = normalize_output(result.stdout.as_deref().unwrap_or(""));
        let expected = normalize_output(&test_case.expected_output);

        if actual == expected {
            CaseOutcome::Passed
        } else {
            CaseOutcome::Failed
        }
    }
}

/// Best available signal: stdout, then stderr, then compiler output
pub fn actual_output(result: &ExecutionResult) -> String {
    let stdout = result.stdout.as_deref().map(normalize_output);

    [
        stdout,
        result.stderr.as_deref(),
        result.compile_output.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|text| !text.trim().is_empty())
    .unwrap_or(NO_OUTPUT_PLACEHOLDER)
    .to_string()
}

/// Evaluate one case
pub fn evaluate_case(index: usize, test_case: &TestCase, result: &ExecutionResult) -> CaseVerdict {
    CaseVerdict {
        test_case_index: index,
        outcome: classify(result, test_case),
        actual_output: actual_output(result),
        is_sample: test_case.is_sample,
        expected_output: test_case
            .is_sample
            .then(|| test_case.expected_output.clone()),
        engine_status: result.status,
        wall_time_seconds: result.wall_time_seconds,
        memory_kb: result.memory_kb,
    }
}

fn submission_status(case_verdicts: &[CaseVerdict]) -> SubmissionStatus {
    case_verdicts
        .iter()
        .find_map(|verdict| match verdict.outcome {
            CaseOutcome::Passed => None,
            CaseOutcome::Failed => Some(SubmissionStatus::WrongAnswer),
            CaseOutcome::RuntimeError => Some(SubmissionStatus::RuntimeError),
            CaseOutcome::CompileError => Some(SubmissionStatus::CompileError),
            CaseOutcome::Timeout => Some(SubmissionStatus::TimeLimitExceeded),
        })
        .unwrap_or(SubmissionStatus::Accepted)
}

/// Aggregate index-aligned results into the final verdict
///
/// A length mismatch means the dispatcher lost or duplicated a slot. That
/// is a defect: it panics in debug builds and is reported as an internal
/// error otherwise, never guessed into a verdict.
pub fn aggregate(
    test_cases: &[TestCase],
    results: &[ExecutionResult],
) -> Result<SubmissionVerdict, EvaluationError> {
    if test_cases.len() != results.len() {
        error!(
            cases = test_cases.len(),
            results = results.len(),
            "Result count does not match test case count"
        );
        debug_assert!(
            false,
            "dispatcher returned {} results for {} test cases",
            results.len(),
            test_cases.len()
        );
        return Err(EvaluationError::Internal(format!(
            "expected {} results, got {}",
            test_cases.len(),
            results.len()
        )));
    }

    let case_verdicts: Vec<CaseVerdict> = test_cases
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (test_case, result))| evaluate_case(index, test_case, result))
        .collect();

    for verdict in &case_verdicts {
        debug!(
            case = verdict.test_case_index,
            outcome = ?verdict.outcome,
            engine_status = ?verdict.engine_status,
            "Case evaluated"
        );
    }

    let total_cases = case_verdicts.len();
    let total_passed = case_verdicts
        .iter()
        .filter(|verdict| verdict.outcome == CaseOutcome::Passed)
        .count();
    let status = submission_status(&case_verdicts);

    Ok(SubmissionVerdict {
        case_verdicts,
        total_cases,
        total_passed,
        all_passed: total_passed == total_cases,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accepted, compile_error, runtime_error, with_status};
    use arbiter_common::EngineStatus;

    /// Helper to create a test case
    fn make_test_case(expected_output: &str, is_sample: bool) -> TestCase {
        TestCase {
            input: "input".to_string(),
            expected_output: expected_output.to_string(),
            is_sample,
        }
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("hello"), "hello");
        assert_eq!(normalize_output("  hello  "), "hello");
        assert_eq!(normalize_output("\nhello\r\n"), "hello");
        assert_eq!(normalize_output("  hello world  \n"), "hello world");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_classify_trailing_newline_passes() {
        let test_case = make_test_case("4", false);
        assert_eq!(classify(&accepted("4\n"), &test_case), CaseOutcome::Passed);
    }

    #[test]
    fn test_classify_is_byte_exact_after_trim() {
        let test_case = make_test_case("4", false);
        assert_eq!(classify(&accepted("04"), &test_case), CaseOutcome::Failed);
        assert_eq!(classify(&accepted("4.0"), &test_case), CaseOutcome::Failed);

        let test_case = make_test_case("[1,2]", false);
        assert_eq!(classify(&accepted("[1, 2]"), &test_case), CaseOutcome::Failed);
    }

    #[test]
    fn test_classify_empty_stdout_against_empty_expected() {
        let test_case = make_test_case("", false);
        let mut result = accepted("");
        result.stdout = None;
        assert_eq!(classify(&result, &test_case), CaseOutcome::Passed);
    }

    #[test]
    fn test_classify_compile_error_takes_priority() {
        let test_case = make_test_case("4", false);
        let mut result = compile_error("SyntaxError: invalid syntax");
        result.stdout = Some("4".to_string());
        assert_eq!(classify(&result, &test_case), CaseOutcome::CompileError);
    }

    #[test]
    fn test_classify_timeouts() {
        let test_case = make_test_case("4", false);
        assert_eq!(
            classify(&with_status(EngineStatus::TimeLimitExceeded), &test_case),
            CaseOutcome::Timeout
        );
        assert_eq!(
            classify(&ExecutionResult::deadline_exceeded("slow"), &test_case),
            CaseOutcome::Timeout
        );
    }

    #[test]
    fn test_classify_non_completed_runs_are_runtime_errors() {
        let test_case = make_test_case("4", false);
        for result in [
            runtime_error("ZeroDivisionError"),
            ExecutionResult::unreachable("connection refused"),
            with_status(EngineStatus::InternalError),
            with_status(EngineStatus::ExecFormatError),
        ] {
            assert_eq!(classify(&result, &test_case), CaseOutcome::RuntimeError);
        }
    }

    #[test]
    fn test_actual_output_priority() {
        assert_eq!(actual_output(&accepted("  42 \n")), "42");
        assert_eq!(
            actual_output(&runtime_error("Traceback: boom")),
            "Traceback: boom"
        );
        assert_eq!(
            actual_output(&compile_error("error: expected ';'")),
            "error: expected ';'"
        );

        let mut blank = accepted("  \n");
        blank.stderr = Some(String::new());
        assert_eq!(actual_output(&blank), NO_OUTPUT_PLACEHOLDER);
    }

    #[test]
    fn test_unreachable_surfaces_reason() {
        let test_case = make_test_case("4", false);
        let verdict = evaluate_case(0, &test_case, &ExecutionResult::unreachable("engine down"));

        assert_eq!(verdict.outcome, CaseOutcome::RuntimeError);
        assert_eq!(verdict.actual_output, "engine down");
        assert_eq!(verdict.engine_status, EngineStatus::EngineUnreachable);
    }

    #[test]
    fn test_unreachable_case_counts_toward_total_only() {
        let test_cases = vec![make_test_case("4", true), make_test_case("9", false)];
        let results = vec![accepted("4"), ExecutionResult::unreachable("engine down")];

        let verdict = aggregate(&test_cases, &results).unwrap();

        assert_eq!(verdict.total_cases, 2);
        assert_eq!(verdict.total_passed, 1);
        assert!(!verdict.all_passed);
        assert_eq!(verdict.status, SubmissionStatus::RuntimeError);
        assert_eq!(verdict.case_verdicts[1].outcome, CaseOutcome::RuntimeError);
        assert_eq!(verdict.case_verdicts[1].actual_output, "engine down");
    }

    #[test]
    fn test_expected_output_only_disclosed_for_samples() {
        let sample = evaluate_case(0, &make_test_case("4", true), &accepted("4"));
        let hidden = evaluate_case(1, &make_test_case("5", false), &accepted("4"));

        assert_eq!(sample.expected_output.as_deref(), Some("4"));
        assert!(hidden.expected_output.is_none());
    }

    #[test]
    fn test_aggregate_middle_case_throws() {
        let test_cases = vec![
            make_test_case("1", true),
            make_test_case("2", false),
            make_test_case("3", false),
        ];
        let results = vec![
            accepted("1\n"),
            runtime_error("Exception: bad input"),
            accepted("3"),
        ];

        let verdict = aggregate(&test_cases, &results).unwrap();

        assert_eq!(verdict.total_cases, 3);
        assert_eq!(verdict.total_passed, 2);
        assert!(!verdict.all_passed);
        assert_eq!(verdict.status, SubmissionStatus::RuntimeError);
        assert_eq!(verdict.case_verdicts[1].outcome, CaseOutcome::RuntimeError);
        for (i, case_verdict) in verdict.case_verdicts.iter().enumerate() {
            assert_eq!(case_verdict.test_case_index, i);
        }
    }

    #[test]
    fn test_aggregate_all_passed() {
        let test_cases = vec![make_test_case("a", false), make_test_case("b", false)];
        let results = vec![accepted("a"), accepted("b")];

        let verdict = aggregate(&test_cases, &results).unwrap();

        assert!(verdict.all_passed);
        assert_eq!(verdict.status, SubmissionStatus::Accepted);
    }

    #[test]
    fn test_status_follows_first_failing_case() {
        let test_cases = vec![
            make_test_case("a", false),
            make_test_case("b", false),
            make_test_case("c", false),
        ];
        let results = vec![
            accepted("a"),
            ExecutionResult::deadline_exceeded("slow"),
            accepted("wrong"),
        ];

        let verdict = aggregate(&test_cases, &results).unwrap();

        assert_eq!(verdict.status, SubmissionStatus::TimeLimitExceeded);
        assert_eq!(verdict.total_passed, 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dispatcher returned")]
    fn test_aggregate_length_mismatch_fails_loudly() {
        let test_cases = vec![make_test_case("a", false), make_test_case("b", false)];
        let results = vec![accepted("a")];
        let _ = aggregate(&test_cases, &results);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_aggregate_length_mismatch_is_internal_error() {
        let test_cases = vec![make_test_case("a", false), make_test_case("b", false)];
        let results = vec![accepted("a")];
        assert!(matches!(
            aggregate(&test_cases, &results),
            Err(EvaluationError::Internal(_))
        ));
    }
}
