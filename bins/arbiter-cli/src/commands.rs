// CLI commands for Arbiter
use anyhow::{bail, Context, Result};
use arbiter_common::{CaseOutcome, Config, Language, RunMode, Submission, SubmissionVerdict};
use arbiter_judge::{evaluate_submission, harness, parse_language, Dispatcher, JsonProblemStore, Judge0Engine};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read source file {}", path.display()))
}

/// Evaluate a source file locally
pub async fn run_submission(
    problem: &str,
    language: &str,
    source_path: &Path,
    mode: RunMode,
    json: bool,
    problems_path: Option<&Path>,
) -> Result<()> {
    let config = Config::from_env();
    let language = parse_language(language)?;
    let source_code = read_source(source_path)?;

    let problems_path = problems_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.problems_path.clone().into());
    let store = JsonProblemStore::load_from_file(&problems_path)
        .with_context(|| format!("Failed to load problems from {}", problems_path.display()))?;

    let engine = Judge0Engine::new(config.engine.clone()).context("Failed to build engine client")?;
    let dispatcher = Dispatcher::new(engine, config.dispatch.clone());

    let submission = Submission {
        source_code,
        language,
        problem_ref: problem.to_string(),
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    if !json {
        println!(
            "🧪 Evaluating {} ({}) against {} via {}",
            source_path.display(),
            language,
            problem,
            config.engine.base_url
        );
    }

    let verdict = match evaluate_submission(&store, &dispatcher, &submission, mode, &cancel).await {
        Ok(verdict) => verdict,
        Err(e) => bail!("{}: {}", e.code(), e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print!("{}", render_verdict(&verdict));
    }

    Ok(())
}

fn outcome_label(outcome: CaseOutcome) -> &'static str {
    match outcome {
        CaseOutcome::Passed => "passed",
        CaseOutcome::Failed => "wrong answer",
        CaseOutcome::RuntimeError => "runtime error",
        CaseOutcome::CompileError => "compile error",
        CaseOutcome::Timeout => "timeout",
    }
}

/// Human-readable verdict report
pub fn render_verdict(verdict: &SubmissionVerdict) -> String {
    let mut out = String::new();

    for case in &verdict.case_verdicts {
        let icon = if case.outcome == CaseOutcome::Passed { "✅" } else { "❌" };
        let timing = case
            .wall_time_seconds
            .map(|seconds| format!(" ({:.0} ms)", seconds * 1000.0))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {} Case {} {}{}",
            icon,
            case.test_case_index + 1,
            outcome_label(case.outcome),
            timing
        );

        if case.outcome != CaseOutcome::Passed {
            if let Some(expected) = &case.expected_output {
                let _ = writeln!(out, "     Expected: \"{}\"", expected.trim());
            }
            let _ = writeln!(out, "     Got:      \"{}\"", case.actual_output);
        }
    }

    let _ = writeln!(
        out,
        "\n📊 {} / {} passed, status: {}",
        verdict.total_passed, verdict.total_cases, verdict.status
    );
    out
}

/// Print the generated program for one input
pub fn print_harness(language: &str, entry: &str, input: &str, source_path: &Path) -> Result<()> {
    let language = parse_language(language)?;
    let source_code = read_source(source_path)?;

    if !harness::is_supported(language) {
        eprintln!("⚠️  No harness for {}; the source is sent unchanged", language);
    }

    println!("{}", harness::generate(language, entry, input, &source_code));
    Ok(())
}

/// Language table: name, engine id, harness support
pub fn render_language_table() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:<10} {:<10}", "LANGUAGE", "ENGINE ID", "HARNESS");
    let _ = writeln!(out, "{}", "─".repeat(34));
    for language in Language::all_variants() {
        let support = if harness::is_supported(*language) { "yes" } else { "passthrough" };
        let _ = writeln!(
            out,
            "{:<12} {:<10} {:<10}",
            language.to_string(),
            language.engine_id(),
            support
        );
    }
    out
}

pub fn list_languages() {
    println!("📋 Supported Languages:\n");
    print!("{}", render_language_table());
    println!("\n✅ Total: {} language(s)", Language::all_variants().len());
}
