//! Scripted engine for exercising the pipeline without a live engine

use crate::engine::ExecutionEngine;
use arbiter_common::{EngineStatus, ExecutionRequest, ExecutionResult, Language};
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Engine whose answer (and delay) is computed from the request
pub struct FnEngine<F> {
    script: F,
}

impl<F> FnEngine<F>
where
    F: Fn(&ExecutionRequest) -> (Duration, ExecutionResult) + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

#[async_trait]
impl<F> ExecutionEngine for FnEngine<F>
where
    F: Fn(&ExecutionRequest) -> (Duration, ExecutionResult) + Send + Sync,
{
    async fn execute(&self, request: &ExecutionRequest, _language: Language) -> ExecutionResult {
        let (delay, result) = (self.script)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

pub fn with_status(status: EngineStatus) -> ExecutionResult {
    ExecutionResult {
        stdout: None,
        stderr: None,
        compile_output: None,
        message: None,
        status,
        wall_time_seconds: Some(0.01),
        memory_kb: Some(1024),
    }
}

pub fn accepted(stdout: &str) -> ExecutionResult {
    ExecutionResult {
        stdout: Some(stdout.to_string()),
        ..with_status(EngineStatus::Accepted)
    }
}

pub fn runtime_error(stderr: &str) -> ExecutionResult {
    ExecutionResult {
        stderr: Some(stderr.to_string()),
        message: Some("Exited with error status 1".to_string()),
        ..with_status(EngineStatus::RuntimeError(arbiter_common::RuntimeErrorKind::Nzec))
    }
}

pub fn compile_error(output: &str) -> ExecutionResult {
    ExecutionResult {
        compile_output: Some(output.to_string()),
        ..with_status(EngineStatus::CompilationError)
    }
}

fn run_step(dir: &Path, argv: &[&str]) -> Option<String> {
    let output = match Command::new(argv[0]).args(&argv[1..]).current_dir(dir).output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => panic!("failed to spawn {}: {}", argv[0], e),
    };
    assert!(
        output.status.success(),
        "{} failed:\n{}",
        argv.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Build and run a generated program with the local toolchain
///
/// Returns `None` when the toolchain is not installed so callers can skip.
pub fn run_locally(
    file_name: &str,
    program: &str,
    build: Option<&[&str]>,
    run: &[&str],
) -> Option<String> {
    let dir = std::env::temp_dir().join(format!("arbiter-harness-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file_name), program).unwrap();

    let stdout = match build {
        Some(build) => run_step(&dir, build).and_then(|_| run_step(&dir, run)),
        None => run_step(&dir, run),
    };

    let _ = fs::remove_dir_all(&dir);
    if stdout.is_none() {
        eprintln!("skipping: {} not installed", build.unwrap_or(run)[0]);
    }
    stdout
}
