use std::process::Stdio;

use tokio::process::Command;

use crate::executor::CaseError;
use crate::executor::CaseOutcome;
use crate::executor::CaseReport;
use crate::parser::TestCase;

pub const DEFAULT_BENCH_TOOL: &str = "bombardier";

/// Hands each case to an external load generator and passes when it exits
/// cleanly. The tool's report is logged, never parsed.
pub struct BenchExecutor {
    program: String,
}

impl BenchExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn execute(&self, index: usize, case: &TestCase) -> Result<CaseReport, CaseError> {
        let args = bench_args(case);

        tracing::info!(
            url = %case.url,
            command = %format!("{} {}", self.program, args.join(" ")),
            "benchmarking"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| {
                tracing::error!(program = %self.program, error = %source, "bench command failed to start");
                CaseError::BenchSpawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %String::from_utf8_lossy(&output.stderr), "benchmark stderr");
        }

        if !output.status.success() {
            tracing::error!(url = %case.url, status = %output.status, output = %stdout, "bench command failed");
            return Err(CaseError::BenchFailed {
                url: case.url.clone(),
                status: output.status,
                output: stdout,
            });
        }

        tracing::info!(url = %case.url, output = %stdout, "benchmark output");

        Ok(CaseReport {
            index,
            url: case.url.clone(),
            method: case.method.to_uppercase(),
            outcome: CaseOutcome::Benchmarked { output: stdout },
        })
    }
}

/// Argument tokens for the load generator. The order is fixed:
/// concurrency, request count or duration, method, body, keep-alive,
/// headers, output format, target URL.
pub fn bench_args(case: &TestCase) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(threads) = case.threads() {
        args.extend(["-c".to_string(), threads]);
    }

    // bombardier takes either a request count or a duration, not both.
    if let Some(requests) = case.requests() {
        args.extend(["-n".to_string(), requests]);
    } else if let Some(duration) = case.duration() {
        args.extend(["-d".to_string(), duration]);
    }

    args.extend(["-m".to_string(), case.method.to_uppercase()]);

    if let Some(body) = case.body() {
        args.extend(["-b".to_string(), body.to_string()]);
    }

    args.push("-k".to_string());

    for header in &case.headers {
        args.extend(["-H".to_string(), format!("{}: {}", header.name, header.value)]);
    }

    args.extend(["-p".to_string(), "r".to_string(), case.url.clone()]);

    args
}
