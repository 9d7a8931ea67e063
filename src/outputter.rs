use std::path::Path;

use console::Style;

use crate::asserter::AssertResult;
use crate::executor::CaseError;
use crate::executor::CaseOutcome;
use crate::executor::CaseReport;
use crate::parser::TestCase;
use crate::runner::Mode;
use crate::runner::Outcome;
use crate::runner::RunReport;

/// Human-facing progress on stdout. Structured records go through `tracing`.
pub struct OutPutter {
    enabled: bool,
}

impl OutPutter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn silent() -> Self {
        Self::new(false)
    }

    pub fn start(&self, mode: Mode, test_path: &Path, n_tests: usize) {
        if !self.enabled {
            return;
        }

        let banner = match mode {
            Mode::Api => console::style("Running API testing mode").green().bold(),
            Mode::Benchmark => console::style("Running benchmark mode").yellow().bold(),
        };
        println!("{banner}");

        let style = Style::new().bold().cyan();
        let open_text = format!(
            "Running test file: {} Found {n_tests} tests: Running...",
            test_path.display()
        );
        println!("{}", style.apply_to(open_text));
    }

    pub fn case_passed(&self, report: &CaseReport, n_tests: usize) {
        if !self.enabled {
            return;
        }

        let i = report.index + 1;
        let detail = match &report.outcome {
            CaseOutcome::Passed { status } => format!("Got status {status}"),
            CaseOutcome::Benchmarked { .. } => "benchmark passed".to_string(),
        };

        println!(
            "[{i}/{n_tests}] {}  {} {}: {detail} {}",
            console::style("✔").green().bold(),
            report.method,
            report.url,
            console::style("PASS!").green().bold(),
        );

        if let CaseOutcome::Benchmarked { output } = &report.outcome {
            println!("{}", console::style(output.trim_end()).dim());
        }
    }

    pub fn case_failed(&self, index: usize, case: &TestCase, error: &CaseError, n_tests: usize) {
        if !self.enabled {
            return;
        }

        println!(
            "[{}/{n_tests}] {}  {} {}: {}",
            index + 1,
            console::style("╳").red().bold(),
            case.method.to_uppercase(),
            case.url,
            console::style("FAILED!").red().bold(),
        );

        match error {
            CaseError::AssertionFailed {
                body,
                expected,
                status,
                response_body,
                ..
            } => {
                println!("{}", AssertResult::check(*expected, *status));
                if !body.is_empty() {
                    println!("  {} {}", console::style("Sent body:").yellow(), body);
                }
                println!(
                    "  {} {}",
                    console::style("Response body:").red(),
                    console::style(response_body).dim()
                );
            }
            CaseError::BenchFailed { output, .. } => {
                println!("  {}", console::style("Benchmark output:").red());
                println!("{}", console::style(output.trim_end()).dim());
            }
            other => {
                println!(
                    "  {} {}",
                    console::style("Error:").red(),
                    console::style(other).red().bold()
                );
            }
        }
    }

    pub fn finish(&self, report: &RunReport) {
        if !self.enabled {
            return;
        }

        println!();
        match report.outcome {
            Outcome::Completed => println!(
                "{} ({} tests in {:.2?})",
                console::style("All tests passed! 🎉").bold().green(),
                report.results.len(),
                report.elapsed
            ),
            Outcome::Aborted(_) => println!(
                "{} ({}/{} tests passed before the run stopped)",
                console::style("Run aborted").bold().red(),
                report.results.len(),
                report.total
            ),
        }
    }
}
