use core::fmt;
use std::fmt::Display;

use reqwest::StatusCode;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TestResult {
    Pass,
    Fail,
}

/// Outcome of comparing one response status with the declared one.
#[derive(Debug, Clone)]
pub struct AssertResult {
    pub status: TestResult,
    pub expected: u16,
    pub actual: StatusCode,
}

impl AssertResult {
    pub fn check(expected: u16, actual: StatusCode) -> Self {
        Self {
            status: assert_status(expected, actual),
            expected,
            actual,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == TestResult::Pass
    }
}

impl Display for AssertResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            TestResult::Pass => write!(
                f,
                "{} {} Got status {}",
                console::style("✔").green().bold(),
                console::style("PASS!").green().bold(),
                self.actual
            ),
            TestResult::Fail => write!(
                f,
                "{} {}\n  Expected: {}\n  Actual:   {}",
                console::style("✘").red().bold(),
                console::style("FAIL!").red().bold(),
                console::style(format!("Expected status {}", self.expected)).green(),
                console::style(format!("Got status {}", self.actual)).red(),
            ),
        }
    }
}

pub fn assert_status(expected: u16, status: StatusCode) -> TestResult {
    let expected_status_code = match StatusCode::from_u16(expected) {
        Ok(status) => status,
        Err(_) => return TestResult::Fail,
    };

    if expected_status_code != status {
        return TestResult::Fail;
    }

    TestResult::Pass
}
