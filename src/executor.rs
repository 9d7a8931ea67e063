use std::process::ExitStatus;
use std::time::Duration;

use miette::Diagnostic;
use reqwest::StatusCode;
use thiserror::Error;

pub mod api;
pub mod bench;

pub use api::ApiExecutor;
pub use bench::BenchExecutor;

/// A case that could not run or did not pass. Any of these aborts the run.
#[derive(Error, Debug, Diagnostic)]
pub enum CaseError {
    #[error("Invalid HTTP method `{method}` for {url}")]
    #[diagnostic(code(endy::request::method))]
    InvalidMethod { url: String, method: String },

    #[error("Invalid URL `{url}`: {source}")]
    #[diagnostic(code(endy::request::url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header `{name}` for {url}: {message}")]
    #[diagnostic(code(endy::request::header))]
    InvalidHeader {
        url: String,
        name: String,
        message: String,
    },

    #[error("No `assert_code` declared for {method} {url}")]
    #[diagnostic(
        code(endy::request::assert_code),
        help("API mode compares the response status with `assert_code`; declare one")
    )]
    MissingAssertion { url: String, method: String },

    #[error("Failed to encode request body for {url}")]
    #[diagnostic(code(endy::request::encode))]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request {method} {url} failed: {source}")]
    #[diagnostic(code(endy::transport))]
    Transport {
        url: String,
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Run deadline of {budget:?} exceeded during {method} {url}")]
    #[diagnostic(
        code(endy::deadline),
        help("the timeout covers the whole suite; raise it with --timeout")
    )]
    DeadlineExceeded {
        url: String,
        method: String,
        budget: Duration,
    },

    #[error("Test failed: {method} {url} expected status {expected}, got {status}")]
    #[diagnostic(code(endy::assertion))]
    AssertionFailed {
        url: String,
        method: String,
        body: String,
        expected: u16,
        status: StatusCode,
        response_body: String,
    },

    #[error("Failed to start benchmark tool `{program}`: {source}")]
    #[diagnostic(
        code(endy::bench::spawn),
        help("install the load generator or point --bench-tool at it")
    )]
    BenchSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Benchmark of {url} failed: {status}")]
    #[diagnostic(code(endy::bench::failed))]
    BenchFailed {
        url: String,
        status: ExitStatus,
        output: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Response status matched `assert_code`.
    Passed { status: StatusCode },
    /// The load generator exited cleanly; its stdout is kept verbatim.
    Benchmarked { output: String },
}

/// Record of one executed case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub index: usize,
    pub url: String,
    pub method: String,
    pub outcome: CaseOutcome,
}
