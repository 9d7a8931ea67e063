use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;

use crate::executor::ApiExecutor;
use crate::executor::BenchExecutor;
use crate::executor::CaseError;
use crate::executor::CaseReport;
use crate::executor::bench::DEFAULT_BENCH_TOOL;
use crate::loader::Suite;
use crate::outputter::OutPutter;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Budgets past this point are treated as "no deadline". Adding more to an
/// `Instant` can overflow.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One request per case, status compared with `assert_code`.
    Api,
    /// One load generator invocation per case.
    Benchmark,
}

/// Process-wide settings, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: PathBuf,
    pub timeout: Duration,
    pub mode: Mode,
    pub bench_tool: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.yaml"),
            timeout: DEFAULT_TIMEOUT,
            mode: Mode::Api,
            bench_tool: DEFAULT_BENCH_TOOL.to_string(),
        }
    }
}

impl RunConfig {
    /// Time budget for the whole suite. Zero means the default.
    pub fn deadline_budget(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    Aborted(CaseError),
}

/// Cases executed so far, in execution order.
#[derive(Debug, Default)]
pub struct RunState {
    pub results: Vec<CaseReport>,
}

#[derive(Debug)]
pub struct RunReport {
    pub mode: Mode,
    pub total: usize,
    pub results: Vec<CaseReport>,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }

    pub fn into_result(self) -> Result<Vec<CaseReport>, CaseError> {
        match self.outcome {
            Outcome::Completed => Ok(self.results),
            Outcome::Aborted(error) => Err(error),
        }
    }
}

pub struct Runner {
    config: RunConfig,
    api: ApiExecutor,
    bench: BenchExecutor,
    outputter: OutPutter,
}

impl Runner {
    pub fn new(config: RunConfig, outputter: OutPutter) -> Self {
        let api = ApiExecutor::new(Client::new());
        let bench = BenchExecutor::new(config.bench_tool.clone());

        Self {
            config,
            api,
            bench,
            outputter,
        }
    }

    /// Executes the suite in declaration order and stops at the first failed
    /// case. Every HTTP exchange shares one deadline taken at the start.
    pub async fn run(&self, suite: &Suite) -> RunReport {
        let budget = self.config.deadline_budget();
        let started = Instant::now();
        let deadline = started + budget.min(FAR_FUTURE);
        let total = suite.len();

        self.outputter.start(self.config.mode, &self.config.path, total);

        let mut state = RunState::default();
        let mut outcome = Outcome::Completed;

        for (index, case) in suite.iter().enumerate() {
            let result = match self.config.mode {
                Mode::Api => self.api.execute(index, case, deadline, budget).await,
                Mode::Benchmark => self.bench.execute(index, case).await,
            };

            match result {
                Ok(report) => {
                    self.outputter.case_passed(&report, total);
                    state.results.push(report);
                }
                Err(error) => {
                    // API failures are already logged with full request context.
                    if self.config.mode == Mode::Benchmark {
                        tracing::error!(url = %case.url, error = %error, "execute test");
                    }
                    self.outputter.case_failed(index, case, &error, total);
                    outcome = Outcome::Aborted(error);
                    break;
                }
            }
        }

        let report = RunReport {
            mode: self.config.mode,
            total,
            results: state.results,
            outcome,
            elapsed: started.elapsed(),
        };

        self.outputter.finish(&report);

        report
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::Router;
    use axum::extract::Path;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;
    use crate::executor::CaseOutcome;
    use crate::parser::TestCase;

    type Hits = Arc<Mutex<Vec<String>>>;

    async fn status_for(Path(name): Path<String>, State(hits): State<Hits>) -> StatusCode {
        hits.lock().unwrap().push(name.clone());
        match name.as_str() {
            "bad" => StatusCode::INTERNAL_SERVER_ERROR,
            "slow" => {
                tokio::time::sleep(Duration::from_millis(400)).await;
                StatusCode::OK
            }
            _ => StatusCode::OK,
        }
    }

    async fn serve() -> (String, Hits) {
        let hits: Hits = Arc::default();
        let app = Router::new()
            .route("/{name}", get(status_for))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), hits)
    }

    fn get_case(base: &str, path: &str) -> TestCase {
        TestCase {
            url: format!("{base}/{path}"),
            method: "GET".into(),
            assert_code: Some(200),
            timeout: None,
            headers: vec![],
            body: None,
            threads: None,
            requests: None,
            duration: None,
        }
    }

    fn runner(mode: Mode, timeout: Duration) -> Runner {
        Runner::new(
            RunConfig {
                timeout,
                mode,
                ..RunConfig::default()
            },
            OutPutter::silent(),
        )
    }

    #[test]
    fn zero_timeout_means_default() {
        let config = RunConfig {
            timeout: Duration::ZERO,
            ..RunConfig::default()
        };
        assert_eq!(config.deadline_budget(), Duration::from_secs(10));

        let config = RunConfig {
            timeout: Duration::from_secs(3),
            ..RunConfig::default()
        };
        assert_eq!(config.deadline_budget(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn single_passing_case_completes() {
        let (base, _) = serve().await;
        let suite = vec![get_case(&base, "ok")];

        let report = runner(Mode::Api, Duration::from_secs(10)).run(&suite).await;

        assert!(report.completed());
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            report.results[0].outcome,
            CaseOutcome::Passed {
                status: reqwest::StatusCode::OK
            }
        );
    }

    #[tokio::test]
    async fn cases_run_in_declaration_order() {
        let (base, hits) = serve().await;
        let suite = vec![
            get_case(&base, "c"),
            get_case(&base, "a"),
            get_case(&base, "b"),
        ];

        let report = runner(Mode::Api, Duration::from_secs(10)).run(&suite).await;

        assert!(report.completed());
        assert_eq!(*hits.lock().unwrap(), ["c", "a", "b"]);
        let indexes: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(indexes, [0, 1, 2]);
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let (base, hits) = serve().await;
        let suite = vec![get_case(&base, "bad"), get_case(&base, "ok")];

        let report = runner(Mode::Api, Duration::from_secs(10)).run(&suite).await;

        assert!(!report.completed());
        assert!(report.results.is_empty());
        assert_eq!(*hits.lock().unwrap(), ["bad"]);
        assert!(matches!(
            report.into_result(),
            Err(CaseError::AssertionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn deadline_is_shared_across_cases() {
        let (base, hits) = serve().await;
        // Each case fits the budget alone, but not all of them together.
        let suite = vec![
            get_case(&base, "slow"),
            get_case(&base, "slow"),
            get_case(&base, "slow"),
            get_case(&base, "ok"),
        ];

        let report = runner(Mode::Api, Duration::from_millis(1000))
            .run(&suite)
            .await;

        assert!(matches!(
            report.outcome,
            Outcome::Aborted(CaseError::DeadlineExceeded { .. })
        ));
        assert_eq!(report.results.len(), 2);
        assert!(!hits.lock().unwrap().contains(&"ok".to_string()));
    }

    #[tokio::test]
    async fn generous_timeout_does_not_change_results() {
        let (base, _) = serve().await;
        let suite = vec![get_case(&base, "slow"), get_case(&base, "ok")];

        let report = runner(Mode::Api, Duration::from_secs(30)).run(&suite).await;

        assert!(report.completed());
        assert_eq!(report.results.len(), 2);
    }

    #[tokio::test]
    async fn huge_timeout_does_not_overflow_the_deadline() {
        let (base, _) = serve().await;
        let suite = vec![get_case(&base, "ok")];

        let report = runner(Mode::Api, Duration::from_secs(u64::MAX))
            .run(&suite)
            .await;

        assert!(report.completed());
        assert_eq!(report.mode, Mode::Api);
    }

    #[tokio::test]
    async fn empty_suite_completes() {
        let report = runner(Mode::Api, Duration::from_secs(1)).run(&Vec::new()).await;
        assert!(report.completed());
        assert_eq!(report.total, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn benchmark_mode_stops_on_failing_tool() {
        let suite = vec![get_case("http://x", "a"), get_case("http://x", "b")];

        let passing = Runner::new(
            RunConfig {
                mode: Mode::Benchmark,
                bench_tool: "true".into(),
                ..RunConfig::default()
            },
            OutPutter::silent(),
        );
        let report = passing.run(&suite).await;
        assert!(report.completed());
        assert_eq!(report.results.len(), 2);

        let failing = Runner::new(
            RunConfig {
                mode: Mode::Benchmark,
                bench_tool: "false".into(),
                ..RunConfig::default()
            },
            OutPutter::silent(),
        );
        let report = failing.run(&suite).await;
        assert!(report.results.is_empty());
        assert!(matches!(
            report.outcome,
            Outcome::Aborted(CaseError::BenchFailed { .. })
        ));
    }
}
