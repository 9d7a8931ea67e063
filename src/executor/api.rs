use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use tokio::time::Instant;

use crate::asserter::AssertResult;
use crate::executor::CaseError;
use crate::executor::CaseOutcome;
use crate::executor::CaseReport;
use crate::parser::HeaderSpec;
use crate::parser::TestCase;

/// Sends one request per case and compares the status with `assert_code`.
pub struct ApiExecutor {
    client: Client,
}

/// What the request looked like on the wire, kept for reporting.
#[derive(Debug)]
struct PreparedRequest {
    builder: RequestBuilder,
    method: Method,
    payload: String,
}

impl ApiExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Runs `case` against the shared run deadline. `budget` is only used to
    /// describe the deadline when it is hit.
    pub async fn execute(
        &self,
        index: usize,
        case: &TestCase,
        deadline: Instant,
        budget: Duration,
    ) -> Result<CaseReport, CaseError> {
        let Some(expected) = case.assert_code else {
            return Err(CaseError::MissingAssertion {
                url: case.url.clone(),
                method: case.method.clone(),
            });
        };

        if let Some(timeout) = case.timeout {
            tracing::debug!(
                url = %case.url,
                timeout = ?timeout,
                "per-case timeout is not enforced, the run deadline applies"
            );
        }

        let PreparedRequest {
            builder,
            method,
            payload,
        } = self.prepare(case).inspect_err(|error| {
            tracing::error!(url = %case.url, error = %error, "create http request");
        })?;

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<(StatusCode, String), reqwest::Error>((status, text))
        };

        let (status, response_body) = match tokio::time::timeout_at(deadline, exchange).await {
            Ok(Ok(exchanged)) => exchanged,
            Ok(Err(source)) => {
                tracing::error!(url = %case.url, method = %method, error = %source, "send http request");
                return Err(CaseError::Transport {
                    url: case.url.clone(),
                    method: method.to_string(),
                    source,
                });
            }
            Err(_) => {
                tracing::error!(url = %case.url, method = %method, budget = ?budget, "run deadline exceeded");
                return Err(CaseError::DeadlineExceeded {
                    url: case.url.clone(),
                    method: method.to_string(),
                    budget,
                });
            }
        };

        let result = AssertResult::check(expected, status);
        if !result.passed() {
            tracing::error!(
                url = %case.url,
                method = %method,
                body = %payload,
                status_code = status.as_u16(),
                response_body = %response_body,
                "test failed"
            );
            return Err(CaseError::AssertionFailed {
                url: case.url.clone(),
                method: method.to_string(),
                body: payload,
                expected,
                status,
                response_body,
            });
        }

        tracing::info!(url = %case.url, method = %method, body = %payload, "test passed");

        Ok(CaseReport {
            index,
            url: case.url.clone(),
            method: method.to_string(),
            outcome: CaseOutcome::Passed { status },
        })
    }

    fn prepare(&self, case: &TestCase) -> Result<PreparedRequest, CaseError> {
        let method = parse_method(&case.method).ok_or_else(|| CaseError::InvalidMethod {
            url: case.url.clone(),
            method: case.method.clone(),
        })?;

        let url = Url::parse(&case.url).map_err(|source| CaseError::InvalidUrl {
            url: case.url.clone(),
            source,
        })?;

        let headers = header_map(&case.url, &case.headers)?;

        let mut builder = self.client.request(method.clone(), url);
        let mut payload = String::new();

        if let Some(body) = case.body() {
            payload = serde_json::to_string(body).map_err(|source| CaseError::Encode {
                url: case.url.clone(),
                source,
            })?;
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload.clone());
        }

        // Declared headers replace same-named defaults, e.g. the content type.
        builder = builder.headers(headers);

        Ok(PreparedRequest {
            builder,
            method,
            payload,
        })
    }
}

fn parse_method(method: &str) -> Option<Method> {
    let method = Method::from_str(&method.to_uppercase()).ok()?;

    matches!(
        method,
        Method::GET
            | Method::POST
            | Method::PUT
            | Method::DELETE
            | Method::PATCH
            | Method::HEAD
            | Method::OPTIONS
            | Method::CONNECT
            | Method::TRACE
    )
    .then_some(method)
}

fn header_map(url: &str, headers: &[HeaderSpec]) -> Result<HeaderMap, CaseError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for header in headers {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|e| {
            CaseError::InvalidHeader {
                url: url.to_string(),
                name: header.name.clone(),
                message: e.to_string(),
            }
        })?;

        let value = HeaderValue::from_str(&header.value).map_err(|e| CaseError::InvalidHeader {
            url: url.to_string(),
            name: header.name.clone(),
            message: e.to_string(),
        })?;

        map.append(name, value);
    }

    Ok(map)
}
