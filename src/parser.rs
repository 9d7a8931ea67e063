use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;

/// One declared test case, as written in the suite file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TestCase {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub assert_code: Option<u16>,
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub headers: Vec<HeaderSpec>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub threads: Option<StringOrNumber>,
    #[serde(default)]
    pub requests: Option<StringOrNumber>,
    #[serde(default)]
    pub duration: Option<StringOrNumber>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub env_secret: Option<String>,
}

/// Benchmark knobs are forwarded verbatim, so `10` and `"10"` mean the same.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum StringOrNumber {
    Text(String),
    Number(i64),
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::Text(s) => write!(f, "{s}"),
            StringOrNumber::Number(n) => write!(f, "{n}"),
        }
    }
}

impl TestCase {
    /// Request body, if one was declared and it is not empty.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    pub fn threads(&self) -> Option<String> {
        non_empty(&self.threads)
    }

    pub fn requests(&self) -> Option<String> {
        non_empty(&self.requests)
    }

    pub fn duration(&self) -> Option<String> {
        non_empty(&self.duration)
    }
}

fn non_empty(value: &Option<StringOrNumber>) -> Option<String> {
    value
        .as_ref()
        .map(ToString::to_string)
        .filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("invalid duration `{0}`")]
    Invalid(String),

    #[error("unknown unit `{unit}` in duration `{input}`")]
    UnknownUnit { unit: String, input: String },

    #[error("duration `{0}` is out of range")]
    OutOfRange(String),
}

/// Longest accepted duration, the same bound Go puts on `time.Duration`.
pub const MAX_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

/// Parses durations written the way Go prints them: `10s`, `250ms`, `1m30s`.
/// A bare integer is taken as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    if let Ok(secs) = s.parse::<u64>() {
        let duration = Duration::from_secs(secs);
        if duration > MAX_DURATION {
            return Err(DurationError::OutOfRange(input.to_string()));
        }
        return Ok(duration);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let value: f64 = rest[..digits_end]
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            "" => return Err(DurationError::Invalid(input.to_string())),
            other => {
                return Err(DurationError::UnknownUnit {
                    unit: other.to_string(),
                    input: input.to_string(),
                });
            }
        };

        let nanos = (value * nanos_per_unit).round();
        if !nanos.is_finite() || nanos > MAX_DURATION.as_nanos() as f64 {
            return Err(DurationError::OutOfRange(input.to_string()));
        }

        total = total
            .checked_add(Duration::from_nanos(nanos as u64))
            .filter(|total| *total <= MAX_DURATION)
            .ok_or_else(|| DurationError::OutOfRange(input.to_string()))?;
    }

    Ok(total)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<StringOrNumber>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => {
            let secs = u64::try_from(n)
                .map_err(|_| serde::de::Error::custom(format!("negative timeout `{n}`")))?;
            let duration = Duration::from_secs(secs);
            if duration > MAX_DURATION {
                return Err(serde::de::Error::custom(DurationError::OutOfRange(
                    n.to_string(),
                )));
            }
            Ok(Some(duration))
        }
        Some(StringOrNumber::Text(s)) => parse_duration(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_full_record() {
        let yaml = r#"
- url: http://localhost:8080/users
  method: post
  assert_code: 201
  timeout: 2s
  body: '{"name":"bob"}'
  headers:
    - name: Content-Type
      value: application/json
    - name: Authorization
      env_secret: API_TOKEN
  threads: 8
  requests: "1000"
"#;
        let suite: Vec<TestCase> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(suite.len(), 1);

        let case = &suite[0];
        assert_eq!(case.url, "http://localhost:8080/users");
        assert_eq!(case.method, "post");
        assert_eq!(case.assert_code, Some(201));
        assert_eq!(case.timeout, Some(Duration::from_secs(2)));
        assert_eq!(case.body(), Some(r#"{"name":"bob"}"#));
        assert_eq!(case.headers[1].value, "");
        assert_eq!(case.headers[1].env_secret.as_deref(), Some("API_TOKEN"));
        assert_eq!(case.threads().as_deref(), Some("8"));
        assert_eq!(case.requests().as_deref(), Some("1000"));
        assert_eq!(case.duration(), None);
    }

    #[test]
    fn minimal_record_uses_defaults() {
        let yaml = "- url: http://x/ok\n  method: GET\n";
        let suite: Vec<TestCase> = serde_yaml::from_str(yaml).unwrap();

        let case = &suite[0];
        assert_eq!(case.assert_code, None);
        assert_eq!(case.timeout, None);
        assert!(case.headers.is_empty());
        assert_eq!(case.body(), None);
    }

    #[test]
    fn empty_body_is_no_body() {
        let yaml = "- url: http://x/ok\n  method: GET\n  body: ''\n";
        let suite: Vec<TestCase> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(suite[0].body(), None);
    }

    #[test]
    fn missing_url_is_rejected() {
        let yaml = "- method: GET\n  assert_code: 200\n";
        assert!(serde_yaml::from_str::<Vec<TestCase>>(yaml).is_err());
    }

    #[test]
    fn oversized_numeric_timeout_is_rejected() {
        let yaml = "- url: http://x/ok\n  method: GET\n  timeout: 9223372036854775807\n";
        assert!(serde_yaml::from_str::<Vec<TestCase>>(yaml).is_err());
    }

    #[test]
    fn go_style_durations() {
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("7"), Ok(Duration::from_secs(7)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn bad_durations() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("-5s"), Err(DurationError::Invalid(_))));
        assert!(matches!(
            parse_duration("18446744073709551615"),
            Err(DurationError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_duration("9999999999h"),
            Err(DurationError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_duration("2000000h2000000h"),
            Err(DurationError::OutOfRange(_))
        ));
        assert!(matches!(parse_duration("s"), Err(DurationError::Invalid(_))));
        assert!(matches!(
            parse_duration("10parsecs"),
            Err(DurationError::UnknownUnit { .. })
        ));
    }
}
