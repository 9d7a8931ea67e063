use std::env;
use std::env::VarError;
use std::path::Path;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::parser::TestCase;

/// The declared test cases, in declaration order.
pub type Suite = Vec<TestCase>;

#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("Failed to read test configuration file `{}`", .path.display())]
    #[diagnostic(code(endy::load::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse test configuration file `{}`", .path.display())]
    #[diagnostic(
        code(endy::load::parse),
        help("the file must be a YAML list of test cases with at least `url` and `method`")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Environment variable `{variable}` not found (needed by header `{header}`)")]
    #[diagnostic(
        code(endy::load::missing_secret),
        help("export the variable before running the suite")
    )]
    MissingSecret { header: String, variable: String },

    #[error("Environment variable `{variable}` is not valid UTF-8 (needed by header `{header}`)")]
    #[diagnostic(code(endy::load::secret_not_unicode))]
    SecretNotUnicode { header: String, variable: String },
}

/// Reads the suite at `path` and fills secret headers from the process
/// environment.
pub fn load_suite(path: &Path) -> Result<Suite, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let suite = parse_suite(&contents, path)?;
    let suite = resolve_secrets(suite, |name| env::var(name))?;

    tracing::info!(path = %path.display(), cases = suite.len(), "loaded test suite");

    Ok(suite)
}

pub fn parse_suite(contents: &str, path: &Path) -> Result<Suite, LoadError> {
    // An empty document deserializes to unit, not to an empty list.
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites the value of every header carrying `env_secret` with the
/// content of that variable. Unset and empty variables are both missing.
pub fn resolve_secrets<F>(mut suite: Suite, lookup: F) -> Result<Suite, LoadError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    for case in &mut suite {
        for header in &mut case.headers {
            let Some(variable) = header.env_secret.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };

            match lookup(variable) {
                Ok(value) if !value.is_empty() => header.value = value,
                Ok(_) | Err(VarError::NotPresent) => {
                    return Err(LoadError::MissingSecret {
                        header: header.name.clone(),
                        variable: variable.to_string(),
                    });
                }
                Err(VarError::NotUnicode(_)) => {
                    return Err(LoadError::SecretNotUnicode {
                        header: header.name.clone(),
                        variable: variable.to_string(),
                    });
                }
            }
        }
    }

    Ok(suite)
}
