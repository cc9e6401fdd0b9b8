//! Client side of the external code-execution sandbox.

use std::time::Duration;

use async_trait::async_trait;
use common::TestSummary;
use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;
use crate::entity::match_setting::TestCase;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("code runner is not configured")]
    Disabled,
    #[error("runner request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("runner returned {expected} results for {got} tests")]
    ResultCount { expected: usize, got: usize },
}

/// Outcome of a single test case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseOutcome {
    pub passed: bool,
    #[serde(default)]
    pub actual_output: Option<String>,
}

/// Result of running one test set. Stored verbatim in `submission.*_test_results`.
///
/// The `passed`/`total`/`allPassed` fields make the stored JSON readable as a
/// [`TestSummary`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunReport {
    pub passed: u32,
    pub total: u32,
    pub all_passed: bool,
    pub results: Vec<TestCaseOutcome>,
}

impl TestRunReport {
    pub fn from_results(results: Vec<TestCaseOutcome>) -> Self {
        let total = results.len() as u32;
        let passed = results.iter().filter(|r| r.passed).count() as u32;
        Self {
            passed,
            total,
            all_passed: total > 0 && passed == total,
            results,
        }
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary::from_counts(self.passed, self.total)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Run `code` against every test case, preserving order.
    async fn run(&self, code: &str, tests: &[TestCase]) -> Result<TestRunReport, RunnerError>;
}

/// Build the runner selected by configuration.
pub fn from_config(config: &RunnerConfig) -> Result<std::sync::Arc<dyn CodeRunner>, RunnerError> {
    Ok(match &config.url {
        Some(url) => std::sync::Arc::new(HttpCodeRunner::new(
            url,
            Duration::from_secs(config.timeout_secs),
        )?),
        None => {
            tracing::warn!("runner.url is not set; code submissions will be rejected");
            std::sync::Arc::new(DisabledRunner)
        }
    })
}

#[derive(Serialize)]
struct RunRequest<'a> {
    code: &'a str,
    tests: &'a [TestCase],
}

#[derive(Deserialize)]
struct RunResponse {
    results: Vec<TestCaseOutcome>,
}

/// Posts `{code, tests}` to `<url>/run` and expects `{results: [...]}` back.
#[derive(Debug, Clone)]
pub struct HttpCodeRunner {
    client: reqwest::Client,
    run_url: String,
}

impl HttpCodeRunner {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            run_url: format!("{}/run", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CodeRunner for HttpCodeRunner {
    async fn run(&self, code: &str, tests: &[TestCase]) -> Result<TestRunReport, RunnerError> {
        if tests.is_empty() {
            return Ok(TestRunReport::default());
        }

        let response: RunResponse = self
            .client
            .post(&self.run_url)
            .json(&RunRequest { code, tests })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.results.len() != tests.len() {
            return Err(RunnerError::ResultCount {
                expected: tests.len(),
                got: response.results.len(),
            });
        }

        Ok(TestRunReport::from_results(response.results))
    }
}

/// Used when no runner URL is configured.
pub struct DisabledRunner;

#[async_trait]
impl CodeRunner for DisabledRunner {
    async fn run(&self, _code: &str, _tests: &[TestCase]) -> Result<TestRunReport, RunnerError> {
        Err(RunnerError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::submission_status::did_all_tests_pass;

    fn outcome(passed: bool) -> TestCaseOutcome {
        TestCaseOutcome {
            passed,
            actual_output: None,
        }
    }

    #[test]
    fn report_counts_passed_cases() {
        let report = TestRunReport::from_results(vec![outcome(true), outcome(false), outcome(true)]);
        assert_eq!(report.passed, 2);
        assert_eq!(report.total, 3);
        assert!(!report.all_passed);
    }

    #[test]
    fn empty_report_never_passes() {
        let report = TestRunReport::from_results(vec![]);
        assert!(!report.all_passed);
        assert!(!did_all_tests_pass(Some(&report.summary())));
    }

    #[test]
    fn stored_report_reads_back_as_summary() {
        let report = TestRunReport::from_results(vec![outcome(true), outcome(true)]);
        let summary: TestSummary = serde_json::from_value(report.to_json()).unwrap();
        assert_eq!(summary.tally(), Some((2, 2)));
        assert!(did_all_tests_pass(Some(&summary)));
    }

    #[tokio::test]
    async fn disabled_runner_refuses() {
        let err = DisabledRunner.run("print(1)", &[]).await.unwrap_err();
        assert!(matches!(err, RunnerError::Disabled));
    }
}
