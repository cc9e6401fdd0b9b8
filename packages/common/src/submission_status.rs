#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluated status of a code submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// At least one public test failed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "wrong"))]
    Wrong,
    /// Public tests pass but a private test fails.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "improvable"))]
    Improvable,
    /// Every known test passes.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "probably_correct"))]
    ProbablyCorrect,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrong => "wrong",
            Self::Improvable => "improvable",
            Self::ProbablyCorrect => "probably_correct",
        }
    }

    /// Statuses that count towards a completed challenge.
    pub const COMPLETED: &'static [SubmissionStatus] = &[Self::ProbablyCorrect, Self::Improvable];

    pub fn counts_as_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-set outcome counts of a test run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

/// Summary of one test set (public or private) as reported by the runner.
///
/// Accepts an object with an `allPassed` flag and/or `passed`/`total`
/// counts, or a bare list of per-test pass booleans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestSummary {
    Cases(Vec<bool>),
    Counts(TestCounts),
}

impl TestSummary {
    pub fn from_counts(passed: u32, total: u32) -> Self {
        Self::Counts(TestCounts {
            all_passed: None,
            passed: Some(passed),
            total: Some(total),
        })
    }

    /// `(passed, total)` when the summary carries enough information.
    pub fn tally(&self) -> Option<(u32, u32)> {
        match self {
            Self::Cases(cases) => {
                let passed = cases.iter().filter(|c| **c).count() as u32;
                Some((passed, cases.len() as u32))
            }
            Self::Counts(TestCounts {
                passed: Some(p),
                total: Some(t),
                ..
            }) => Some((*p, *t)),
            Self::Counts(_) => None,
        }
    }
}

/// Returns true only if the summary proves every test in a non-empty set passed.
pub fn did_all_tests_pass(summary: Option<&TestSummary>) -> bool {
    match summary {
        None => false,
        Some(TestSummary::Cases(cases)) => !cases.is_empty() && cases.iter().all(|c| *c),
        Some(TestSummary::Counts(counts)) => {
            if counts.total == Some(0) {
                return false;
            }
            if let Some(flag) = counts.all_passed {
                return flag;
            }
            match (counts.passed, counts.total) {
                (Some(passed), Some(total)) => total > 0 && passed == total,
                _ => false,
            }
        }
    }
}

/// Public tests gate correctness; private tests separate improvable from probably correct.
pub fn get_submission_status(
    public: Option<&TestSummary>,
    private: Option<&TestSummary>,
) -> SubmissionStatus {
    if !did_all_tests_pass(public) {
        SubmissionStatus::Wrong
    } else if !did_all_tests_pass(private) {
        SubmissionStatus::Improvable
    } else {
        SubmissionStatus::ProbablyCorrect
    }
}
