#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;
use crate::submission_status::SubmissionStatus;

/// A reviewer's verdict on someone else's submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "correct"))]
    Correct,
    /// Requires a bug-proof test case.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "incorrect"))]
    Incorrect,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "abstain"))]
    Abstain,
}

impl VoteValue {
    pub const ALL: &'static [VoteValue] = &[Self::Correct, Self::Incorrect, Self::Abstain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Abstain => "abstain",
        }
    }

    /// Whether the vote matches the evaluated status of the reviewed submission.
    ///
    /// Returns `None` for abstentions, which are neither right nor wrong.
    pub fn agrees_with(&self, status: SubmissionStatus) -> Option<bool> {
        match self {
            Self::Correct => Some(status == SubmissionStatus::ProbablyCorrect),
            Self::Incorrect => Some(status != SubmissionStatus::ProbablyCorrect),
            Self::Abstain => None,
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteValue {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "vote",
                    s,
                    &Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
                )
            })
    }
}
