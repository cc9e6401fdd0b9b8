#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

/// Lifecycle phase of a challenge.
///
/// A challenge is created `Public` or `Private`, receives match assignments,
/// runs a coding phase (phase one) and a peer-review phase (phase two).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Visible to every student, open for self-enrollment.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "public"))]
    Public,
    /// Enrollment is managed by the teacher.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "private"))]
    Private,
    /// Participants have been paired with match settings.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "assigned"))]
    Assigned,
    /// Coding phase is running.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "started_phase_one"))]
    StartedPhaseOne,
    /// Coding phase is over, peer review not yet started.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ended_phase_one"))]
    EndedPhaseOne,
    /// Peer review is running.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "started_phase_two"))]
    StartedPhaseTwo,
    /// Peer review is over; the challenge can be finalized.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ended_phase_two"))]
    EndedPhaseTwo,
}

impl ChallengeStatus {
    pub const ALL: &'static [ChallengeStatus] = &[
        Self::Public,
        Self::Private,
        Self::Assigned,
        Self::StartedPhaseOne,
        Self::EndedPhaseOne,
        Self::StartedPhaseTwo,
        Self::EndedPhaseTwo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Assigned => "assigned",
            Self::StartedPhaseOne => "started_phase_one",
            Self::EndedPhaseOne => "ended_phase_one",
            Self::StartedPhaseTwo => "started_phase_two",
            Self::EndedPhaseTwo => "ended_phase_two",
        }
    }

    /// Returns true while the challenge still accepts new participants.
    pub fn is_enrollable(&self) -> bool {
        matches!(self, Self::Public | Self::Private)
    }

    /// Returns true if the phase graph has an edge from `self` to `next`.
    ///
    /// `EndedPhaseTwo` is terminal; finalization only touches scoring fields.
    pub fn can_transition_to(&self, next: ChallengeStatus) -> bool {
        matches!(
            (self, next),
            (Self::Public | Self::Private, Self::Assigned)
                | (Self::Assigned, Self::StartedPhaseOne)
                | (Self::StartedPhaseOne, Self::EndedPhaseOne)
                | (Self::EndedPhaseOne, Self::StartedPhaseTwo)
                | (Self::StartedPhaseTwo, Self::EndedPhaseTwo)
        )
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                ParseEnumError::new(
                    "challenge status",
                    s,
                    &Self::ALL.iter().map(|st| st.as_str()).collect::<Vec<_>>(),
                )
            })
    }
}

/// Progress of the post-review scoring computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "computing"))]
    Computing,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
}

impl ScoringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Computing => "computing",
            Self::Completed => "completed",
        }
    }
}

impl Default for ScoringStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ScoringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
