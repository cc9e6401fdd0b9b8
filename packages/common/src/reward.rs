//! Badge and title rules.

#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping used by the rules page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "challenge_milestone"))]
    ChallengeMilestone,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "review_milestone"))]
    ReviewMilestone,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "review_quality"))]
    ReviewQuality,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeMilestone => "challenge_milestone",
            Self::ReviewMilestone => "review_milestone",
            Self::ReviewQuality => "review_quality",
        }
    }
}

impl fmt::Display for BadgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The student statistic a badge threshold is compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum BadgeMetric {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "challenges_completed"))]
    ChallengesCompleted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "reviews_completed"))]
    ReviewsCompleted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "correct_reviews"))]
    CorrectReviews,
}

/// Aggregate numbers a title promotion is judged on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_challenges: u64,
    pub avg_score: f64,
    pub badges_earned: u64,
}

/// Thresholds of one title tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleRequirement {
    pub id: i32,
    pub rank: i32,
    pub min_challenges: i32,
    pub min_avg_score: f64,
    pub min_badges: i32,
}

impl TitleRequirement {
    /// All three thresholds must hold at the same time.
    pub fn is_met_by(&self, stats: &StudentStats) -> bool {
        stats.total_challenges >= self.min_challenges.max(0) as u64
            && stats.avg_score >= self.min_avg_score
            && stats.badges_earned >= self.min_badges.max(0) as u64
    }
}

/// The tier directly above `current_rank`, or the lowest tier when none is held.
pub fn next_title(titles: &[TitleRequirement], current_rank: Option<i32>) -> Option<&TitleRequirement> {
    titles
        .iter()
        .filter(|t| current_rank.is_none_or(|rank| t.rank > rank))
        .min_by_key(|t| t.rank)
}

/// Returns the title a student should be promoted to, if any.
///
/// Promotion is always to the immediate next rank, even if the stats would
/// satisfy several higher tiers.
pub fn next_title_eligibility<'a>(
    stats: &StudentStats,
    current_rank: Option<i32>,
    titles: &'a [TitleRequirement],
) -> Option<&'a TitleRequirement> {
    next_title(titles, current_rank).filter(|t| t.is_met_by(stats))
}
