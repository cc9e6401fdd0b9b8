use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{BadgeCategory, BadgeMetric, StudentStats};
use serde::Serialize;

use crate::entity::{badge, title};

#[derive(Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeResponse {
    pub id: i32,
    #[schema(example = "challenge_5")]
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon_key: String,
    pub category: BadgeCategory,
    pub metric: BadgeMetric,
    pub threshold: i32,
}

impl From<badge::Model> for BadgeResponse {
    fn from(m: badge::Model) -> Self {
        Self {
            id: m.id,
            key: m.key,
            name: m.name,
            description: m.description,
            icon_key: m.icon_key,
            category: m.category,
            metric: m.metric,
            threshold: m.threshold,
        }
    }
}

#[derive(Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub id: i32,
    #[schema(example = "Specialist")]
    pub name: String,
    pub description: String,
    pub rank: i32,
    pub min_challenges: i32,
    pub min_avg_score: f64,
    pub min_badges: i32,
}

impl From<title::Model> for TitleResponse {
    fn from(m: title::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            rank: m.rank,
            min_challenges: m.min_challenges,
            min_avg_score: m.min_avg_score,
            min_badges: m.min_badges,
        }
    }
}

/// Badge and title catalogs. Badges are keyed by category.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RulesResponse {
    pub badges: BTreeMap<String, Vec<BadgeResponse>>,
    /// Ordered by rank.
    pub titles: Vec<TitleResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadgeResponse {
    #[serde(flatten)]
    pub badge: BadgeResponse,
    pub earned_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub current_title: Option<TitleResponse>,
    pub stats: StudentStats,
    pub badges: Vec<EarnedBadgeResponse>,
    /// The next rank and what it takes; `None` at the top of the ladder.
    pub next_title: Option<TitleResponse>,
}
