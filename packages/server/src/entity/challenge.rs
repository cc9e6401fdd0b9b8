use common::{ChallengeStatus, ScoringStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub title: String,

    /// Length of the coding phase in minutes.
    pub duration: i32,
    /// How many peers review each submission.
    pub allowed_number_of_review: i32,

    pub teacher_id: i32,
    #[sea_orm(belongs_to, from = "teacher_id", to = "id")]
    pub teacher: HasOne<super::user::Entity>,

    #[sea_orm(indexed)]
    pub status: ChallengeStatus,
    pub scoring_status: ScoringStatus,

    /// Planned start, informational only.
    pub start_datetime: DateTimeUtc,
    pub start_phase_one_at: Option<DateTimeUtc>,
    pub end_phase_one_at: Option<DateTimeUtc>,
    pub start_phase_two_at: Option<DateTimeUtc>,
    pub end_phase_two_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// When the coding phase expires, if it has started.
    pub fn coding_deadline(&self) -> Option<DateTimeUtc> {
        self.start_phase_one_at
            .map(|start| start + chrono::Duration::minutes(i64::from(self.duration)))
    }
}
