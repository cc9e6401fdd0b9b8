use chrono::Utc;
use common::{StudentStats, TitleRequirement, next_title_eligibility};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entity::{challenge_participant, submission_score_breakdown, title, user};
use crate::services::badge::BadgeService;

pub struct TitleService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TitleService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Completed challenges, mean total score and badge count of a student.
    pub async fn student_stats(&self, student_id: i32) -> Result<StudentStats, DbErr> {
        let badges = BadgeService::new(self.conn);
        let total_challenges = badges.completed_challenges(student_id).await?;
        let badges_earned = badges.badge_count(student_id).await?;

        let scores: Vec<i32> = submission_score_breakdown::Entity::find()
            .select_only()
            .column(submission_score_breakdown::Column::TotalScore)
            .filter(
                submission_score_breakdown::Column::ChallengeParticipantId.in_subquery(
                    Query::select()
                        .column(challenge_participant::Column::Id)
                        .from(challenge_participant::Entity)
                        .and_where(challenge_participant::Column::StudentId.eq(student_id))
                        .to_owned(),
                ),
            )
            .into_tuple()
            .all(self.conn)
            .await?;

        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
        };

        Ok(StudentStats {
            total_challenges,
            avg_score,
            badges_earned,
        })
    }

    /// The whole ladder, lowest rank first.
    pub async fn ladder(&self) -> Result<Vec<title::Model>, DbErr> {
        title::Entity::find()
            .order_by_asc(title::Column::Rank)
            .all(self.conn)
            .await
    }

    /// Promote the student by one rank when the next tier's thresholds are met.
    /// Returns the new title, or `None` when nothing changed.
    pub async fn evaluate_title(&self, student_id: i32) -> Result<Option<title::Model>, DbErr> {
        let Some(student) = user::Entity::find_by_id(student_id).one(self.conn).await? else {
            return Ok(None);
        };

        let ladder = self.ladder().await?;
        let current_rank = student
            .current_title_id
            .and_then(|id| ladder.iter().find(|t| t.id == id))
            .map(|t| t.rank);

        let stats = self.student_stats(student_id).await?;
        let requirements: Vec<TitleRequirement> = ladder.iter().map(TitleRequirement::from).collect();

        let Some(next) = next_title_eligibility(&stats, current_rank, &requirements) else {
            return Ok(None);
        };
        let Some(promoted) = ladder.iter().find(|t| t.id == next.id).cloned() else {
            return Ok(None);
        };

        // Guard on the title we read so a concurrent evaluation cannot apply twice.
        let current_filter = match student.current_title_id {
            Some(id) => user::Column::CurrentTitleId.eq(id),
            None => user::Column::CurrentTitleId.is_null(),
        };
        let result = user::Entity::update_many()
            .col_expr(user::Column::CurrentTitleId, Expr::value(promoted.id))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(student_id))
            .filter(current_filter)
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        tracing::info!(student_id, title = %promoted.name, rank = promoted.rank, "Title promoted");
        Ok(Some(promoted))
    }
}
