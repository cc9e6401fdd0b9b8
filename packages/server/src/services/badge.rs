use std::collections::HashSet;

use chrono::Utc;
use common::{BadgeMetric, SubmissionStatus};
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::{badge, challenge_participant, student_badge, submission, submission_score_breakdown};
use crate::services::scoring::ScoringService;

/// Values the badge thresholds are compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentMetrics {
    pub challenges_completed: u64,
    pub reviews_completed: u64,
    pub correct_reviews: u64,
}

impl StudentMetrics {
    pub fn value(&self, metric: BadgeMetric) -> u64 {
        match metric {
            BadgeMetric::ChallengesCompleted => self.challenges_completed,
            BadgeMetric::ReviewsCompleted => self.reviews_completed,
            BadgeMetric::CorrectReviews => self.correct_reviews,
        }
    }
}

/// Badges whose threshold is reached and that the student does not own yet.
pub fn unlockable<'b>(
    catalog: &'b [badge::Model],
    metrics: &StudentMetrics,
    owned: &HashSet<i32>,
) -> Vec<&'b badge::Model> {
    catalog
        .iter()
        .filter(|b| !owned.contains(&b.id))
        .filter(|b| metrics.value(b.metric) >= b.threshold.max(0) as u64)
        .collect()
}

pub struct BadgeService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> BadgeService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Scored challenges whose judged submission is PROBABLY_CORRECT or IMPROVABLE.
    pub async fn completed_challenges(&self, student_id: i32) -> Result<u64, DbErr> {
        submission_score_breakdown::Entity::find()
            .filter(
                submission_score_breakdown::Column::ChallengeParticipantId.in_subquery(
                    Query::select()
                        .column(challenge_participant::Column::Id)
                        .from(challenge_participant::Entity)
                        .and_where(challenge_participant::Column::StudentId.eq(student_id))
                        .to_owned(),
                ),
            )
            .filter(
                submission_score_breakdown::Column::SubmissionId.in_subquery(
                    Query::select()
                        .column(submission::Column::Id)
                        .from(submission::Entity)
                        .and_where(
                            submission::Column::Status
                                .is_in(SubmissionStatus::COMPLETED.iter().copied()),
                        )
                        .to_owned(),
                ),
            )
            .count(self.conn)
            .await
    }

    pub async fn metrics(&self, student_id: i32) -> Result<StudentMetrics, DbErr> {
        let challenges_completed = self.completed_challenges(student_id).await?;
        let reviews = ScoringService::new(self.conn)
            .student_review_tally(student_id)
            .await?;
        Ok(StudentMetrics {
            challenges_completed,
            reviews_completed: reviews.votes,
            correct_reviews: reviews.agreeing,
        })
    }

    /// Award every newly reached badge. Returns only badges inserted by this call,
    /// so a second run on unchanged data returns nothing.
    pub async fn evaluate_badges(&self, student_id: i32) -> Result<Vec<badge::Model>, DbErr> {
        let metrics = self.metrics(student_id).await?;

        let catalog = badge::Entity::find()
            .order_by_asc(badge::Column::Threshold)
            .order_by_asc(badge::Column::Id)
            .all(self.conn)
            .await?;

        let owned: HashSet<i32> = student_badge::Entity::find()
            .filter(student_badge::Column::StudentId.eq(student_id))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|sb| sb.badge_id)
            .collect();

        let mut unlocked = Vec::new();
        for candidate in unlockable(&catalog, &metrics, &owned) {
            let row = student_badge::ActiveModel {
                student_id: Set(student_id),
                badge_id: Set(candidate.id),
                earned_at: Set(Utc::now()),
                ..Default::default()
            };

            let result = student_badge::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        student_badge::Column::StudentId,
                        student_badge::Column::BadgeId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(self.conn)
                .await;

            match result {
                Ok(n) if n > 0 => unlocked.push(candidate.clone()),
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e),
            }
        }

        if !unlocked.is_empty() {
            tracing::info!(student_id, count = unlocked.len(), "Unlocked badges");
        }
        Ok(unlocked)
    }

    /// Number of badges a student owns.
    pub async fn badge_count(&self, student_id: i32) -> Result<u64, DbErr> {
        student_badge::Entity::find()
            .filter(student_badge::Column::StudentId.eq(student_id))
            .count(self.conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::challenge_badge;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn count_row(n: i64) -> BTreeMap<String, Value> {
        BTreeMap::from([("num_items".to_string(), Value::BigInt(Some(n)))])
    }

    #[test]
    fn unlockable_filters_owned_and_unreached() {
        let catalog = vec![challenge_badge(1, 1), challenge_badge(2, 3), challenge_badge(3, 5)];
        let metrics = StudentMetrics {
            challenges_completed: 3,
            ..Default::default()
        };
        let owned = HashSet::from([1]);

        let ids: Vec<i32> = unlockable(&catalog, &metrics, &owned)
            .into_iter()
            .map(|b| b.id)
            .collect();

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn metrics_select_the_right_value() {
        let metrics = StudentMetrics {
            challenges_completed: 1,
            reviews_completed: 2,
            correct_reviews: 3,
        };
        assert_eq!(metrics.value(BadgeMetric::ReviewsCompleted), 2);
        assert_eq!(metrics.value(BadgeMetric::CorrectReviews), 3);
    }

    #[tokio::test]
    async fn second_evaluation_unlocks_nothing() {
        let first_badge = challenge_badge(1, 1);
        let owned = student_badge::Model {
            id: 1,
            student_id: 7,
            badge_id: 1,
            earned_at: Utc::now(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // First run: 1 completed challenge, no reviews, badge not yet owned.
            .append_query_results([vec![count_row(1)]])
            .append_query_results([Vec::<challenge_participant::Model>::new()])
            .append_query_results([vec![first_badge.clone()]])
            .append_query_results([Vec::<student_badge::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            }])
            // Second run: same data, badge now owned.
            .append_query_results([vec![count_row(1)]])
            .append_query_results([Vec::<challenge_participant::Model>::new()])
            .append_query_results([vec![first_badge.clone()]])
            .append_query_results([vec![owned]])
            .into_connection();

        let service = BadgeService::new(&db);
        let first = service.evaluate_badges(7).await.unwrap();
        let second = service.evaluate_badges(7).await.unwrap();

        assert_eq!(first, vec![first_badge]);
        assert!(second.is_empty());
    }
}
