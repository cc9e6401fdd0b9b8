use chrono::Utc;
use common::ChallengeStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};

use crate::entity::{challenge, challenge_participant, user};

/// Outcome of enrolling a student in a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    Joined(challenge_participant::Model),
    /// The student was already enrolled. No row was written.
    AlreadyJoined,
    ChallengeNotFound,
    /// Enrollment is closed in the challenge's current phase.
    NotJoinable(ChallengeStatus),
}

/// Who is performing the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    /// A student joining on their own; only public challenges.
    SelfJoin,
    /// Staff adding a student; public or private challenges.
    AddedByStaff,
}

pub struct ParticipationService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ParticipationService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn join(
        &self,
        challenge_id: i32,
        student_id: i32,
        mode: Enrollment,
    ) -> Result<JoinResult, DbErr> {
        let Some(challenge) = challenge::Entity::find_by_id(challenge_id)
            .one(self.conn)
            .await?
        else {
            return Ok(JoinResult::ChallengeNotFound);
        };

        let open = match mode {
            Enrollment::SelfJoin => challenge.status == ChallengeStatus::Public,
            Enrollment::AddedByStaff => challenge.status.is_enrollable(),
        };
        if !open {
            return Ok(JoinResult::NotJoinable(challenge.status));
        }

        let participant = challenge_participant::ActiveModel {
            challenge_id: Set(challenge_id),
            student_id: Set(student_id),
            joined_at: Set(Utc::now()),
            ..Default::default()
        };

        match participant.insert(self.conn).await {
            Ok(model) => Ok(JoinResult::Joined(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(challenge_id, student_id, "Duplicate join caught on insert");
                Ok(JoinResult::AlreadyJoined)
            }
            Err(e) => Err(e),
        }
    }

    /// Participants with their user accounts, in join order.
    pub async fn list(
        &self,
        challenge_id: i32,
    ) -> Result<Vec<(challenge_participant::Model, Option<user::Model>)>, DbErr> {
        challenge_participant::Entity::find()
            .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
            .find_also_related(user::Entity)
            .order_by_asc(challenge_participant::Column::JoinedAt)
            .order_by_asc(challenge_participant::Column::Id)
            .all(self.conn)
            .await
    }

    pub async fn find(
        &self,
        challenge_id: i32,
        student_id: i32,
    ) -> Result<Option<challenge_participant::Model>, DbErr> {
        challenge_participant::Entity::find()
            .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
            .filter(challenge_participant::Column::StudentId.eq(student_id))
            .one(self.conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{challenge, participant};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn missing_challenge_is_reported() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<challenge::Model>::new()])
            .into_connection();

        let result = ParticipationService::new(&db)
            .join(9, 2, Enrollment::SelfJoin)
            .await
            .unwrap();

        assert_eq!(result, JoinResult::ChallengeNotFound);
    }

    #[tokio::test]
    async fn students_cannot_join_private_challenges() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![challenge(1, ChallengeStatus::Private)]])
            .into_connection();

        let result = ParticipationService::new(&db)
            .join(1, 2, Enrollment::SelfJoin)
            .await
            .unwrap();

        assert_eq!(result, JoinResult::NotJoinable(ChallengeStatus::Private));
        // Only the lookup ran; nothing was inserted.
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn staff_can_add_to_private_challenge() {
        let joined = participant(5, 1, 2);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![challenge(1, ChallengeStatus::Private)]])
            .append_query_results([vec![joined.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 5,
                rows_affected: 1,
            }])
            .into_connection();

        let result = ParticipationService::new(&db)
            .join(1, 2, Enrollment::AddedByStaff)
            .await
            .unwrap();

        assert_eq!(result, JoinResult::Joined(joined));
    }

    #[tokio::test]
    async fn nobody_joins_after_assignment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![challenge(1, ChallengeStatus::Assigned)]])
            .into_connection();

        let result = ParticipationService::new(&db)
            .join(1, 2, Enrollment::AddedByStaff)
            .await
            .unwrap();

        assert_eq!(result, JoinResult::NotJoinable(ChallengeStatus::Assigned));
    }
}
