use sea_orm::sea_query::{Index, PostgresQueryBuilder, Table};
use sea_orm::{EntityName, EntityTrait, Schema};

use super::Migration;
use crate::entity::{
    badge, challenge, challenge_match_setting, challenge_participant, match_setting,
    participant_match, peer_review_assignment, peer_review_vote, student_badge, submission,
    submission_score_breakdown, title, user,
};

/// All migrations, oldest first.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: "m20250301_000001_create_accounts",
        up: accounts_up,
        down: accounts_down,
    },
    Migration {
        version: "m20250301_000002_create_challenges",
        up: challenges_up,
        down: challenges_down,
    },
    Migration {
        version: "m20250301_000003_create_matches_and_submissions",
        up: submissions_up,
        down: submissions_down,
    },
    Migration {
        version: "m20250308_000004_create_peer_review",
        up: peer_review_up,
        down: peer_review_down,
    },
    Migration {
        version: "m20250315_000005_create_score_breakdown",
        up: scoring_up,
        down: scoring_down,
    },
    Migration {
        version: "m20250322_000006_add_lookup_indexes",
        up: lookup_indexes_up,
        down: lookup_indexes_down,
    },
];

fn create_table<E: EntityTrait>(schema: &Schema, entity: E) -> Vec<String> {
    let mut out = vec![
        schema
            .create_table_from_entity(entity)
            .to_string(PostgresQueryBuilder),
    ];
    out.extend(
        schema
            .create_index_from_entity(entity)
            .iter()
            .map(|stmt| stmt.to_string(PostgresQueryBuilder)),
    );
    out
}

fn drop_table<E: EntityTrait>(entity: E) -> String {
    Table::drop()
        .table(entity.table_ref())
        .if_exists()
        .cascade()
        .to_string(PostgresQueryBuilder)
}

fn drop_index(name: &str) -> String {
    Index::drop()
        .name(name)
        .if_exists()
        .to_string(PostgresQueryBuilder)
}

fn accounts_up(schema: &Schema) -> Vec<String> {
    let mut out = create_table(schema, title::Entity);
    out.extend(create_table(schema, user::Entity));
    out.extend(create_table(schema, badge::Entity));
    out.extend(create_table(schema, student_badge::Entity));
    out.push(
        Index::create()
            .name("uq_student_badge_student_badge")
            .table(student_badge::Entity.table_ref())
            .col(student_badge::Column::StudentId)
            .col(student_badge::Column::BadgeId)
            .unique()
            .to_string(PostgresQueryBuilder),
    );
    out
}

fn accounts_down(_: &Schema) -> Vec<String> {
    vec![
        drop_index("uq_student_badge_student_badge"),
        drop_table(student_badge::Entity),
        drop_table(badge::Entity),
        drop_table(user::Entity),
        drop_table(title::Entity),
    ]
}

fn challenges_up(schema: &Schema) -> Vec<String> {
    let mut out = create_table(schema, match_setting::Entity);
    out.extend(create_table(schema, challenge::Entity));
    out.extend(create_table(schema, challenge_match_setting::Entity));
    out.extend(create_table(schema, challenge_participant::Entity));
    out.push(
        Index::create()
            .name("uq_challenge_match_setting_pair")
            .table(challenge_match_setting::Entity.table_ref())
            .col(challenge_match_setting::Column::ChallengeId)
            .col(challenge_match_setting::Column::MatchSettingId)
            .unique()
            .to_string(PostgresQueryBuilder),
    );
    out.push(
        Index::create()
            .name("uq_challenge_participant_student")
            .table(challenge_participant::Entity.table_ref())
            .col(challenge_participant::Column::ChallengeId)
            .col(challenge_participant::Column::StudentId)
            .unique()
            .to_string(PostgresQueryBuilder),
    );
    out
}

fn challenges_down(_: &Schema) -> Vec<String> {
    vec![
        drop_index("uq_challenge_participant_student"),
        drop_index("uq_challenge_match_setting_pair"),
        drop_table(challenge_participant::Entity),
        drop_table(challenge_match_setting::Entity),
        drop_table(challenge::Entity),
        drop_table(match_setting::Entity),
    ]
}

fn submissions_up(schema: &Schema) -> Vec<String> {
    let mut out = create_table(schema, participant_match::Entity);
    out.extend(create_table(schema, submission::Entity));
    out
}

fn submissions_down(_: &Schema) -> Vec<String> {
    vec![
        drop_table(submission::Entity),
        drop_table(participant_match::Entity),
    ]
}

fn peer_review_up(schema: &Schema) -> Vec<String> {
    let mut out = create_table(schema, peer_review_assignment::Entity);
    out.extend(create_table(schema, peer_review_vote::Entity));
    out.push(
        Index::create()
            .name("uq_peer_review_assignment_reviewer")
            .table(peer_review_assignment::Entity.table_ref())
            .col(peer_review_assignment::Column::SubmissionId)
            .col(peer_review_assignment::Column::ReviewerId)
            .unique()
            .to_string(PostgresQueryBuilder),
    );
    out
}

fn peer_review_down(_: &Schema) -> Vec<String> {
    vec![
        drop_index("uq_peer_review_assignment_reviewer"),
        drop_table(peer_review_vote::Entity),
        drop_table(peer_review_assignment::Entity),
    ]
}

fn scoring_up(schema: &Schema) -> Vec<String> {
    create_table(schema, submission_score_breakdown::Entity)
}

fn scoring_down(_: &Schema) -> Vec<String> {
    vec![drop_table(submission_score_breakdown::Entity)]
}

fn lookup_indexes_up(_: &Schema) -> Vec<String> {
    vec![
        // Final-submission lookups during scoring and review assignment.
        Index::create()
            .if_not_exists()
            .name("idx_submission_participant_final")
            .table(submission::Entity.table_ref())
            .col(submission::Column::ChallengeParticipantId)
            .col(submission::Column::IsFinal)
            .to_string(PostgresQueryBuilder),
        // Phase sweep: status = started_phase_one ordered by start.
        Index::create()
            .if_not_exists()
            .name("idx_challenge_status_phase_one")
            .table(challenge::Entity.table_ref())
            .col(challenge::Column::Status)
            .col(challenge::Column::StartPhaseOneAt)
            .to_string(PostgresQueryBuilder),
    ]
}

fn lookup_indexes_down(_: &Schema) -> Vec<String> {
    vec![
        drop_index("idx_challenge_status_phase_one"),
        drop_index("idx_submission_participant_final"),
    ]
}
