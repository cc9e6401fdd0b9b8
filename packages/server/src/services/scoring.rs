use std::collections::HashMap;

use chrono::Utc;
use common::{SubmissionStatus, TestSummary, VoteValue};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use crate::entity::{
    challenge_participant, peer_review_assignment, peer_review_vote, submission,
    submission_score_breakdown,
};
use crate::services::peer_review::PeerReviewService;

/// Votes cast by one reviewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewTally {
    /// Every vote, abstentions included.
    pub votes: u64,
    /// Votes other than `abstain`.
    pub decisive: u64,
    /// Decisive votes matching the reviewed submission's evaluated status.
    pub agreeing: u64,
}

impl ReviewTally {
    fn record(&mut self, vote: VoteValue, reviewed: Option<SubmissionStatus>) {
        self.votes += 1;
        let Some(status) = reviewed else { return };
        if let Some(agrees) = vote.agrees_with(status) {
            self.decisive += 1;
            if agrees {
                self.agreeing += 1;
            }
        }
    }

    fn merge(&mut self, other: ReviewTally) {
        self.votes += other.votes;
        self.decisive += other.decisive;
        self.agreeing += other.agreeing;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreStats {
    pub tests_passed: u32,
    pub tests_total: u32,
    pub votes_cast: u64,
    pub agreeing_votes: u64,
    pub submission_status: Option<SubmissionStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub participant_id: i32,
    pub student_id: i32,
    pub submission_id: Option<i32>,
    pub implementation_score: i32,
    pub code_review_score: i32,
    pub total_score: i32,
    pub stats: ScoreStats,
}

fn percent(part: u64, whole: u64) -> i32 {
    if whole == 0 {
        0
    } else {
        (100.0 * part as f64 / whole as f64).round() as i32
    }
}

fn tests_tally(value: &serde_json::Value) -> (u32, u32) {
    serde_json::from_value::<TestSummary>(value.clone())
        .ok()
        .and_then(|s| s.tally())
        .unwrap_or((0, 0))
}

/// Score one participant from their judged submission and their own reviews.
pub fn score_participant(
    participant: &challenge_participant::Model,
    judged: Option<&submission::Model>,
    reviews: ReviewTally,
) -> ScoreCard {
    let Some(judged) = judged else {
        return ScoreCard {
            participant_id: participant.id,
            student_id: participant.student_id,
            submission_id: None,
            implementation_score: 0,
            code_review_score: 0,
            total_score: 0,
            stats: ScoreStats {
                tests_passed: 0,
                tests_total: 0,
                votes_cast: 0,
                agreeing_votes: 0,
                submission_status: None,
            },
        };
    };

    let (public_passed, public_total) = tests_tally(&judged.public_test_results);
    let (private_passed, private_total) = tests_tally(&judged.private_test_results);
    let passed = public_passed + private_passed;
    let total = public_total + private_total;

    let implementation_score = percent(u64::from(passed), u64::from(total));
    let code_review_score = percent(reviews.agreeing, reviews.decisive);
    let total_score = (f64::from(implementation_score + code_review_score) / 2.0).round() as i32;

    ScoreCard {
        participant_id: participant.id,
        student_id: participant.student_id,
        submission_id: Some(judged.id),
        implementation_score,
        code_review_score,
        total_score,
        stats: ScoreStats {
            tests_passed: passed,
            tests_total: total,
            votes_cast: reviews.votes,
            agreeing_votes: reviews.agreeing,
            submission_status: Some(judged.status),
        },
    }
}

pub struct ScoringService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ScoringService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Vote tallies keyed by reviewing participant id.
    pub async fn review_tallies(
        &self,
        reviewer_ids: &[i32],
    ) -> Result<HashMap<i32, ReviewTally>, DbErr> {
        if reviewer_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let assignments = peer_review_assignment::Entity::find()
            .filter(peer_review_assignment::Column::ReviewerId.is_in(reviewer_ids.iter().copied()))
            .all(self.conn)
            .await?;
        if assignments.is_empty() {
            return Ok(HashMap::new());
        }

        let votes = peer_review_vote::Entity::find()
            .filter(
                peer_review_vote::Column::PeerReviewAssignmentId
                    .is_in(assignments.iter().map(|a| a.id)),
            )
            .all(self.conn)
            .await?;
        if votes.is_empty() {
            return Ok(HashMap::new());
        }

        let status_by_submission: HashMap<i32, SubmissionStatus> = submission::Entity::find()
            .filter(submission::Column::Id.is_in(assignments.iter().map(|a| a.submission_id)))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.id, s.status))
            .collect();

        let assignment_by_id: HashMap<i32, &peer_review_assignment::Model> =
            assignments.iter().map(|a| (a.id, a)).collect();

        let mut tallies: HashMap<i32, ReviewTally> = HashMap::new();
        for vote in votes {
            let Some(assignment) = assignment_by_id.get(&vote.peer_review_assignment_id) else {
                continue;
            };
            tallies.entry(assignment.reviewer_id).or_default().record(
                vote.vote,
                status_by_submission.get(&assignment.submission_id).copied(),
            );
        }
        Ok(tallies)
    }

    /// Review totals across every challenge a student took part in.
    pub async fn student_review_tally(&self, student_id: i32) -> Result<ReviewTally, DbErr> {
        let participant_ids: Vec<i32> = challenge_participant::Entity::find()
            .filter(challenge_participant::Column::StudentId.eq(student_id))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut total = ReviewTally::default();
        for tally in self.review_tallies(&participant_ids).await?.into_values() {
            total.merge(tally);
        }
        Ok(total)
    }

    /// Compute and upsert the breakdown of every participant of a challenge.
    pub async fn score_challenge(&self, challenge_id: i32) -> Result<Vec<ScoreCard>, DbErr> {
        let participants = challenge_participant::Entity::find()
            .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
            .all(self.conn)
            .await?;
        if participants.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = participants.iter().map(|p| p.id).collect();

        let finals = PeerReviewService::new(self.conn).final_submissions(&ids).await?;
        let tallies = self.review_tallies(&ids).await?;

        let cards: Vec<ScoreCard> = participants
            .iter()
            .map(|p| {
                score_participant(
                    p,
                    finals.get(&p.id),
                    tallies.get(&p.id).copied().unwrap_or_default(),
                )
            })
            .collect();

        let now = Utc::now();
        let rows = cards.iter().map(|card| submission_score_breakdown::ActiveModel {
            challenge_participant_id: Set(card.participant_id),
            submission_id: Set(card.submission_id),
            code_review_score: Set(card.code_review_score),
            implementation_score: Set(card.implementation_score),
            total_score: Set(card.total_score),
            stats: Set(serde_json::to_value(&card.stats).unwrap_or_default()),
            computed_at: Set(now),
            ..Default::default()
        });

        submission_score_breakdown::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::column(submission_score_breakdown::Column::ChallengeParticipantId)
                    .update_columns([
                        submission_score_breakdown::Column::SubmissionId,
                        submission_score_breakdown::Column::CodeReviewScore,
                        submission_score_breakdown::Column::ImplementationScore,
                        submission_score_breakdown::Column::TotalScore,
                        submission_score_breakdown::Column::Stats,
                        submission_score_breakdown::Column::ComputedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        Ok(cards)
    }
}
