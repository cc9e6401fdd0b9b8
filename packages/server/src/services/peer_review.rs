use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use common::{ChallengeStatus, VoteValue};
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};

use crate::entity::match_setting::TestCase;
use crate::entity::{
    challenge, challenge_match_setting, challenge_participant, match_setting, participant_match,
    peer_review_assignment, peer_review_vote, submission,
};
use crate::models::peer_review::{BugEvidence, ValidVote};
use crate::runner::CodeRunner;

/// Whether a caller may vote on an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAccess {
    Granted(AssignedReview),
    AssignmentNotFound,
    /// The caller is not the assigned reviewer.
    NotReviewer,
}

/// An assignment together with the participant assigned to review it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedReview {
    pub assignment: peer_review_assignment::Model,
    pub reviewer: challenge_participant::Model,
}

/// Outcome of casting a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteResult {
    Recorded(peer_review_vote::Model),
    /// A vote for this assignment already exists; it is returned unchanged.
    AlreadyVoted(peer_review_vote::Model),
    InvalidPhase(ChallengeStatus),
}

/// An assignment as shown to its reviewer.
#[derive(Debug, Clone)]
pub struct AssignmentView {
    pub assignment: peer_review_assignment::Model,
    pub code: String,
    pub vote: Option<VoteValue>,
}

/// Reviewer/submission pairs for one problem group.
///
/// `group` holds `(participant_id, submission_id)`. After shuffling, the
/// participant at position `i` reviews positions `i+1 ..= i+k (mod n)` with
/// `k = min(allowed, n - 1)`, so nobody reviews themselves and every
/// submission receives exactly `k` reviews.
pub fn plan_reviews<R: Rng + ?Sized>(
    mut group: Vec<(i32, i32)>,
    allowed: usize,
    rng: &mut R,
) -> Vec<(i32, i32)> {
    let n = group.len();
    if n < 2 {
        return Vec::new();
    }
    group.shuffle(rng);

    let k = allowed.min(n - 1);
    let mut pairs = Vec::with_capacity(n * k);
    for (i, &(reviewer, _)) in group.iter().enumerate() {
        for offset in 1..=k {
            let (_, submission_id) = group[(i + offset) % n];
            pairs.push((reviewer, submission_id));
        }
    }
    pairs
}

pub struct PeerReviewService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PeerReviewService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// The submission each participant is judged on: the latest final one,
    /// falling back to the latest of any kind.
    pub async fn final_submissions(
        &self,
        participant_ids: &[i32],
    ) -> Result<HashMap<i32, submission::Model>, DbErr> {
        if participant_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = submission::Entity::find()
            .filter(submission::Column::ChallengeParticipantId.is_in(participant_ids.iter().copied()))
            .order_by_desc(submission::Column::IsFinal)
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
            .all(self.conn)
            .await?;

        let mut latest = HashMap::new();
        for row in rows {
            latest.entry(row.challenge_participant_id).or_insert(row);
        }
        Ok(latest)
    }

    /// Create review assignments for every problem of the challenge.
    /// Re-running never duplicates a pair. Returns the number of new rows.
    pub async fn generate_assignments(&self, challenge: &challenge::Model) -> Result<u64, DbErr> {
        let participant_ids: Vec<i32> = challenge_participant::Entity::find()
            .filter(challenge_participant::Column::ChallengeId.eq(challenge.id))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if participant_ids.len() < 2 {
            return Ok(0);
        }

        let setting_by_participant: HashMap<i32, i32> = participant_match::Entity::find()
            .filter(
                participant_match::Column::ChallengeParticipantId
                    .is_in(participant_ids.iter().copied()),
            )
            .all(self.conn)
            .await?
            .into_iter()
            .map(|m| (m.challenge_participant_id, m.challenge_match_setting_id))
            .collect();

        let finals = self.final_submissions(&participant_ids).await?;

        // BTreeMap keeps group order stable across runs.
        let mut groups: BTreeMap<i32, Vec<(i32, i32)>> = BTreeMap::new();
        for (participant_id, sub) in &finals {
            if let Some(setting) = setting_by_participant.get(participant_id) {
                groups
                    .entry(*setting)
                    .or_default()
                    .push((*participant_id, sub.id));
            }
        }

        let allowed = challenge.allowed_number_of_review.max(0) as usize;
        let pairs: Vec<(i32, i32)> = {
            let mut rng = rand::rng();
            groups
                .into_values()
                .flat_map(|mut group| {
                    group.sort_unstable();
                    plan_reviews(group, allowed, &mut rng)
                })
                .collect()
        };
        if pairs.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = pairs
            .into_iter()
            .map(|(reviewer_id, submission_id)| peer_review_assignment::ActiveModel {
                submission_id: Set(submission_id),
                reviewer_id: Set(reviewer_id),
                is_extra: Set(false),
                feedback_tests: Set(None),
                created_at: Set(now),
                ..Default::default()
            });

        let result = peer_review_assignment::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    peer_review_assignment::Column::SubmissionId,
                    peer_review_assignment::Column::ReviewerId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(inserted) => Ok(inserted),
            Err(DbErr::RecordNotInserted) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Assignments of `student_id` in a challenge, with the code to review.
    pub async fn list_for_reviewer(
        &self,
        challenge_id: i32,
        student_id: i32,
    ) -> Result<Option<Vec<AssignmentView>>, DbErr> {
        let Some(participant) = challenge_participant::Entity::find()
            .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
            .filter(challenge_participant::Column::StudentId.eq(student_id))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        let assignments = peer_review_assignment::Entity::find()
            .filter(peer_review_assignment::Column::ReviewerId.eq(participant.id))
            .order_by_asc(peer_review_assignment::Column::Id)
            .all(self.conn)
            .await?;
        if assignments.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let code_by_submission: HashMap<i32, String> = submission::Entity::find()
            .filter(
                submission::Column::Id.is_in(assignments.iter().map(|a| a.submission_id)),
            )
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.id, s.code))
            .collect();

        let vote_by_assignment: HashMap<i32, VoteValue> = peer_review_vote::Entity::find()
            .filter(
                peer_review_vote::Column::PeerReviewAssignmentId
                    .is_in(assignments.iter().map(|a| a.id)),
            )
            .all(self.conn)
            .await?
            .into_iter()
            .map(|v| (v.peer_review_assignment_id, v.vote))
            .collect();

        Ok(Some(
            assignments
                .into_iter()
                .map(|assignment| AssignmentView {
                    code: code_by_submission
                        .get(&assignment.submission_id)
                        .cloned()
                        .unwrap_or_default(),
                    vote: vote_by_assignment.get(&assignment.id).copied(),
                    assignment,
                })
                .collect(),
        ))
    }

    /// Resolve the assignment and check that `user_id` is its reviewer.
    pub async fn assigned_review(
        &self,
        user_id: i32,
        assignment_id: i32,
    ) -> Result<ReviewAccess, DbErr> {
        let Some(assignment) = peer_review_assignment::Entity::find_by_id(assignment_id)
            .one(self.conn)
            .await?
        else {
            return Ok(ReviewAccess::AssignmentNotFound);
        };

        let reviewer = challenge_participant::Entity::find_by_id(assignment.reviewer_id)
            .one(self.conn)
            .await?;
        Ok(match reviewer.filter(|r| r.student_id == user_id) {
            Some(reviewer) => ReviewAccess::Granted(AssignedReview {
                assignment,
                reviewer,
            }),
            None => ReviewAccess::NotReviewer,
        })
    }

    /// Store a validated vote for an assignment the caller was granted.
    pub async fn submit_vote(
        &self,
        runner: &dyn CodeRunner,
        review: AssignedReview,
        vote: ValidVote,
    ) -> Result<VoteResult, DbErr> {
        let AssignedReview {
            assignment,
            reviewer,
        } = review;
        let assignment_id = assignment.id;

        let status = challenge::Entity::find_by_id(reviewer.challenge_id)
            .one(self.conn)
            .await?
            .map(|c| c.status)
            .ok_or_else(|| DbErr::RecordNotFound(format!("challenge {}", reviewer.challenge_id)))?;
        if status != ChallengeStatus::StartedPhaseTwo {
            return Ok(VoteResult::InvalidPhase(status));
        }

        if let Some(existing) = self.find_vote(assignment_id).await? {
            return Ok(VoteResult::AlreadyVoted(existing));
        }

        let (actual_output, is_bug_proven) = match &vote.evidence {
            Some(evidence) => self.check_bug_claim(runner, &assignment, evidence).await?,
            None => (None, None),
        };
        let (test_case_input, expected_output) = match vote.evidence {
            Some(e) => (Some(e.test_case_input), Some(e.expected_output)),
            None => (None, None),
        };

        let model = peer_review_vote::ActiveModel {
            peer_review_assignment_id: Set(assignment_id),
            vote: Set(vote.vote),
            test_case_input: Set(test_case_input),
            expected_output: Set(expected_output),
            actual_output: Set(actual_output),
            is_bug_proven: Set(is_bug_proven),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        match model.insert(self.conn).await {
            Ok(saved) => Ok(VoteResult::Recorded(saved)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(assignment_id, "Concurrent vote caught on insert");
                let existing = self.find_vote(assignment_id).await?.ok_or_else(|| {
                    DbErr::Custom("UniqueConstraintViolation but existing vote not found".into())
                })?;
                Ok(VoteResult::AlreadyVoted(existing))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_vote(&self, assignment_id: i32) -> Result<Option<peer_review_vote::Model>, DbErr> {
        peer_review_vote::Entity::find()
            .filter(peer_review_vote::Column::PeerReviewAssignmentId.eq(assignment_id))
            .one(self.conn)
            .await
    }

    /// Run the reference solution and then the reviewed code on the
    /// reviewer's test case. The bug is proven when the reference agrees
    /// with the expected output and the reviewed code does not.
    ///
    /// Runner failures leave both fields unset.
    async fn check_bug_claim(
        &self,
        runner: &dyn CodeRunner,
        assignment: &peer_review_assignment::Model,
        evidence: &BugEvidence,
    ) -> Result<(Option<String>, Option<bool>), DbErr> {
        let Some(reviewed) = submission::Entity::find_by_id(assignment.submission_id)
            .one(self.conn)
            .await?
        else {
            return Ok((None, None));
        };
        let reference = self.reference_solution(reviewed.match_id).await?;

        let test = [TestCase {
            input: evidence.test_case_input.clone(),
            output: evidence.expected_output.clone(),
        }];

        if let Some(reference) = reference {
            match runner.run(&reference, &test).await {
                Ok(report) if !report.all_passed => {
                    // The reviewer's expectation is wrong, so nothing is proven.
                    let actual = report.results.into_iter().next().and_then(|r| r.actual_output);
                    return Ok((actual, Some(false)));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(assignment_id = assignment.id, error = %e, "Reference run failed");
                    return Ok((None, None));
                }
            }
        }

        match runner.run(&reviewed.code, &test).await {
            Ok(report) => {
                let outcome = report.results.into_iter().next().unwrap_or_default();
                let proven = match &outcome.actual_output {
                    Some(actual) => actual.trim() != evidence.expected_output.trim(),
                    None => !outcome.passed,
                };
                Ok((outcome.actual_output, Some(proven)))
            }
            Err(e) => {
                tracing::warn!(assignment_id = assignment.id, error = %e, "Bug-proof run failed");
                Ok((None, None))
            }
        }
    }

    async fn reference_solution(&self, match_id: i32) -> Result<Option<String>, DbErr> {
        let Some(m) = participant_match::Entity::find_by_id(match_id)
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };
        let Some(link) = challenge_match_setting::Entity::find_by_id(m.challenge_match_setting_id)
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };
        Ok(match_setting::Entity::find_by_id(link.match_setting_id)
            .one(self.conn)
            .await?
            .map(|s| s.reference_solution))
    }
}
