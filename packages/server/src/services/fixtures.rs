//! Model builders shared by the mock-database tests.

use chrono::Utc;
use common::{BadgeCategory, BadgeMetric, ChallengeStatus, ScoringStatus, SubmissionStatus, UserRole};

use crate::entity::{badge, challenge, challenge_participant, submission, title, user};

pub fn challenge(id: i32, status: ChallengeStatus) -> challenge::Model {
    let now = Utc::now();
    challenge::Model {
        id,
        title: format!("Challenge {id}"),
        duration: 30,
        allowed_number_of_review: 2,
        teacher_id: 1,
        status,
        scoring_status: ScoringStatus::Pending,
        start_datetime: now,
        start_phase_one_at: None,
        end_phase_one_at: None,
        start_phase_two_at: None,
        end_phase_two_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn participant(id: i32, challenge_id: i32, student_id: i32) -> challenge_participant::Model {
    challenge_participant::Model {
        id,
        challenge_id,
        student_id,
        joined_at: Utc::now(),
    }
}

pub fn submission(id: i32, participant_id: i32, status: SubmissionStatus) -> submission::Model {
    submission::Model {
        id,
        match_id: participant_id,
        challenge_participant_id: participant_id,
        code: "print(input())".into(),
        is_automatic_submission: false,
        is_final: true,
        public_test_results: serde_json::json!({"passed": 2, "total": 2, "allPassed": true, "results": []}),
        private_test_results: serde_json::json!({"passed": 1, "total": 2, "allPassed": false, "results": []}),
        status,
        created_at: Utc::now(),
    }
}

pub fn challenge_badge(id: i32, threshold: i32) -> badge::Model {
    badge::Model {
        id,
        key: format!("challenge_{threshold}"),
        name: format!("{threshold} challenges"),
        description: String::new(),
        icon_key: format!("challenge_{threshold}"),
        category: BadgeCategory::ChallengeMilestone,
        metric: BadgeMetric::ChallengesCompleted,
        threshold,
    }
}

pub fn title(id: i32, rank: i32, min_challenges: i32) -> title::Model {
    title::Model {
        id,
        name: format!("Rank {rank}"),
        description: String::new(),
        rank,
        min_challenges,
        min_avg_score: 0.0,
        min_badges: 0,
    }
}

pub fn student(id: i32, current_title_id: Option<i32>) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        username: format!("student{id}"),
        email: format!("student{id}@example.com"),
        password: String::new(),
        role: UserRole::Student,
        settings: serde_json::json!({}),
        current_title_id,
        created_at: now,
        updated_at: now,
    }
}
