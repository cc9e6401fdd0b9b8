pub mod badge;
pub mod challenge;
pub mod challenge_match_setting;
pub mod challenge_participant;
pub mod match_setting;
pub mod participant_match;
pub mod peer_review_assignment;
pub mod peer_review_vote;
pub mod schema_migration;
pub mod student_badge;
pub mod submission;
pub mod submission_score_breakdown;
pub mod title;
pub mod user;
