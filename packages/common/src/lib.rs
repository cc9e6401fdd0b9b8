pub mod challenge_status;
pub mod error;
pub mod match_setting;
pub mod reward;
pub mod role;
pub mod submission_status;
pub mod vote;

pub use challenge_status::{ChallengeStatus, ScoringStatus};
pub use error::ParseEnumError;
pub use match_setting::MatchSettingStatus;
pub use reward::{
    BadgeCategory, BadgeMetric, StudentStats, TitleRequirement, next_title, next_title_eligibility,
};
pub use role::UserRole;
pub use submission_status::{SubmissionStatus, TestSummary, get_submission_status};
pub use vote::VoteValue;
