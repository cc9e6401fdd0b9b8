pub mod auth;
pub mod challenge;
pub mod match_setting;
pub mod peer_review;
pub mod reward;
pub mod shared;
pub mod submission;
